/// Entity spawning for ghost transformations.
///
/// The core only asks "put a thing of this kind here" through
/// `EntitySpawner`. How the thing is built comes from a `PrefabRegistry`.
///
/// ## Fallback chain
///
///   Reflector(variant) → variant prefab → generic reflector prefab
///   FallingBody        → falling-body prefab
///   anything missing   → minimally configured generic falling body
///
/// A missing registration is logged and degraded, never fatal.

use std::collections::HashMap;

use tracing::warn;

use crate::domain::entity::{EntityHandle, Prop, PropKind, ReflectorVariant};
use crate::domain::geom::Vec2;
use crate::domain::physics::{Body, BodyMode, Material};
use crate::error::SpawnError;

/// How to build one kind of entity.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Prefab {
    pub half: Vec2,
    pub mode: BodyMode,
    pub material: Material,
}

impl Prefab {
    pub const REFLECTOR: Prefab = Prefab {
        half: Vec2::new(0.5, 0.5),
        mode: BodyMode::Fixed,
        material: Material::Prop,
    };

    pub const FALLING_BODY: Prefab = Prefab {
        half: Vec2::new(0.45, 0.45),
        mode: BodyMode::Dynamic,
        material: Material::Prop,
    };

    /// Last resort when nothing is registered.
    pub const GENERIC: Prefab = Prefab {
        half: Vec2::new(0.4, 0.4),
        mode: BodyMode::Dynamic,
        material: Material::Prop,
    };

    pub fn build(&self, position: Vec2) -> Body {
        Body {
            position,
            velocity: Vec2::ZERO,
            half: self.half,
            mode: self.mode,
            material: self.material,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PrefabRegistry {
    reflectors: HashMap<ReflectorVariant, Prefab>,
    reflector_fallback: Option<Prefab>,
    falling_body: Option<Prefab>,
}

impl PrefabRegistry {
    /// Every variant plus the falling body registered.
    pub fn standard() -> Self {
        let mut reg = PrefabRegistry::default();
        for v in ReflectorVariant::ALL {
            reg.register_reflector(v, Prefab::REFLECTOR);
        }
        reg.reflector_fallback = Some(Prefab::REFLECTOR);
        reg.falling_body = Some(Prefab::FALLING_BODY);
        reg
    }

    pub fn register_reflector(&mut self, variant: ReflectorVariant, prefab: Prefab) {
        self.reflectors.insert(variant, prefab);
    }

    pub fn set_reflector_fallback(&mut self, prefab: Option<Prefab>) {
        self.reflector_fallback = prefab;
    }

    pub fn set_falling_body(&mut self, prefab: Option<Prefab>) {
        self.falling_body = prefab;
    }

    pub fn resolve(&self, kind: PropKind) -> Result<Prefab, SpawnError> {
        match kind {
            PropKind::Reflector(variant) => self.reflectors.get(&variant)
                .copied()
                .or(self.reflector_fallback)
                .ok_or(SpawnError::MissingPrefab(kind)),
            PropKind::FallingBody => self.falling_body.ok_or(SpawnError::MissingPrefab(kind)),
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Spawner interface
// ══════════════════════════════════════════════════════════════

pub trait EntitySpawner {
    /// Instantiate `kind` at `position` from its registered prefab.
    fn spawn(&mut self, kind: PropKind, position: Vec2) -> Result<EntityHandle, SpawnError>;

    /// Instantiate a minimally configured falling body. Cannot fail.
    fn spawn_generic(&mut self, position: Vec2) -> EntityHandle;
}

/// Result of a transformation's spawn.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Spawned {
    pub handle: EntityHandle,
    pub kind: PropKind,
    /// True when the generic fallback was used.
    pub degraded: bool,
}

/// Spawn `kind`, degrading to a generic falling body on failure.
pub fn spawn_substitute(spawner: &mut impl EntitySpawner, kind: PropKind, position: Vec2) -> Spawned {
    match spawner.spawn(kind, position) {
        Ok(handle) => Spawned { handle, kind, degraded: false },
        Err(e) => {
            warn!(error = %e, x = position.x, y = position.y, "spawning generic falling body instead");
            let handle = spawner.spawn_generic(position);
            Spawned { handle, kind: PropKind::FallingBody, degraded: true }
        }
    }
}

/// Owns every spawned prop. The world's spawner.
#[derive(Clone, Debug)]
pub struct PropStore {
    pub registry: PrefabRegistry,
    pub props: Vec<Prop>,
    next_handle: u64,
}

impl PropStore {
    pub fn new(registry: PrefabRegistry) -> Self {
        PropStore { registry, props: vec![], next_handle: 1 }
    }

    pub fn clear(&mut self) {
        self.props.clear();
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&Prop> {
        self.props.iter().find(|p| p.handle == handle)
    }

    fn insert(&mut self, kind: PropKind, body: Body) -> EntityHandle {
        let handle = EntityHandle(self.next_handle);
        self.next_handle += 1;
        self.props.push(Prop { handle, kind, body });
        handle
    }
}

impl EntitySpawner for PropStore {
    fn spawn(&mut self, kind: PropKind, position: Vec2) -> Result<EntityHandle, SpawnError> {
        let prefab = self.registry.resolve(kind)?;
        Ok(self.insert(kind, prefab.build(position)))
    }

    fn spawn_generic(&mut self, position: Vec2) -> EntityHandle {
        self.insert(PropKind::FallingBody, Prefab::GENERIC.build(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_spawns_requested_kind() {
        let mut store = PropStore::new(PrefabRegistry::standard());
        let kind = PropKind::Reflector(ReflectorVariant::LeftAirborne);
        let s = spawn_substitute(&mut store, kind, Vec2::new(2.5, 3.5));
        assert!(!s.degraded);
        assert_eq!(s.kind, kind);
        let prop = store.get(s.handle).expect("prop exists");
        assert_eq!(prop.body.mode, BodyMode::Fixed);
        assert_eq!(prop.body.position, Vec2::new(2.5, 3.5));
    }

    #[test]
    fn missing_variant_uses_reflector_fallback() {
        let mut reg = PrefabRegistry::default();
        reg.set_reflector_fallback(Some(Prefab::REFLECTOR));
        let kind = PropKind::Reflector(ReflectorVariant::RightGrounded);
        assert_eq!(reg.resolve(kind), Ok(Prefab::REFLECTOR));
    }

    #[test]
    fn empty_registry_degrades_to_generic_falling_body() {
        let mut store = PropStore::new(PrefabRegistry::default());
        let s = spawn_substitute(&mut store, PropKind::Reflector(ReflectorVariant::RightGrounded), Vec2::new(1.5, 1.5));
        assert!(s.degraded);
        assert_eq!(s.kind, PropKind::FallingBody);
        let prop = store.get(s.handle).expect("prop exists");
        assert_eq!(prop.body.mode, BodyMode::Dynamic);
        assert_eq!(prop.body.half, Prefab::GENERIC.half);

        let s2 = spawn_substitute(&mut store, PropKind::FallingBody, Vec2::new(4.5, 1.5));
        assert!(s2.degraded);
        assert_ne!(s.handle, s2.handle);
        assert_eq!(store.props.len(), 2);
    }
}
