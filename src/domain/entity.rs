/// Entities: Player, Projectile, Emitter, Prop (spawned substitutes).
/// Ghosts live in `sim::ghost` because they own replay state.

use std::fmt;

use super::geom::{Aabb, Vec2};
use super::motion::MotionState;
use super::physics::{Body, Material};
use super::tile::FireDir;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// Facing implied by a horizontal input; `None` when the axis is zero.
    pub fn from_axis(h: f32) -> Option<Facing> {
        if h > 0.0 {
            Some(Facing::Right)
        } else if h < 0.0 {
            Some(Facing::Left)
        } else {
            None
        }
    }
}

/// Identifies one ghost for its whole lifetime (never reused).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct GhostId(pub u64);

impl fmt::Display for GhostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ghost#{}", self.0)
    }
}

/// Handle returned by the spawner for a substitute entity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct EntityHandle(pub u64);

// ══════════════════════════════════════════════════════════════
// Collidable classification
// ══════════════════════════════════════════════════════════════

/// What a collider is. Hazard checks compare against this tag.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntityKind {
    Ground,
    Player,
    Ghost(GhostId),
    Projectile,
    Spike,
    Reflector,
    FallingBody,
}

/// Event sources that can end a ghost's replay.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HazardKind {
    Projectile,
    Spike,
}

impl EntityKind {
    pub fn hazard(self) -> Option<HazardKind> {
        match self {
            EntityKind::Projectile => Some(HazardKind::Projectile),
            EntityKind::Spike => Some(HazardKind::Spike),
            _ => None,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Substitute entities
// ══════════════════════════════════════════════════════════════

/// The four directional reflectors a ghost can turn into.
/// `Right*` faces a projectile arriving from the right.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ReflectorVariant {
    RightGrounded,
    RightAirborne,
    LeftGrounded,
    LeftAirborne,
}

impl ReflectorVariant {
    pub const ALL: [ReflectorVariant; 4] = [
        ReflectorVariant::RightGrounded,
        ReflectorVariant::RightAirborne,
        ReflectorVariant::LeftGrounded,
        ReflectorVariant::LeftAirborne,
    ];

    pub fn new(side: Facing, grounded: bool) -> Self {
        match (side, grounded) {
            (Facing::Right, true) => ReflectorVariant::RightGrounded,
            (Facing::Right, false) => ReflectorVariant::RightAirborne,
            (Facing::Left, true) => ReflectorVariant::LeftGrounded,
            (Facing::Left, false) => ReflectorVariant::LeftAirborne,
        }
    }

    pub fn side(self) -> Facing {
        match self {
            ReflectorVariant::RightGrounded | ReflectorVariant::RightAirborne => Facing::Right,
            ReflectorVariant::LeftGrounded | ReflectorVariant::LeftAirborne => Facing::Left,
        }
    }

    pub fn grounded(self) -> bool {
        matches!(self, ReflectorVariant::RightGrounded | ReflectorVariant::LeftGrounded)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PropKind {
    Reflector(ReflectorVariant),
    FallingBody,
}

impl PropKind {
    pub fn entity_kind(self) -> EntityKind {
        match self {
            PropKind::Reflector(_) => EntityKind::Reflector,
            PropKind::FallingBody => EntityKind::FallingBody,
        }
    }
}

/// A spawned world entity (reflector or falling body).
#[derive(Clone, Debug)]
pub struct Prop {
    pub handle: EntityHandle,
    pub kind: PropKind,
    pub body: Body,
}

// ══════════════════════════════════════════════════════════════
// Live actor
// ══════════════════════════════════════════════════════════════

pub const ACTOR_HALF: Vec2 = Vec2::new(0.4, 0.45);

#[derive(Clone, Debug)]
pub struct Player {
    pub body: Body,
    pub motion: MotionState,
    pub health: i32,
    pub hit_cooldown: u32,
}

impl Player {
    pub fn new(spawn: Vec2, health: i32) -> Self {
        Player {
            body: Body::dynamic(spawn, ACTOR_HALF, Material::Actor),
            motion: MotionState::default(),
            health,
            hit_cooldown: 0,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }
}

// ══════════════════════════════════════════════════════════════
// Projectiles and emitters
// ══════════════════════════════════════════════════════════════

pub const PROJECTILE_HALF: Vec2 = Vec2::new(0.15, 0.15);

#[derive(Clone, Debug)]
pub struct Projectile {
    pub position: Vec2,
    /// Unit travel direction.
    pub direction: Vec2,
    pub speed: f32,
}

impl Projectile {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.position, PROJECTILE_HALF)
    }
}

/// Fires a projectile every `interval` ticks. Timer counts up.
#[derive(Clone, Debug)]
pub struct Emitter {
    pub x: i32,
    pub y: i32,
    pub dir: FireDir,
    pub timer: u32,
}

impl Emitter {
    pub fn new(x: i32, y: i32, dir: FireDir) -> Self {
        Emitter { x, y, dir, timer: 0 }
    }

    /// Advance one tick. Returns true when the emitter fires.
    pub fn tick(&mut self, interval: u32) -> bool {
        self.timer += 1;
        if self.timer >= interval.max(1) {
            self.timer = 0;
            true
        } else {
            false
        }
    }

    /// Where a fresh projectile appears: just outside the emitter cell.
    pub fn muzzle(&self) -> Vec2 {
        Vec2::cell_center(self.x, self.y) + self.dir.vector() * (0.5 + PROJECTILE_HALF.x + 0.01)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_from_axis_ignores_zero() {
        assert_eq!(Facing::from_axis(0.3), Some(Facing::Right));
        assert_eq!(Facing::from_axis(-1.0), Some(Facing::Left));
        assert_eq!(Facing::from_axis(0.0), None);
    }

    #[test]
    fn reflector_variant_roundtrips_components() {
        for v in ReflectorVariant::ALL {
            assert_eq!(ReflectorVariant::new(v.side(), v.grounded()), v);
        }
    }

    #[test]
    fn only_projectiles_and_spikes_are_hazards() {
        assert_eq!(EntityKind::Projectile.hazard(), Some(HazardKind::Projectile));
        assert_eq!(EntityKind::Spike.hazard(), Some(HazardKind::Spike));
        assert_eq!(EntityKind::Reflector.hazard(), None);
        assert_eq!(EntityKind::Ghost(GhostId(3)).hazard(), None);
    }

    #[test]
    fn emitter_fires_on_interval() {
        let mut e = Emitter::new(0, 0, FireDir::Right);
        let fired: Vec<bool> = (0..6).map(|_| e.tick(3)).collect();
        assert_eq!(fired, vec![false, false, true, false, false, true]);
    }

    #[test]
    fn muzzle_is_outside_emitter_cell() {
        let e = Emitter::new(2, 1, FireDir::Left);
        let m = e.muzzle();
        assert!(m.x < 2.0 - PROJECTILE_HALF.x);
        assert_eq!(m.y, 1.5);
    }
}
