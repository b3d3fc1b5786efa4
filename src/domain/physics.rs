/// Body physics: the single source of truth for how anything moves.
///
/// ## Model
///
/// Every simulated thing is an axis-aligned box with a velocity. A tick:
///   1. Gravity accelerates `velocity.y` (capped at `max_fall_speed`)
///   2. The box moves along X, clamped against solids
///   3. The box moves along Y, clamped against solids
///   4. Landing zeroes `velocity.y` and applies the material's friction
///
/// Solids come from a `Geometry`: the tile map plus whatever extra boxes
/// the caller decides this body can stand on (reflectors, frozen ghosts).
///
/// ## Ground query
///
/// `Geometry::is_grounded` answers "is there ground-classified geometry
/// directly below this box within distance d?". The live actor and every
/// ghost use it identically; the probe is inset horizontally so that
/// a wall beside the body is never mistaken for floor.

use super::geom::{Aabb, Vec2};
use super::tile::TileMap;

/// Contact tolerance. Boxes closer than this count as touching.
const EPS: f32 = 1e-4;

/// Horizontal inset of the ground probe.
const PROBE_INSET: f32 = 0.05;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BodyMode {
    /// Gravity and collisions apply.
    Dynamic,
    /// Pinned in place; never integrated.
    Fixed,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Material {
    /// Input-driven actors: horizontal speed comes from the integrator.
    Actor,
    /// Settles without sliding (physics-frozen ghosts).
    HighFriction,
    /// Spawned dynamic props.
    Prop,
}

impl Material {
    /// Fraction of horizontal velocity removed per grounded tick.
    pub fn ground_friction(self) -> f32 {
        match self {
            Material::Actor => 0.0,
            Material::HighFriction => 1.0,
            Material::Prop => 0.25,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Body {
    /// Centre of the box.
    pub position: Vec2,
    pub velocity: Vec2,
    pub half: Vec2,
    pub mode: BodyMode,
    pub material: Material,
}

impl Body {
    pub fn dynamic(position: Vec2, half: Vec2, material: Material) -> Self {
        Body { position, velocity: Vec2::ZERO, half, mode: BodyMode::Dynamic, material }
    }

    pub fn fixed(position: Vec2, half: Vec2) -> Self {
        Body { position, velocity: Vec2::ZERO, half, mode: BodyMode::Fixed, material: Material::Prop }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.position, self.half)
    }

    /// Unit-mass impulse: an instantaneous velocity change.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse;
    }

    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PhysicsParams {
    pub gravity: f32,
    pub max_fall_speed: f32,
    /// Seconds per tick.
    pub dt: f32,
}

// ══════════════════════════════════════════════════════════════
// Geometry queries
// ══════════════════════════════════════════════════════════════

pub trait Geometry {
    /// Append every solid box that may intersect `region`.
    fn collect_solids(&self, region: Aabb, out: &mut Vec<Aabb>);

    /// Is `bounds` resting on solid geometry within `distance` below it?
    fn is_grounded(&self, bounds: Aabb, distance: f32) -> bool {
        let probe = Aabb::new(
            Vec2::new(bounds.min.x + PROBE_INSET, bounds.max.y - EPS),
            Vec2::new(bounds.max.x - PROBE_INSET, bounds.max.y + distance),
        );
        let mut solids = Vec::new();
        self.collect_solids(probe, &mut solids);
        solids.iter().any(|s| {
            s.min.x < probe.max.x && probe.min.x < s.max.x
                && s.min.y >= bounds.max.y - 0.01
                && s.min.y <= bounds.max.y + distance
        })
    }
}

impl Geometry for TileMap {
    fn collect_solids(&self, region: Aabb, out: &mut Vec<Aabb>) {
        TileMap::collect_solids(self, region, out);
    }
}

/// Tile map plus extra solid boxes visible to one body.
pub struct Scene<'a> {
    pub map: &'a TileMap,
    pub extra: &'a [Aabb],
}

impl Geometry for Scene<'_> {
    fn collect_solids(&self, region: Aabb, out: &mut Vec<Aabb>) {
        self.map.collect_solids(region, out);
        out.extend(self.extra.iter().filter(|b| b.overlaps(&region)).copied());
    }
}

// ══════════════════════════════════════════════════════════════
// Integration
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

/// Largest displacement along `axis` (towards `delta`) that keeps
/// `bounds` out of every solid.
fn sweep_axis(bounds: Aabb, delta: f32, axis: Axis, geo: &impl Geometry, scratch: &mut Vec<Aabb>) -> f32 {
    if delta == 0.0 {
        return 0.0;
    }
    let d = match axis {
        Axis::X => Vec2::new(delta, 0.0),
        Axis::Y => Vec2::new(0.0, delta),
    };
    scratch.clear();
    geo.collect_solids(bounds.swept(d), scratch);

    let mut allowed = delta;
    for s in scratch.iter() {
        // Only solids overlapping on the other axis can block.
        let (lo, hi, s_lo, s_hi, o_lo, o_hi, so_lo, so_hi) = match axis {
            Axis::X => (bounds.min.x, bounds.max.x, s.min.x, s.max.x,
                        bounds.min.y, bounds.max.y, s.min.y, s.max.y),
            Axis::Y => (bounds.min.y, bounds.max.y, s.min.y, s.max.y,
                        bounds.min.x, bounds.max.x, s.min.x, s.max.x),
        };
        if !(o_lo < so_hi - EPS && so_lo < o_hi - EPS) {
            continue;
        }
        if delta > 0.0 && s_lo >= hi - EPS {
            allowed = allowed.min(s_lo - hi);
        } else if delta < 0.0 && s_hi <= lo + EPS {
            allowed = allowed.max(s_hi - lo);
        }
    }
    allowed
}

/// Advance one body by one tick.
pub fn step_body(body: &mut Body, geo: &impl Geometry, params: &PhysicsParams) {
    if body.mode == BodyMode::Fixed {
        return;
    }

    body.velocity.y = (body.velocity.y + params.gravity * params.dt).min(params.max_fall_speed);

    let mut scratch = Vec::new();

    let dx = body.velocity.x * params.dt;
    let mx = sweep_axis(body.bounds(), dx, Axis::X, geo, &mut scratch);
    body.position.x += mx;
    if (mx - dx).abs() > 1e-6 {
        body.velocity.x = 0.0;
    }

    let dy = body.velocity.y * params.dt;
    let my = sweep_axis(body.bounds(), dy, Axis::Y, geo, &mut scratch);
    body.position.y += my;
    if (my - dy).abs() > 1e-6 {
        // Friction only bites on landing.
        if dy > 0.0 {
            body.velocity.x *= 1.0 - body.material.ground_friction();
        }
        body.velocity.y = 0.0;
    }
}
