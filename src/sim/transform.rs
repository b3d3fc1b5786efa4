/// Placement rules for the entities a ghost turns into.
///
/// ## Reflector
///
/// ┌──────────────────────┬──────────────────────────────┬─────────────────────────┐
/// │ Projectile axis       │ Spawn position (pre-snap)     │ Variant                 │
/// ├──────────────────────┼──────────────────────────────┼─────────────────────────┤
/// │ Horizontal            │ (ghost centre x, proj y)      │ approach side × ground  │
/// │ Vertical, from above  │ (proj x, ghost top edge)      │ ghost facing × ground   │
/// │ Vertical, from below  │ (proj x, ghost bottom edge)   │ ghost facing × ground   │
/// └──────────────────────┴──────────────────────────────┴─────────────────────────┘
///
/// A projectile travelling towards -x approaches from the Right.
/// The axis is horizontal when `|dx| >= |dy|`.
///
/// ## Falling body
///
/// Spawned at the ghost's own position. Both positions are grid-snapped.

use crate::domain::entity::{Facing, ReflectorVariant};
use crate::domain::geom::{snap_to_grid, Aabb, Vec2};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Approach {
    /// Horizontal travel; `from` is the side the projectile comes from.
    Horizontal { from: Facing },
    /// Vertical travel.
    Vertical { from_above: bool },
}

/// Classify a projectile's travel direction. A zero vector counts as
/// horizontal, arriving on the side the ghost faces.
pub fn approach(direction: Vec2, facing: Facing) -> Approach {
    if direction.x.abs() >= direction.y.abs() {
        let from = if direction.x < 0.0 {
            Facing::Right
        } else if direction.x > 0.0 {
            Facing::Left
        } else {
            facing
        };
        Approach::Horizontal { from }
    } else {
        // y grows downward: positive dy means falling from above.
        Approach::Vertical { from_above: direction.y > 0.0 }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ReflectorPlacement {
    pub position: Vec2,
    pub variant: ReflectorVariant,
}

pub fn place_reflector(
    ghost: Aabb,
    facing: Facing,
    grounded: bool,
    projectile_position: Vec2,
    projectile_direction: Vec2,
) -> ReflectorPlacement {
    let (raw, side) = match approach(projectile_direction, facing) {
        Approach::Horizontal { from } => {
            (Vec2::new(ghost.center().x, projectile_position.y), from)
        }
        Approach::Vertical { from_above } => {
            let edge = if from_above { ghost.min.y } else { ghost.max.y };
            (Vec2::new(projectile_position.x, edge), facing)
        }
    };
    ReflectorPlacement {
        position: snap_to_grid(raw),
        variant: ReflectorVariant::new(side, grounded),
    }
}

pub fn place_falling_body(ghost_position: Vec2) -> Vec2 {
    snap_to_grid(ghost_position)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ghost_at(x: f32, y: f32) -> Aabb {
        Aabb::from_center(Vec2::new(x, y), Vec2::new(0.4, 0.45))
    }

    #[test]
    fn leftward_projectile_approaches_from_right() {
        assert_eq!(approach(Vec2::new(-1.0, 0.0), Facing::Left), Approach::Horizontal { from: Facing::Right });
        assert_eq!(approach(Vec2::new(1.0, 0.2), Facing::Right), Approach::Horizontal { from: Facing::Left });
        assert_eq!(approach(Vec2::new(0.0, 1.0), Facing::Right), Approach::Vertical { from_above: true });
        assert_eq!(approach(Vec2::new(0.1, -1.0), Facing::Right), Approach::Vertical { from_above: false });
    }

    #[test]
    fn horizontal_hit_uses_ghost_center_and_projectile_height() {
        let p = place_reflector(ghost_at(4.3, 2.2), Facing::Right, false, Vec2::new(5.0, 1.9), Vec2::new(-1.0, 0.0));
        assert_eq!(p.position, Vec2::new(4.5, 1.5));
        assert_eq!(p.variant, ReflectorVariant::RightAirborne);
    }

    #[test]
    fn horizontal_variant_follows_approach_side_not_facing() {
        let p = place_reflector(ghost_at(4.3, 2.5), Facing::Right, true, Vec2::new(3.6, 2.5), Vec2::new(1.0, 0.0));
        assert_eq!(p.variant, ReflectorVariant::LeftGrounded);
    }

    #[test]
    fn vertical_from_above_uses_top_edge_and_facing() {
        // Top edge at 2.5 - 0.45 = 2.05 → cell row 2.
        let p = place_reflector(ghost_at(4.5, 2.5), Facing::Left, true, Vec2::new(4.7, 1.0), Vec2::new(0.0, 1.0));
        assert_eq!(p.position, Vec2::new(4.5, 2.5));
        assert_eq!(p.variant, ReflectorVariant::LeftGrounded);
    }

    #[test]
    fn vertical_from_below_uses_bottom_edge() {
        // Bottom edge at 2.4 + 0.45 = 2.85 → cell row 2.
        let p = place_reflector(ghost_at(1.5, 2.4), Facing::Right, false, Vec2::new(1.2, 4.0), Vec2::new(0.0, -1.0));
        assert_eq!(p.position, Vec2::new(1.5, 2.5));
        assert_eq!(p.variant, ReflectorVariant::RightAirborne);
    }

    #[test]
    fn falling_body_snaps_ghost_position() {
        assert_eq!(place_falling_body(Vec2::new(7.9, 3.1)), Vec2::new(7.5, 3.5));
    }
}
