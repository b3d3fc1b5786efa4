/// Debug hooks for poking at the echo from the outside.
///
/// Forced transformations go through the same dispatch as real hazard
/// contacts, so the gates and the spawner fallback behave identically.

use tracing::debug;

use crate::domain::entity::{EntityKind, Facing, GhostId, HazardKind};
use crate::domain::geom::Vec2;
use super::event::GameEvent;
use super::ghost::Hazard;
use super::population::PopulationStats;
use super::spawn::Spawned;
use super::step;
use super::world::WorldState;

/// Hit ghost `id` with a synthetic hazard. A projectile arrives head-on,
/// travelling against the ghost's facing through its centre.
pub fn force_transform(
    world: &mut WorldState,
    id: GhostId,
    kind: HazardKind,
    events: &mut Vec<GameEvent>,
) -> Option<Spawned> {
    let ghost = world.ghosts.get(id)?;
    let direction = match ghost.facing() {
        Facing::Right => Vec2::new(-1.0, 0.0),
        Facing::Left => Vec2::new(1.0, 0.0),
    };
    let source = match kind {
        HazardKind::Projectile => EntityKind::Projectile,
        HazardKind::Spike => EntityKind::Spike,
    };
    let hazard = Hazard::from_contact(source, direction, ghost.bounds().center())?;
    debug!(ghost = %id, hazard = ?kind, "forced transformation");
    step::transform_ghost(world, id, hazard, events)
}

/// Re-arm both hazard gates on every ghost. Returns how many ghosts were
/// touched.
pub fn reset_hit_gates(world: &mut WorldState) -> usize {
    let mut n = 0;
    for g in world.ghosts.iter_mut() {
        g.reset_hit_gates();
        n += 1;
    }
    n
}

pub fn population_stats(world: &WorldState) -> PopulationStats {
    world.ghosts.stats()
}

/// Oldest ghost still replaying, the default target for a forced
/// transformation.
pub fn oldest_replaying(world: &WorldState) -> Option<GhostId> {
    world.ghosts.iter().find(|g| g.is_replaying()).map(|g| g.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::{PropKind, ReflectorVariant};
    use crate::domain::motion::LiveInput;
    use crate::sim::level::{load_level, parse_level_file};

    const RIGHT: LiveInput = LiveInput { horizontal: 1.0, jump_pressed: false };

    fn world_with_ghost() -> WorldState {
        let level = parse_level_file("# Diag\n          \n P        \n##########\n")
            .expect("parses")
            .build()
            .expect("builds");
        let mut world = WorldState::new(GameConfig::default());
        load_level(&mut world, &[level], 0);
        for _ in 0..20 {
            step::step(&mut world, RIGHT);
        }
        step::reset_run(&mut world);
        step::step(&mut world, RIGHT);
        world
    }

    #[test]
    fn forced_projectile_makes_a_grounded_reflector() {
        let mut world = world_with_ghost();
        let id = oldest_replaying(&world).expect("ghost");
        let mut events = vec![];
        let spawned = force_transform(&mut world, id, HazardKind::Projectile, &mut events)
            .expect("transforms");
        assert_eq!(spawned.kind, PropKind::Reflector(ReflectorVariant::RightGrounded));
        assert!(!spawned.degraded);
        assert!(world.ghosts.get(id).is_none());
        assert!(matches!(events[..], [GameEvent::GhostTransformed { .. }]));
    }

    #[test]
    fn forced_spike_makes_a_falling_body() {
        let mut world = world_with_ghost();
        let id = oldest_replaying(&world).expect("ghost");
        let spawned = force_transform(&mut world, id, HazardKind::Spike, &mut vec![])
            .expect("transforms");
        assert_eq!(spawned.kind, PropKind::FallingBody);
        assert_eq!(world.props.props.len(), 1);
    }

    #[test]
    fn gates_block_forced_hazards_until_reset() {
        let mut world = world_with_ghost();
        let id = oldest_replaying(&world).expect("ghost");
        if let Some(g) = world.ghosts.get_mut(id) {
            g.hit_by_spike = true;
        }
        assert!(force_transform(&mut world, id, HazardKind::Spike, &mut vec![]).is_none());
        assert_eq!(reset_hit_gates(&mut world), 1);
        assert!(force_transform(&mut world, id, HazardKind::Spike, &mut vec![]).is_some());
    }

    #[test]
    fn unknown_ghost_is_a_no_op() {
        let mut world = world_with_ghost();
        assert!(force_transform(&mut world, GhostId(99), HazardKind::Spike, &mut vec![]).is_none());
        assert_eq!(population_stats(&world).count, 1);
    }

    #[test]
    fn stats_report_count_and_capacity() {
        let world = world_with_ghost();
        let stats = population_stats(&world);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.capacity, world.config.echo.max_ghosts);
    }
}
