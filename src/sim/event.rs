/// Events emitted during a simulation step.
/// The presentation layer consumes these for the status line and log.

use crate::domain::entity::{EntityHandle, GhostId, PropKind};
use crate::domain::geom::Vec2;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    RunReset { run: u32, recorded: usize },
    GhostSpawned { id: GhostId },
    GhostEvicted { id: GhostId },
    GhostFrozen { id: GhostId },
    GhostTransformed { id: GhostId, into: PropKind, handle: EntityHandle, degraded: bool },
    ProjectileFired { at: Vec2 },
    PlayerHit { health: i32 },
    PlayerDied,
    LevelComplete,
}
