/// Ghost: an autonomous replay of one past run.
///
/// ## State machine
///
/// ```text
///                 cursor exhausted (end of the last sample's tick)
///   Replaying ───────────────────────────▶ Frozen
///       │
///       │ first projectile contact (gate: !hit_by_projectile)
///       ├──────────────────────────────────▶ Transformed(Reflector)
///       │
///       │ first spike contact (gate: !hit_by_spike)
///       └──────────────────────────────────▶ Transformed(FallingBody)
/// ```
///
/// Frozen and Transformed are terminal. Hazard events reaching a ghost in
/// a terminal state are expected (a frozen ghost still gets hit) and are
/// ignored. A Transformed ghost is destroyed by the world right after the
/// transition and its substitute entity takes its place.
///
/// `restart()` is the only way back to Replaying; the population calls it
/// on every surviving ghost at each run reset.

use tracing::{debug, trace};

use crate::domain::entity::{EntityKind, Facing, GhostId, HazardKind, PropKind, ACTOR_HALF};
use crate::domain::geom::{Aabb, Vec2};
use crate::domain::motion::{self, InputSource, MotionOutcome, MotionParams, MotionState};
use crate::domain::physics::{Body, BodyMode, Material};
use super::recording::Recording;
use super::replay::ReplayCursor;
use super::transform;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GhostState {
    Replaying,
    Frozen,
    /// Carries what the ghost was asked to turn into.
    Transformed(PropKind),
}

/// A hazard notification delivered to one ghost.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Hazard {
    Projectile { direction: Vec2, position: Vec2 },
    Spike,
}

impl Hazard {
    /// The hazard delivered by touching a collider of kind `source`, if
    /// that kind is a hazard at all.
    pub fn from_contact(source: EntityKind, direction: Vec2, position: Vec2) -> Option<Hazard> {
        match source.hazard()? {
            HazardKind::Projectile => Some(Hazard::Projectile { direction, position }),
            HazardKind::Spike => Some(Hazard::Spike),
        }
    }

    pub fn kind(&self) -> HazardKind {
        match self {
            Hazard::Projectile { .. } => HazardKind::Projectile,
            Hazard::Spike => HazardKind::Spike,
        }
    }
}

/// What to spawn in place of a transformed ghost.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Transformation {
    pub kind: PropKind,
    pub position: Vec2,
}

/// One sample applied during `advance`.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct AppliedSample {
    pub timestamp: f64,
    pub outcome: MotionOutcome,
}

#[derive(Clone, Debug, Default)]
pub struct ReplayStep {
    pub applied: Vec<AppliedSample>,
    /// Nothing left to replay after this step.
    pub exhausted: bool,
}

#[derive(Clone, Debug)]
pub struct Ghost {
    id: GhostId,
    cursor: ReplayCursor,
    params: MotionParams,
    physics_after_freeze: bool,
    state: GhostState,
    pub(crate) motion: MotionState,
    pub(crate) body: Body,
    pub(crate) hit_by_projectile: bool,
    pub(crate) hit_by_spike: bool,
    /// Result of the most recent live ground check.
    grounded: bool,
}

impl Ghost {
    /// `params` and `physics_after_freeze` are captured by value: later
    /// changes to the live configuration never reach this replay.
    pub fn new(
        id: GhostId,
        recording: Recording,
        now: f64,
        params: MotionParams,
        physics_after_freeze: bool,
    ) -> Self {
        let start = recording.start_position().unwrap_or(Vec2::ZERO);
        Ghost {
            id,
            cursor: ReplayCursor::new(recording, now),
            params,
            physics_after_freeze,
            state: GhostState::Replaying,
            motion: MotionState::default(),
            body: Body::dynamic(start, ACTOR_HALF, Material::Actor),
            hit_by_projectile: false,
            hit_by_spike: false,
            grounded: false,
        }
    }

    // ── Accessors ──

    pub fn id(&self) -> GhostId { self.id }
    pub fn state(&self) -> GhostState { self.state }
    pub fn position(&self) -> Vec2 { self.body.position }
    pub fn bounds(&self) -> Aabb { self.body.bounds() }
    pub fn body(&self) -> &Body { &self.body }
    pub fn facing(&self) -> Facing { self.motion.facing }
    pub fn has_jumped_this_airtime(&self) -> bool { self.motion.has_jumped }
    pub fn hit_by_projectile(&self) -> bool { self.hit_by_projectile }
    pub fn hit_by_spike(&self) -> bool { self.hit_by_spike }
    pub fn cursor_index(&self) -> usize { self.cursor.index() }
    pub fn time_origin(&self) -> f64 { self.cursor.time_origin() }
    pub fn recording(&self) -> &Recording { self.cursor.recording() }
    pub fn params(&self) -> MotionParams { self.params }

    pub fn is_replaying(&self) -> bool {
        self.state == GhostState::Replaying
    }

    pub fn is_frozen(&self) -> bool {
        self.state == GhostState::Frozen
    }

    pub fn is_transformed(&self) -> bool {
        matches!(self.state, GhostState::Transformed(_))
    }

    // ── Replay ──

    /// Apply every sample due at `now`. `grounded` is this tick's live
    /// ground check for the ghost's own body.
    ///
    /// Exhaustion is only reported here. The last sample still gets its
    /// tick of physics and hazards; the world then calls
    /// `freeze_if_exhausted` to close the tick.
    pub fn advance(&mut self, now: f64, grounded: bool) -> ReplayStep {
        let mut step = ReplayStep::default();
        if self.state != GhostState::Replaying {
            return step;
        }
        self.grounded = grounded;

        // A jump lifts the body off the ground for the rest of this tick.
        let mut grounded_now = grounded;
        while let Some(sample) = self.cursor.next_due(now) {
            let outcome = motion::integrate(
                &mut self.body,
                &mut self.motion,
                grounded_now,
                self.params,
                InputSource::Replayed(&sample),
            );
            if outcome.jumped {
                grounded_now = false;
            }
            step.applied.push(AppliedSample { timestamp: sample.timestamp, outcome });
        }
        self.grounded = grounded_now;
        step.exhausted = self.cursor.is_exhausted();
        step
    }

    /// Record the ground check taken after this tick's physics step.
    /// Hazards landing later in the tick read it.
    pub fn settle(&mut self, grounded: bool) {
        self.grounded = grounded;
    }

    /// Replaying → Frozen once every sample has been applied. Returns
    /// true on the transition.
    pub fn freeze_if_exhausted(&mut self) -> bool {
        if self.state != GhostState::Replaying || !self.cursor.is_exhausted() {
            return false;
        }
        self.freeze();
        true
    }

    fn freeze(&mut self) {
        self.body.stop();
        if self.physics_after_freeze {
            self.body.mode = BodyMode::Dynamic;
            self.body.material = Material::HighFriction;
        } else {
            self.body.mode = BodyMode::Fixed;
        }
        self.state = GhostState::Frozen;
        debug!(ghost = %self.id, x = self.body.position.x, y = self.body.position.y, "ghost frozen");
    }

    /// Rewind for a new run starting at `now`. Returns false (and does
    /// nothing) for a transformed ghost, which never replays again.
    pub fn restart(&mut self, now: f64) -> bool {
        if self.is_transformed() {
            return false;
        }
        self.cursor.restart(now);
        self.motion = MotionState::default();
        self.hit_by_projectile = false;
        self.hit_by_spike = false;
        self.grounded = false;
        self.state = GhostState::Replaying;
        self.body.stop();
        self.body.mode = BodyMode::Dynamic;
        self.body.material = Material::Actor;
        if let Some(start) = self.cursor.recording().start_position() {
            self.body.position = start;
        }
        true
    }

    // ── Transformations ──

    /// Deliver a hazard. Returns the substitute to spawn when this event
    /// transforms the ghost; `None` when the event is ignored.
    pub fn on_hazard(&mut self, hazard: Hazard) -> Option<Transformation> {
        if self.state != GhostState::Replaying {
            trace!(ghost = %self.id, state = ?self.state, hazard = ?hazard.kind(), "hazard ignored");
            return None;
        }

        let (kind, position) = match hazard {
            Hazard::Projectile { direction, position } => {
                if self.hit_by_projectile {
                    return None;
                }
                self.hit_by_projectile = true;
                let placement = transform::place_reflector(
                    self.body.bounds(),
                    self.motion.facing,
                    self.grounded,
                    position,
                    direction,
                );
                (PropKind::Reflector(placement.variant), placement.position)
            }
            Hazard::Spike => {
                if self.hit_by_spike {
                    return None;
                }
                self.hit_by_spike = true;
                (PropKind::FallingBody, transform::place_falling_body(self.body.position))
            }
        };

        self.body.stop();
        self.state = GhostState::Transformed(kind);
        debug!(ghost = %self.id, into = ?kind, x = position.x, y = position.y, "ghost transformed");
        Some(Transformation { kind, position })
    }

    /// Clear both one-shot gates. Diagnostics only.
    pub fn reset_hit_gates(&mut self) {
        self.hit_by_projectile = false;
        self.hit_by_spike = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::ReflectorVariant;
    use crate::sim::recording::ActionSample;

    const PARAMS: MotionParams = MotionParams { move_speed: 6.0, jump_force: 13.0 };

    fn sample(t: f64, h: f32, jump: bool) -> ActionSample {
        ActionSample {
            timestamp: t,
            position: Vec2::new(2.5, 3.55),
            velocity: Vec2::ZERO,
            is_grounded: true,
            has_jumped: false,
            horizontal_input: h,
            jump_pressed: jump,
        }
    }

    fn ghost(samples: Vec<ActionSample>, after_freeze: bool) -> Ghost {
        Ghost::new(GhostId(1), Recording::new(samples), 10.0, PARAMS, after_freeze)
    }

    #[test]
    fn starts_at_recorded_start_position() {
        let g = ghost(vec![sample(0.0, 0.0, false)], false);
        assert_eq!(g.position(), Vec2::new(2.5, 3.55));
        assert!(g.is_replaying());
        assert_eq!(g.time_origin(), 10.0);
    }

    #[test]
    fn advance_applies_due_samples_in_order() {
        let mut g = ghost(vec![sample(0.0, 1.0, false), sample(0.1, -1.0, false), sample(0.2, 0.0, false)], false);
        let s = g.advance(10.0, true);
        assert_eq!(s.applied.len(), 1);
        assert_eq!(g.body.velocity.x, 6.0);
        let s = g.advance(10.1, true);
        assert_eq!(s.applied.len(), 1);
        assert_eq!(g.facing(), Facing::Left);
        assert_eq!(g.cursor_index(), 2);
        assert!(!s.exhausted);
        assert!(!g.freeze_if_exhausted());
    }

    #[test]
    fn exhaustion_freezes_after_the_last_sample() {
        let mut g = ghost(vec![sample(0.0, 1.0, false), sample(0.1, 1.0, false)], false);
        g.advance(10.0, true);
        let s = g.advance(10.1, true);
        assert_eq!(s.applied.len(), 1);
        assert!(s.exhausted);
        assert!(g.is_replaying());
        assert!(g.freeze_if_exhausted());
        assert!(g.is_frozen());
        assert_eq!(g.body.velocity, Vec2::ZERO);
        assert_eq!(g.body.mode, BodyMode::Fixed);
        // Terminal: nothing more happens.
        assert!(g.advance(11.0, true).applied.is_empty());
        assert!(!g.freeze_if_exhausted());
    }

    #[test]
    fn physics_after_freeze_keeps_body_dynamic_and_grippy() {
        let mut g = ghost(vec![sample(0.0, 1.0, false)], true);
        g.advance(10.0, true);
        assert!(g.freeze_if_exhausted());
        assert_eq!(g.body.mode, BodyMode::Dynamic);
        assert_eq!(g.body.material, Material::HighFriction);
    }

    #[test]
    fn recorded_jump_needs_live_ground() {
        let mut g = ghost(vec![sample(0.0, 0.0, true), sample(1.0, 0.0, false)], false);
        let s = g.advance(10.0, false);
        assert!(!s.applied[0].outcome.jumped);
        assert_eq!(g.body.velocity.y, 0.0);
    }

    #[test]
    fn jump_tick_leaves_ghost_airborne_for_hazards() {
        let mut g = ghost(vec![sample(0.0, 0.0, true), sample(1.0, 0.0, false)], false);
        g.advance(10.0, true);
        assert!(!g.grounded);
        let t = g.on_hazard(Hazard::Projectile { direction: Vec2::new(-1.0, 0.0), position: Vec2::new(3.0, 3.2) })
            .expect("transforms");
        assert_eq!(t.kind, PropKind::Reflector(ReflectorVariant::RightAirborne));
    }

    #[test]
    fn settle_overrides_the_pre_physics_ground_check() {
        let mut g = ghost(vec![sample(0.0, 1.0, false), sample(1.0, 0.0, false)], false);
        g.advance(10.0, true);
        assert!(g.grounded);
        g.settle(false);
        let t = g.on_hazard(Hazard::Projectile { direction: Vec2::new(-1.0, 0.0), position: Vec2::new(3.0, 3.2) })
            .expect("transforms");
        assert_eq!(t.kind, PropKind::Reflector(ReflectorVariant::RightAirborne));
    }

    #[test]
    fn catch_up_cannot_double_jump_in_one_tick() {
        let mut g = ghost(vec![sample(0.0, 0.0, true), sample(0.01, 0.0, true), sample(1.0, 0.0, false)], false);
        let s = g.advance(10.05, true);
        assert_eq!(s.applied.len(), 2);
        assert!(s.applied[0].outcome.jumped);
        assert!(!s.applied[1].outcome.jumped);
        assert_eq!(g.body.velocity.y, -13.0);
    }

    #[test]
    fn projectile_transforms_into_reflector_once() {
        // Airborne, facing right, hit from the right.
        let mut g = ghost(vec![sample(0.0, 1.0, false), sample(5.0, 0.0, false)], false);
        g.advance(10.0, false);
        let t = g.on_hazard(Hazard::Projectile { direction: Vec2::new(-1.0, 0.0), position: Vec2::new(3.4, 3.2) })
            .expect("transforms");
        assert_eq!(t.kind, PropKind::Reflector(ReflectorVariant::RightAirborne));
        assert_eq!(t.position, Vec2::new(2.5, 3.5));
        assert!(g.is_transformed());
        assert!(g.on_hazard(Hazard::Projectile { direction: Vec2::new(-1.0, 0.0), position: Vec2::ZERO }).is_none());
        assert!(g.on_hazard(Hazard::Spike).is_none());
        assert!(!g.restart(20.0));
        assert!(g.is_transformed());
    }

    #[test]
    fn spike_transforms_into_falling_body_at_snapped_position() {
        let mut g = ghost(vec![sample(0.0, 0.0, false), sample(5.0, 0.0, false)], false);
        let t = g.on_hazard(Hazard::Spike).expect("transforms");
        assert_eq!(t.kind, PropKind::FallingBody);
        assert_eq!(t.position, Vec2::new(2.5, 3.5));
    }

    #[test]
    fn spent_spike_gate_ignores_second_spike() {
        let mut g = ghost(vec![sample(0.0, 0.0, false), sample(5.0, 0.0, false)], false);
        g.hit_by_spike = true;
        assert!(g.on_hazard(Hazard::Spike).is_none());
        assert!(g.is_replaying());
        assert!(g.hit_by_spike());
    }

    #[test]
    fn frozen_ghost_ignores_hazards() {
        let mut g = ghost(vec![sample(0.0, 0.0, false)], false);
        g.advance(10.0, true);
        g.freeze_if_exhausted();
        assert!(g.on_hazard(Hazard::Spike).is_none());
        assert!(g.is_frozen());
        assert!(!g.hit_by_spike());
    }

    #[test]
    fn restart_rewinds_everything() {
        let mut g = ghost(vec![sample(0.0, 1.0, true), sample(0.1, 1.0, false)], true);
        g.advance(10.0, true);
        g.body.position = Vec2::new(9.0, 9.0);
        g.advance(10.1, false);
        assert!(g.freeze_if_exhausted());
        g.hit_by_projectile = true;

        assert!(g.restart(30.0));
        assert!(g.is_replaying());
        assert_eq!(g.cursor_index(), 0);
        assert_eq!(g.time_origin(), 30.0);
        assert!(!g.has_jumped_this_airtime());
        assert!(!g.hit_by_projectile());
        assert_eq!(g.position(), Vec2::new(2.5, 3.55));
        assert_eq!(g.body.velocity, Vec2::ZERO);
        assert_eq!(g.body.mode, BodyMode::Dynamic);
        assert_eq!(g.body.material, Material::Actor);
    }

    #[test]
    fn only_hazard_kinds_produce_hazards() {
        let d = Vec2::new(-1.0, 0.0);
        let p = Vec2::new(1.0, 2.0);
        assert_eq!(Hazard::from_contact(EntityKind::Projectile, d, p), Some(Hazard::Projectile { direction: d, position: p }));
        assert_eq!(Hazard::from_contact(EntityKind::Spike, d, p), Some(Hazard::Spike));
        assert_eq!(Hazard::from_contact(EntityKind::Reflector, d, p), None);
        assert_eq!(Hazard::from_contact(EntityKind::Player, d, p), None);
    }

    #[test]
    fn diagnostic_gate_reset_rearms_hazards() {
        let mut g = ghost(vec![sample(0.0, 0.0, false), sample(5.0, 0.0, false)], false);
        g.hit_by_spike = true;
        g.reset_hit_gates();
        assert!(g.on_hazard(Hazard::Spike).is_some());
    }
}
