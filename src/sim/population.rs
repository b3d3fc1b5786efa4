/// The echo: every ghost currently in the world, oldest first.
///
/// Bounded FIFO. A reset with a non-empty recording appends one ghost,
/// evicting the oldest when full, then restarts every survivor so the
/// whole echo replays in lockstep with the new run.

use std::collections::VecDeque;

use tracing::info;

use crate::domain::entity::GhostId;
use crate::domain::motion::MotionParams;
use super::ghost::Ghost;
use super::recording::Recording;

/// What one reset did to the population.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResetReport {
    pub created: Option<GhostId>,
    pub evicted: Option<GhostId>,
    pub restarted: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PopulationStats {
    pub count: usize,
    pub capacity: usize,
}

#[derive(Debug)]
pub struct GhostPopulation {
    ghosts: VecDeque<Ghost>,
    max_ghosts: usize,
    next_id: u64,
}

impl GhostPopulation {
    pub fn new(max_ghosts: usize) -> Self {
        GhostPopulation { ghosts: VecDeque::with_capacity(max_ghosts), max_ghosts, next_id: 1 }
    }

    pub fn on_reset(
        &mut self,
        recording: Recording,
        now: f64,
        params: MotionParams,
        physics_after_freeze: bool,
    ) -> ResetReport {
        let mut report = ResetReport::default();

        // Anything transformed should already be gone; never replay it.
        self.ghosts.retain(|g| !g.is_transformed());

        if !recording.is_empty() && self.max_ghosts > 0 {
            if self.ghosts.len() >= self.max_ghosts {
                if let Some(old) = self.ghosts.pop_front() {
                    info!(ghost = %old.id(), "evicted oldest ghost");
                    report.evicted = Some(old.id());
                }
            }
            let id = GhostId(self.next_id);
            self.next_id += 1;
            info!(ghost = %id, samples = recording.len(), duration = recording.last_timestamp(), "ghost created");
            self.ghosts.push_back(Ghost::new(id, recording, now, params, physics_after_freeze));
            report.created = Some(id);
        }

        for g in self.ghosts.iter_mut() {
            if g.restart(now) {
                report.restarted += 1;
            }
        }
        report
    }

    /// Destroy one ghost (after a transformation).
    pub fn remove(&mut self, id: GhostId) -> Option<Ghost> {
        let idx = self.ghosts.iter().position(|g| g.id() == id)?;
        self.ghosts.remove(idx)
    }

    pub fn clear(&mut self) {
        self.ghosts.clear();
    }

    pub fn get(&self, id: GhostId) -> Option<&Ghost> {
        self.ghosts.iter().find(|g| g.id() == id)
    }

    pub fn get_mut(&mut self, id: GhostId) -> Option<&mut Ghost> {
        self.ghosts.iter_mut().find(|g| g.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ghost> {
        self.ghosts.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Ghost> {
        self.ghosts.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.ghosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ghosts.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_ghosts
    }

    pub fn stats(&self) -> PopulationStats {
        PopulationStats { count: self.len(), capacity: self.max_ghosts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geom::Vec2;
    use crate::sim::ghost::Hazard;
    use crate::sim::recording::ActionSample;
    use proptest::prelude::*;

    const PARAMS: MotionParams = MotionParams { move_speed: 6.0, jump_force: 13.0 };

    fn recording(start_x: f32, times: &[f64]) -> Recording {
        times.iter().map(|&t| ActionSample {
            timestamp: t,
            position: Vec2::new(start_x, 1.55),
            velocity: Vec2::ZERO,
            is_grounded: true,
            has_jumped: false,
            horizontal_input: 1.0,
            jump_pressed: false,
        }).collect()
    }

    #[test]
    fn empty_recording_creates_no_ghost() {
        let mut pop = GhostPopulation::new(3);
        let r = pop.on_reset(Recording::default(), 0.0, PARAMS, false);
        assert_eq!(r.created, None);
        assert!(pop.is_empty());
    }

    #[test]
    fn single_slot_keeps_only_the_latest_run() {
        let mut pop = GhostPopulation::new(1);
        pop.on_reset(recording(1.5, &[0.0, 0.1]), 1.0, PARAMS, false);
        let r = pop.on_reset(recording(7.5, &[0.0, 0.1]), 2.0, PARAMS, false);

        assert_eq!(pop.len(), 1);
        assert_eq!(r.evicted, Some(GhostId(1)));
        assert_eq!(r.created, Some(GhostId(2)));
        let g = pop.iter().next().expect("one ghost");
        assert_eq!(g.position(), Vec2::new(7.5, 1.55));
        assert_eq!(g.cursor_index(), 0);
        assert_eq!(g.time_origin(), 2.0);
        assert!(g.is_replaying());
    }

    #[test]
    fn reset_restarts_every_survivor() {
        let mut pop = GhostPopulation::new(4);
        pop.on_reset(recording(1.5, &[0.0]), 0.0, PARAMS, false);
        for g in pop.iter_mut() {
            g.advance(0.0, true);
            assert!(g.freeze_if_exhausted());
        }
        let r = pop.on_reset(Recording::default(), 5.0, PARAMS, false);
        assert_eq!(r.restarted, 1);
        let g = pop.iter().next().expect("ghost survives");
        assert!(g.is_replaying());
        assert_eq!(g.time_origin(), 5.0);
    }

    #[test]
    fn transformed_ghosts_are_never_restarted() {
        let mut pop = GhostPopulation::new(4);
        pop.on_reset(recording(1.5, &[0.0, 9.0]), 0.0, PARAMS, false);
        let id = pop.iter().next().map(|g| g.id()).expect("ghost");
        assert!(pop.get_mut(id).and_then(|g| g.on_hazard(Hazard::Spike)).is_some());
        pop.on_reset(Recording::default(), 1.0, PARAMS, false);
        assert!(pop.get(id).is_none());
    }

    #[test]
    fn remove_by_id() {
        let mut pop = GhostPopulation::new(4);
        pop.on_reset(recording(1.5, &[0.0]), 0.0, PARAMS, false);
        pop.on_reset(recording(2.5, &[0.0]), 1.0, PARAMS, false);
        assert!(pop.remove(GhostId(1)).is_some());
        assert!(pop.remove(GhostId(1)).is_none());
        assert_eq!(pop.stats(), PopulationStats { count: 1, capacity: 4 });
    }

    #[test]
    fn zero_capacity_holds_nothing() {
        let mut pop = GhostPopulation::new(0);
        pop.on_reset(recording(1.5, &[0.0]), 0.0, PARAMS, false);
        assert!(pop.is_empty());
    }

    proptest! {
        #[test]
        fn population_stays_bounded_and_keeps_newest(
            max in 1usize..6,
            runs in proptest::collection::vec(any::<bool>(), 0..40),
        ) {
            let mut pop = GhostPopulation::new(max);
            let mut created = Vec::new();
            for (i, non_empty) in runs.iter().enumerate() {
                let rec = if *non_empty { recording(i as f32, &[0.0]) } else { Recording::default() };
                if let Some(id) = pop.on_reset(rec, i as f64, PARAMS, false).created {
                    created.push(id);
                }
                prop_assert!(pop.len() <= max);
            }
            let expected: Vec<GhostId> = created.iter().rev().take(max).rev().copied().collect();
            let actual: Vec<GhostId> = pop.iter().map(|g| g.id()).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
