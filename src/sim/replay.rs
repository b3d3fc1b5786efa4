/// Replay cursor: a position in a recording plus a time origin.
///
/// `simulated = now - time_origin` is compared against sample timestamps;
/// every sample whose timestamp has been reached is "due". The cursor
/// only moves forward and stops at the end of the recording.

use super::recording::{ActionSample, Recording};

/// Absorbs float drift between recorded and replayed elapsed times.
pub const TIME_EPSILON: f64 = 1e-6;

#[derive(Clone, Debug)]
pub struct ReplayCursor {
    recording: Recording,
    index: usize,
    time_origin: f64,
}

impl ReplayCursor {
    pub fn new(recording: Recording, time_origin: f64) -> Self {
        ReplayCursor { recording, index: 0, time_origin }
    }

    /// Rewind to the first sample with a new origin.
    pub fn restart(&mut self, time_origin: f64) {
        self.index = 0;
        self.time_origin = time_origin;
    }

    pub fn simulated_time(&self, now: f64) -> f64 {
        now - self.time_origin
    }

    /// Next sample due at `now`, advancing past it.
    pub fn next_due(&mut self, now: f64) -> Option<ActionSample> {
        let simulated = self.simulated_time(now);
        let sample = *self.recording.get(self.index)?;
        if sample.timestamp <= simulated + TIME_EPSILON {
            self.index += 1;
            Some(sample)
        } else {
            None
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.index >= self.recording.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn time_origin(&self) -> f64 {
        self.time_origin
    }

    pub fn recording(&self) -> &Recording {
        &self.recording
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geom::Vec2;

    fn rec(times: &[f64]) -> Recording {
        times.iter().map(|&t| ActionSample {
            timestamp: t,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            is_grounded: true,
            has_jumped: false,
            horizontal_input: 0.0,
            jump_pressed: false,
        }).collect()
    }

    fn drain(c: &mut ReplayCursor, now: f64) -> usize {
        let mut n = 0;
        while c.next_due(now).is_some() {
            n += 1;
        }
        n
    }

    #[test]
    fn releases_samples_as_time_passes() {
        let mut c = ReplayCursor::new(rec(&[0.0, 0.1, 0.2, 0.5]), 100.0);
        assert_eq!(drain(&mut c, 100.0), 1);
        assert_eq!(drain(&mut c, 100.15), 1);
        assert_eq!(drain(&mut c, 100.3), 1);
        assert!(!c.is_exhausted());
        assert_eq!(drain(&mut c, 101.0), 1);
        assert!(c.is_exhausted());
    }

    #[test]
    fn catches_up_several_samples_in_one_tick() {
        let mut c = ReplayCursor::new(rec(&[0.0, 0.1, 0.2]), 0.0);
        assert_eq!(drain(&mut c, 0.25), 3);
        assert_eq!(c.index(), 3);
    }

    #[test]
    fn exhausted_cursor_stays_in_bounds() {
        let mut c = ReplayCursor::new(rec(&[0.0]), 0.0);
        drain(&mut c, 1.0);
        assert!(c.next_due(50.0).is_none());
        assert_eq!(c.index(), 1);
    }

    #[test]
    fn restart_rewinds_with_new_origin() {
        let mut c = ReplayCursor::new(rec(&[0.0, 0.1]), 0.0);
        drain(&mut c, 1.0);
        c.restart(7.0);
        assert_eq!(c.index(), 0);
        assert_eq!(c.time_origin(), 7.0);
        assert_eq!(drain(&mut c, 7.0), 1);
    }

    #[test]
    fn empty_recording_is_immediately_exhausted() {
        let mut c = ReplayCursor::new(Recording::default(), 0.0);
        assert!(c.is_exhausted());
        assert!(c.next_due(0.0).is_none());
    }
}
