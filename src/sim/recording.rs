/// Run capture: action samples, recordings and the recorder.
///
/// A run's samples are appended tick by tick, then handed off in one
/// piece on reset. After hand-off the samples are shared read-only by the
/// ghost replaying them (`Recording` clones are reference-counted).

use std::sync::Arc;

use crate::domain::geom::Vec2;

/// One control sample of the live actor. Immutable once recorded.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ActionSample {
    /// Seconds since the run started.
    pub timestamp: f64,
    pub position: Vec2,
    pub velocity: Vec2,
    pub is_grounded: bool,
    pub has_jumped: bool,
    /// In `[-1, 1]`.
    pub horizontal_input: f32,
    /// Jump edge for this tick.
    pub jump_pressed: bool,
}

/// The ordered samples of exactly one run.
#[derive(Clone, Debug)]
pub struct Recording {
    samples: Arc<[ActionSample]>,
}

impl Default for Recording {
    fn default() -> Self {
        Recording::new(Vec::new())
    }
}

impl Recording {
    pub fn new(samples: Vec<ActionSample>) -> Self {
        Recording { samples: samples.into() }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ActionSample> {
        self.samples.get(index)
    }

    pub fn samples(&self) -> &[ActionSample] {
        &self.samples
    }

    /// Where the recorded actor started.
    pub fn start_position(&self) -> Option<Vec2> {
        self.samples.first().map(|s| s.position)
    }

    pub fn last_timestamp(&self) -> f64 {
        self.samples.last().map_or(0.0, |s| s.timestamp)
    }
}

impl FromIterator<ActionSample> for Recording {
    fn from_iter<I: IntoIterator<Item = ActionSample>>(iter: I) -> Self {
        Recording::new(iter.into_iter().collect())
    }
}

/// Accumulates samples for the live actor during a run.
#[derive(Debug)]
pub struct Recorder {
    samples: Vec<ActionSample>,
    start_time: f64,
    enabled: bool,
}

impl Recorder {
    pub fn new(start_time: f64) -> Self {
        Recorder { samples: Vec::with_capacity(1024), start_time, enabled: true }
    }

    /// Append one sample. Ignored while disabled.
    #[allow(clippy::too_many_arguments)]
    pub fn sample(
        &mut self,
        time: f64,
        position: Vec2,
        velocity: Vec2,
        is_grounded: bool,
        has_jumped: bool,
        horizontal_input: f32,
        jump_pressed: bool,
    ) {
        if !self.enabled {
            return;
        }
        let timestamp = (time - self.start_time).max(0.0);
        // Keep the sequence ascending even if a caller hands us a stale time.
        let timestamp = self.samples.last().map_or(timestamp, |s| timestamp.max(s.timestamp));
        self.samples.push(ActionSample {
            timestamp,
            position,
            velocity,
            is_grounded,
            has_jumped,
            horizontal_input: horizontal_input.clamp(-1.0, 1.0),
            jump_pressed,
        });
    }

    /// Hand off the run so far and start an empty one at `new_start`.
    pub fn take(&mut self, new_start: f64) -> Recording {
        let samples = std::mem::take(&mut self.samples);
        self.start_time = new_start;
        Recording::new(samples)
    }

    /// Drop the current run without handing it off.
    pub fn discard(&mut self, new_start: f64) {
        self.samples.clear();
        self.start_time = new_start;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(r: &mut Recorder, t: f64, h: f32) {
        r.sample(t, Vec2::new(t as f32, 0.0), Vec2::ZERO, true, false, h, false);
    }

    #[test]
    fn timestamps_are_relative_to_run_start() {
        let mut r = Recorder::new(10.0);
        push(&mut r, 10.0, 1.0);
        push(&mut r, 10.5, 1.0);
        let rec = r.take(20.0);
        assert_eq!(rec.len(), 2);
        assert_eq!(rec.get(0).map(|s| s.timestamp), Some(0.0));
        assert_eq!(rec.last_timestamp(), 0.5);
        assert_eq!(rec.start_position(), Some(Vec2::new(10.0, 0.0)));
    }

    #[test]
    fn take_resets_to_empty_with_new_start() {
        let mut r = Recorder::new(0.0);
        push(&mut r, 0.0, 0.0);
        let first = r.take(3.0);
        assert_eq!(first.len(), 1);
        assert_eq!(r.len(), 0);
        assert_eq!(r.start_time(), 3.0);
        push(&mut r, 3.25, 0.0);
        let second = r.take(4.0);
        assert_eq!(second.get(0).map(|s| s.timestamp), Some(0.25));
        // The handed-off recording is unaffected by later runs.
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn disabled_recorder_ignores_samples() {
        let mut r = Recorder::new(0.0);
        r.set_enabled(false);
        push(&mut r, 0.1, 1.0);
        assert!(r.take(1.0).is_empty());
    }

    #[test]
    fn horizontal_input_is_clamped() {
        let mut r = Recorder::new(0.0);
        push(&mut r, 0.0, 3.0);
        push(&mut r, 0.1, -7.0);
        let rec = r.take(1.0);
        assert_eq!(rec.samples()[0].horizontal_input, 1.0);
        assert_eq!(rec.samples()[1].horizontal_input, -1.0);
    }

    #[test]
    fn timestamps_never_go_backwards() {
        let mut r = Recorder::new(5.0);
        push(&mut r, 5.2, 0.0);
        push(&mut r, 4.0, 0.0);
        let rec = r.take(6.0);
        assert!(rec.samples()[1].timestamp >= rec.samples()[0].timestamp);
    }
}
