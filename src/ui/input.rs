/// Keyboard state tracker.
///
/// Turns the terminal's key event stream into the two kinds of query the
/// game loop needs:
///   - held keys, for continuous horizontal movement
///   - fresh presses, for one-shot actions (jump, reset, F-keys)
///
/// Terminals without keyboard enhancement never report releases, so a key
/// counts as released once it has been quiet for `HOLD_TIMEOUT`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Last Press/Repeat per key.
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from released to held since the last drain.
    fresh_presses: Vec<KeyCode>,
    pub raw_events: Vec<KeyEvent>,
    /// Trust Release events (keyboard enhancement confirmed).
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Read every pending terminal event without blocking. Once per frame.
    pub fn drain_events(&mut self) {
        self.begin_frame();
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => self.handle_key(key, Instant::now()),
                Ok(_) => {}
                Err(_) => break,
            }
        }
        self.expire(Instant::now());
    }

    fn begin_frame(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
    }

    fn handle_key(&mut self, key: KeyEvent, at: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                if !self.is_held_at(key.code, at) {
                    self.fresh_presses.push(key.code);
                }
                self.last_active.insert(key.code, at);
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.is_held_at(code, Instant::now())
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// -1, 0 or 1 from two key groups. Both held cancel out.
    pub fn axis(&self, negative: &[KeyCode], positive: &[KeyCode]) -> f32 {
        let neg = self.any_held(negative) || self.any_pressed(negative);
        let pos = self.any_held(positive) || self.any_pressed(positive);
        match (neg, pos) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        })
    }

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active.get(&code)
            .is_some_and(|t| now.saturating_duration_since(*t) < HOLD_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Release)
    }

    #[test]
    fn first_press_is_fresh_repeat_is_not() {
        let mut input = InputState::new();
        let t = Instant::now();
        input.begin_frame();
        input.handle_key(press(KeyCode::Char(' ')), t);
        assert!(input.was_pressed(KeyCode::Char(' ')));

        input.begin_frame();
        input.handle_key(press(KeyCode::Char(' ')), t + Duration::from_millis(30));
        assert!(!input.was_pressed(KeyCode::Char(' ')));
        assert!(input.is_held_at(KeyCode::Char(' '), t + Duration::from_millis(60)));
    }

    #[test]
    fn held_keys_time_out_without_release_events() {
        let mut input = InputState::new();
        let t = Instant::now();
        input.handle_key(press(KeyCode::Left), t);
        input.expire(t + HOLD_TIMEOUT * 2);
        assert!(!input.is_held_at(KeyCode::Left, t + HOLD_TIMEOUT * 2));
    }

    #[test]
    fn release_only_counts_when_honored() {
        let mut input = InputState::new();
        let t = Instant::now();
        input.handle_key(press(KeyCode::Right), t);
        input.handle_key(release(KeyCode::Right), t);
        assert!(input.is_held_at(KeyCode::Right, t));

        input.honor_release = true;
        input.handle_key(release(KeyCode::Right), t);
        assert!(!input.is_held_at(KeyCode::Right, t));
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut input = InputState::new();
        let now = Instant::now();
        input.handle_key(press(KeyCode::Left), now);
        assert_eq!(input.axis(&[KeyCode::Left], &[KeyCode::Right]), -1.0);
        input.handle_key(press(KeyCode::Right), now);
        assert_eq!(input.axis(&[KeyCode::Left], &[KeyCode::Right]), 0.0);
    }

    #[test]
    fn ctrl_c_is_detected() {
        let mut input = InputState::new();
        input.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        assert!(input.ctrl_c_pressed());
    }
}
