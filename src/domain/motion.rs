/// Motion integrator shared by the live actor and every ghost.
///
/// One procedure turns a control sample into body changes:
///   1. Live ground contact resets the one-jump-per-airtime latch
///   2. Horizontal velocity = `horizontal * move_speed`
///   3. Jump impulse if pressed, grounded and not latched
///   4. Facing follows the sign of the horizontal input
///
/// Only the data source differs between callers (`InputSource`), so the
/// ghost does exactly what the player did given the same ground contact.
/// Ground contact itself is always measured live by the caller.

use super::entity::Facing;
use super::geom::Vec2;
use super::physics::Body;
use crate::sim::recording::ActionSample;

/// Movement parameters. Ghosts capture a copy at creation.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct MotionParams {
    pub move_speed: f32,
    pub jump_force: f32,
}

/// Per-actor integrator state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MotionState {
    pub has_jumped: bool,
    pub facing: Facing,
}

impl Default for MotionState {
    fn default() -> Self {
        MotionState { has_jumped: false, facing: Facing::Right }
    }
}

/// Control read from the keyboard/gamepad this tick.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct LiveInput {
    pub horizontal: f32,
    pub jump_pressed: bool,
}

/// Where the integrator's control comes from.
#[derive(Clone, Copy, Debug)]
pub enum InputSource<'a> {
    Live(LiveInput),
    Replayed(&'a ActionSample),
}

impl InputSource<'_> {
    /// `(horizontal, jump_pressed)` regardless of origin.
    pub fn control(&self) -> (f32, bool) {
        match self {
            InputSource::Live(input) => (input.horizontal.clamp(-1.0, 1.0), input.jump_pressed),
            InputSource::Replayed(sample) => (sample.horizontal_input, sample.jump_pressed),
        }
    }
}

/// Observable result of one integration, used to compare live and replay.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct MotionOutcome {
    pub velocity_x: f32,
    pub jumped: bool,
}

/// Apply one control to `body`. `grounded` must come from the live
/// ground query for this body on this tick.
pub fn integrate(
    body: &mut Body,
    state: &mut MotionState,
    grounded: bool,
    params: MotionParams,
    source: InputSource<'_>,
) -> MotionOutcome {
    let (horizontal, jump_pressed) = source.control();

    if grounded {
        state.has_jumped = false;
    }

    body.velocity.x = horizontal * params.move_speed;

    let mut jumped = false;
    if jump_pressed && grounded && !state.has_jumped {
        body.apply_impulse(Vec2::new(0.0, -params.jump_force));
        state.has_jumped = true;
        jumped = true;
    }

    if let Some(facing) = Facing::from_axis(horizontal) {
        state.facing = facing;
    }

    MotionOutcome { velocity_x: body.velocity.x, jumped }
}
