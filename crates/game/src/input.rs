//! Player input handling.
//!
//! Raw button states arrive once per rendered frame, while locomotion runs on
//! a fixed tick. [`InputSampler`] bridges the two: held buttons are read from
//! the latest frame, and press edges are latched until a tick consumes them
//! so a quick tap between ticks is never lost.

use caboose_physics::movement::LocomotionInput;
use serde::{Deserialize, Serialize};

/// Raw player input for a single frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Direction keys held.
    pub movement: MovementInput,

    /// Action buttons held.
    pub actions: ActionInput,

    /// Frame number this input was generated.
    pub frame: u32,
}

/// Direction key states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// Action button states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionInput {
    pub jump: bool,
    pub crouch: bool,
    pub interact: bool,
}

impl PlayerInput {
    /// Left/right axis, -1, 0 or 1.
    pub fn horizontal(&self) -> f32 {
        axis(self.movement.left, self.movement.right)
    }

    /// Down/up axis, -1, 0 or 1.
    pub fn vertical(&self) -> f32 {
        axis(self.movement.down, self.movement.up)
    }

    /// Check if any direction key is held.
    pub fn has_movement(&self) -> bool {
        self.movement.left || self.movement.right || self.movement.up || self.movement.down
    }
}

fn axis(negative: bool, positive: bool) -> f32 {
    match (negative, positive) {
        (false, true) => 1.0,
        (true, false) => -1.0,
        _ => 0.0,
    }
}

/// Turns per-frame button states into per-tick locomotion input.
#[derive(Debug, Clone, Default)]
pub struct InputSampler {
    latest: PlayerInput,
    jump_latched: bool,
    interact_latched: bool,
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame of input.
    pub fn sample(&mut self, input: &PlayerInput) {
        if input.actions.jump && !self.latest.actions.jump {
            self.jump_latched = true;
        }
        if input.actions.interact && !self.latest.actions.interact {
            self.interact_latched = true;
        }
        self.latest = input.clone();
    }

    /// Input for the next fixed tick. Clears latched presses.
    pub fn take_tick_input(&mut self) -> LocomotionInput {
        let input = self.peek();
        self.jump_latched = false;
        self.interact_latched = false;
        input
    }

    /// Input the next tick would see, without consuming presses.
    pub fn peek(&self) -> LocomotionInput {
        LocomotionInput {
            horizontal: self.latest.horizontal(),
            vertical: self.latest.vertical(),
            jump_pressed: self.jump_latched,
            jump_held: self.latest.actions.jump,
            crouch_held: self.latest.actions.crouch,
            interact_pressed: self.interact_latched,
        }
    }

    pub fn latest(&self) -> &PlayerInput {
        &self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(jump: bool) -> PlayerInput {
        PlayerInput {
            actions: ActionInput {
                jump,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut input = PlayerInput::default();
        input.movement.left = true;
        input.movement.right = true;
        input.movement.up = true;

        assert_eq!(input.horizontal(), 0.0);
        assert_eq!(input.vertical(), 1.0);
        assert!(input.has_movement());
    }

    #[test]
    fn test_tap_between_ticks_is_latched() {
        let mut sampler = InputSampler::new();

        // Pressed and released within two render frames
        sampler.sample(&frame(true));
        sampler.sample(&frame(false));

        let tick = sampler.take_tick_input();
        assert!(tick.jump_pressed);
        assert!(!tick.jump_held);

        // Consumed
        assert!(!sampler.take_tick_input().jump_pressed);
    }

    #[test]
    fn test_holding_is_one_press() {
        let mut sampler = InputSampler::new();
        sampler.sample(&frame(true));
        assert!(sampler.take_tick_input().jump_pressed);

        sampler.sample(&frame(true));
        sampler.sample(&frame(true));
        let tick = sampler.take_tick_input();
        assert!(!tick.jump_pressed);
        assert!(tick.jump_held);
    }
}
