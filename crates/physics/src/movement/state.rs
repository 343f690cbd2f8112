//! Movement state and input structures.

use serde::{Deserialize, Serialize};

/// The single discrete state the character is in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementState {
    /// Grounded without horizontal input.
    #[default]
    Idle,
    /// Grounded with horizontal input.
    Walking,
    /// Airborne and rising.
    Jumping,
    /// Airborne and not rising.
    Falling,
    /// Grounded and crouched.
    Crouching,
    /// Attached to a ladder.
    OnLadder,
}

impl MovementState {
    /// Every state, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Idle,
        Self::Walking,
        Self::Jumping,
        Self::Falling,
        Self::Crouching,
        Self::OnLadder,
    ];

    /// Check if this is a grounded state.
    #[inline]
    pub fn is_grounded(self) -> bool {
        matches!(self, Self::Idle | Self::Walking | Self::Crouching)
    }

    /// Check if this is an airborne state.
    #[inline]
    pub fn is_airborne(self) -> bool {
        matches!(self, Self::Jumping | Self::Falling)
    }
}

/// Predicates the state is resolved from, sampled once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StateInputs {
    pub on_ladder: bool,
    pub grounded: bool,
    pub crouching: bool,
    pub moving: bool,
    pub vertical_velocity: f32,
}

/// Pick the state for one tick.
///
/// Ladder wins over everything, then airborne by vertical velocity sign,
/// then crouch, then input.
pub fn resolve_state(inputs: StateInputs) -> MovementState {
    if inputs.on_ladder {
        MovementState::OnLadder
    } else if !inputs.grounded {
        if inputs.vertical_velocity > 0.0 {
            MovementState::Jumping
        } else {
            MovementState::Falling
        }
    } else if inputs.crouching {
        MovementState::Crouching
    } else if inputs.moving {
        MovementState::Walking
    } else {
        MovementState::Idle
    }
}

/// Input for a single fixed tick.
///
/// Press fields are edges: true only on the first tick after the button went
/// down. Held fields are levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LocomotionInput {
    /// Left/right axis, -1.0 to 1.0. Positive = right.
    pub horizontal: f32,

    /// Down/up axis, -1.0 to 1.0. Positive = up.
    pub vertical: f32,

    /// Jump went down since the last tick.
    pub jump_pressed: bool,

    /// Jump is held.
    pub jump_held: bool,

    /// Crouch is held.
    pub crouch_held: bool,

    /// Interact went down since the last tick.
    pub interact_pressed: bool,
}

impl LocomotionInput {
    /// Horizontal axis clamped to [-1, 1], zero if not finite.
    #[inline]
    pub fn horizontal_axis(&self) -> f32 {
        clamp_axis(self.horizontal)
    }

    /// Vertical axis clamped to [-1, 1], zero if not finite.
    #[inline]
    pub fn vertical_axis(&self) -> f32 {
        clamp_axis(self.vertical)
    }

    /// Check if horizontal input is outside the dead zone.
    #[inline]
    pub fn has_horizontal_input(&self, dead_zone: f32) -> bool {
        self.horizontal_axis().abs() > dead_zone
    }
}

fn clamp_axis(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_predicate_combination_has_one_state() {
        for on_ladder in [false, true] {
            for grounded in [false, true] {
                for crouching in [false, true] {
                    for moving in [false, true] {
                        for vertical_velocity in [-1.0, 0.0, 1.0] {
                            let inputs = StateInputs {
                                on_ladder,
                                grounded,
                                crouching,
                                moving,
                                vertical_velocity,
                            };
                            let state = resolve_state(inputs);

                            let expected = if on_ladder {
                                MovementState::OnLadder
                            } else if !grounded && vertical_velocity > 0.0 {
                                MovementState::Jumping
                            } else if !grounded {
                                MovementState::Falling
                            } else if crouching {
                                MovementState::Crouching
                            } else if moving {
                                MovementState::Walking
                            } else {
                                MovementState::Idle
                            };
                            assert_eq!(state, expected, "{inputs:?}");

                            let holding = MovementState::ALL.iter().filter(|s| **s == state).count();
                            assert_eq!(holding, 1);
                            assert!(state.is_grounded() != state.is_airborne() || state == MovementState::OnLadder);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_input_axes_are_clamped() {
        let input = LocomotionInput {
            horizontal: 3.0,
            vertical: f32::NAN,
            ..Default::default()
        };
        assert_eq!(input.horizontal_axis(), 1.0);
        assert_eq!(input.vertical_axis(), 0.0);
        assert!(input.has_horizontal_input(0.01));
        assert!(!LocomotionInput::default().has_horizontal_input(0.01));
    }
}
