//! Jump timing.
//!
//! Two countdowns make jumping forgiving. The buffer remembers a press made
//! shortly before landing; coyote time keeps honoring presses shortly after
//! walking off a ledge. A jump fires only while both are running.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::config::JumpConfig;

/// Jump timing state machine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JumpState {
    /// Time left on the remembered press (seconds).
    jump_buffer_counter: f32,

    /// Time left to jump after leaving ground (seconds).
    coyote_counter: f32,
}

/// Result of updating jump state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpUpdateResult {
    /// Whether a jump should be executed this tick.
    pub should_jump: bool,

    /// A jump would have fired but was vetoed and discarded.
    pub blocked: bool,
}

impl JumpState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update jump state for this tick.
    ///
    /// # Arguments
    ///
    /// * `config` - Buffer and coyote durations
    /// * `delta_time` - Tick length in seconds
    /// * `jump_pressed` - The jump button went down since the last tick
    /// * `grounded` - Whether the character is standing on walkable ground
    /// * `blocked` - A veto (steep slope) that discards the jump
    pub fn update(
        &mut self,
        config: &JumpConfig,
        delta_time: f32,
        jump_pressed: bool,
        grounded: bool,
        blocked: bool,
    ) -> JumpUpdateResult {
        if jump_pressed {
            self.jump_buffer_counter = config.buffer_time;
        } else {
            self.jump_buffer_counter = (self.jump_buffer_counter - delta_time).max(0.0);
        }

        if grounded {
            self.coyote_counter = config.coyote_time;
        } else {
            self.coyote_counter = (self.coyote_counter - delta_time).max(0.0);
        }

        if self.jump_buffer_counter > 0.0 && self.coyote_counter > 0.0 {
            self.consume();
            return JumpUpdateResult {
                should_jump: !blocked,
                blocked,
            };
        }

        JumpUpdateResult {
            should_jump: false,
            blocked: false,
        }
    }

    /// Drop both counters, e.g. after a ladder jump-off.
    pub fn consume(&mut self) {
        self.jump_buffer_counter = 0.0;
        self.coyote_counter = 0.0;
    }

    /// Check if a press is being remembered.
    pub fn is_buffered(&self) -> bool {
        self.jump_buffer_counter > 0.0
    }

    /// Remaining coyote time.
    pub fn coyote_remaining(&self) -> f32 {
        self.coyote_counter
    }
}

/// Extra acceleration on top of world gravity for variable jump height.
///
/// Rising with jump released pulls down harder to cut the jump short;
/// falling always pulls down harder for a snappy descent.
pub fn gravity_shaping(config: &JumpConfig, vertical_velocity: f32, jump_held: bool, gravity: Vec3) -> Vec3 {
    if vertical_velocity < 0.0 {
        gravity * (config.fall_multiplier - 1.0)
    } else if vertical_velocity > 0.0 && !jump_held {
        gravity * (config.low_jump_multiplier - 1.0)
    } else {
        Vec3::ZERO
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn config() -> JumpConfig {
        JumpConfig::default()
    }

    // Helper to update without a veto
    fn update(state: &mut JumpState, jump: bool, ground: bool) -> JumpUpdateResult {
        state.update(&config(), FRAME, jump, ground, false)
    }

    fn ticks(seconds: f32) -> usize {
        (seconds / FRAME).round() as usize
    }

    #[test]
    fn test_basic_jump() {
        let mut state = JumpState::new();

        let result = update(&mut state, true, true);
        assert!(result.should_jump);
        assert!(!state.is_buffered());
        assert_eq!(state.coyote_remaining(), 0.0);
    }

    #[test]
    fn test_cannot_jump_without_press() {
        let mut state = JumpState::new();
        for _ in 0..30 {
            assert!(!update(&mut state, false, true).should_jump);
        }
    }

    #[test]
    fn test_buffered_press_fires_on_landing() {
        let mut state = JumpState::new();

        // Airborne long enough that coyote time is gone
        for _ in 0..ticks(0.5) {
            update(&mut state, false, false);
        }

        // Press 0.05s before landing
        assert!(!update(&mut state, true, false).should_jump);
        for _ in 1..ticks(0.05) {
            assert!(!update(&mut state, false, false).should_jump);
        }

        let result = update(&mut state, false, true);
        assert!(result.should_jump);
    }

    #[test]
    fn test_stale_buffer_does_not_fire() {
        let mut state = JumpState::new();

        update(&mut state, true, false);
        for _ in 0..ticks(0.3) {
            update(&mut state, false, false);
        }

        assert!(!update(&mut state, false, true).should_jump);
    }

    #[test]
    fn test_coyote_time_allows_late_jump() {
        let mut state = JumpState::new();

        update(&mut state, false, true);
        for _ in 0..ticks(0.05) {
            update(&mut state, false, false);
        }

        assert!(update(&mut state, true, false).should_jump);
    }

    #[test]
    fn test_press_long_after_leaving_ground_does_not_fire() {
        let mut state = JumpState::new();

        update(&mut state, false, true);
        for _ in 0..ticks(0.3) {
            update(&mut state, false, false);
        }

        assert!(!update(&mut state, true, false).should_jump);
    }

    #[test]
    fn test_blocked_jump_is_consumed() {
        let mut state = JumpState::new();

        let result = state.update(&config(), FRAME, true, true, true);
        assert!(!result.should_jump);
        assert!(result.blocked);

        // The press is gone; reaching flat ground does not replay it
        let result = update(&mut state, false, true);
        assert!(!result.should_jump);
    }

    #[test]
    fn test_holding_jump_only_triggers_once() {
        let mut state = JumpState::new();

        assert!(update(&mut state, true, true).should_jump);

        // Still holding, but no new press edges arrive
        for _ in 0..10 {
            assert!(!update(&mut state, false, true).should_jump);
        }
    }

    #[test]
    fn test_gravity_shaping() {
        let config = config();
        let g = Vec3::new(0.0, -10.0, 0.0);

        assert_eq!(gravity_shaping(&config, 3.0, true, g), Vec3::ZERO);

        let cut = gravity_shaping(&config, 3.0, false, g);
        assert!((cut.y + 10.0 * (config.low_jump_multiplier - 1.0)).abs() < 1e-5);

        let fall = gravity_shaping(&config, -1.0, true, g);
        assert!((fall.y + 10.0 * (config.fall_multiplier - 1.0)).abs() < 1e-5);
    }
}
