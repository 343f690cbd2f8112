//! Locomotion tuning.
//!
//! All locomotion parameters are grouped here for easy tuning. Values use
//! metric units (meters, seconds) and angles in degrees.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collision::LayerMask;

/// A tuning value outside its allowed range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Value must be strictly positive and finite.
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive {
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: f32,
    },

    /// Value must lie in an inclusive range.
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: f32,
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },

    /// The ground mask selects nothing, so the character could never stand.
    #[error("ground mask is empty")]
    EmptyGroundMask,

    /// The right axis must be a horizontal, non-zero direction.
    #[error("right axis {0} is not a horizontal direction")]
    InvalidRightAxis(Vec3),
}

/// Full locomotion configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Speeds and axes.
    pub movement: MovementTuning,
    /// Ground sensing.
    pub ground: GroundConfig,
    /// Steep slope handling.
    pub slope: SlopeConfig,
    /// Jump timing and gravity shaping.
    pub jump: JumpConfig,
    /// Crouch geometry and timing.
    pub crouch: CrouchConfig,
    /// Ladder climbing.
    pub ladder: LadderConfig,
}

/// Horizontal movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    /// Standing move speed (meters/second).
    pub move_speed: f32,

    /// Direction "right" means for horizontal input and facing.
    pub right_axis: Vec3,

    /// Input magnitude below which the character counts as idle.
    pub input_dead_zone: f32,

    /// Ground normals flatter than this (degrees from up) count as walls for
    /// input projection.
    pub wall_angle: f32,

    /// Extra reach of the wall probe beyond this tick's travel (meters).
    pub wall_probe_skin: f32,

    /// Longest tick accepted; larger steps are clamped (seconds).
    pub max_delta_time: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            right_axis: Vec3::X,
            input_dead_zone: 0.01,
            wall_angle: 80.0,
            wall_probe_skin: 0.05,
            max_delta_time: 0.066,
        }
    }
}

/// Ground sensing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    /// Layers that count as ground.
    pub ground_mask: LayerMask,

    /// Probe sphere radius as a fraction of the capsule radius.
    pub sphere_radius_multiplier: f32,

    /// How far above the capsule bottom the probe starts (meters).
    pub seam_epsilon: f32,

    /// How far below the capsule bottom ground is still detected (meters).
    pub cast_distance: f32,

    /// Try a sphere overlap at the feet when the cast misses.
    pub fallback_overlap: bool,

    /// Fallback sphere radius as a fraction of the capsule radius.
    pub fallback_radius_multiplier: f32,

    /// Maximum walkable slope (degrees from up).
    pub max_walkable_slope: f32,

    /// Upward speed above which the character is rising, not grounded.
    pub rising_speed_threshold: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            ground_mask: LayerMask::GROUND,
            sphere_radius_multiplier: 0.9,
            seam_epsilon: 0.02,
            cast_distance: 0.2,
            fallback_overlap: true,
            fallback_radius_multiplier: 0.5,
            max_walkable_slope: 50.0,
            rising_speed_threshold: 0.1,
        }
    }
}

/// Steep slope handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeConfig {
    /// Seconds on a steep slope before slipping is forced.
    pub grace_time: f32,

    /// Base rate the uphill multiplier drops while pushing uphill (per second).
    pub uphill_reduction_rate: f32,

    /// Rate the uphill multiplier recovers (per second).
    pub uphill_recovery_rate: f32,

    /// Downhill acceleration on a vertical wall (meters/second²).
    pub slide_acceleration: f32,

    /// Slide strength during the grace window, before slipping.
    pub grace_slide_strength: f32,

    /// Minimum downward speed while slipping (meters/second).
    pub slip_fall_speed: f32,
}

impl Default for SlopeConfig {
    fn default() -> Self {
        Self {
            grace_time: 0.35,
            uphill_reduction_rate: 1.5,
            uphill_recovery_rate: 3.0,
            slide_acceleration: 12.0,
            grace_slide_strength: 0.35,
            slip_fall_speed: 2.0,
        }
    }
}

/// Jump timing and gravity shaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    /// Launch speed (meters/second).
    pub jump_force: f32,

    /// Jump force scale while crouching.
    pub crouch_jump_multiplier: f32,

    /// How long an early jump press is remembered (seconds).
    pub buffer_time: f32,

    /// How long after leaving ground a jump is still honored (seconds).
    pub coyote_time: f32,

    /// Gravity scale while falling.
    pub fall_multiplier: f32,

    /// Gravity scale while rising with jump released.
    pub low_jump_multiplier: f32,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            jump_force: 5.0,
            crouch_jump_multiplier: 0.7,
            buffer_time: 0.15,
            coyote_time: 0.1,
            fall_multiplier: 2.5,
            low_jump_multiplier: 2.0,
        }
    }
}

/// Crouch geometry and timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrouchConfig {
    /// Crouched height as a fraction of standing height.
    pub crouch_height_ratio: f32,

    /// Crouched speed as a fraction of standing speed.
    pub crouch_speed_ratio: f32,

    /// Crouched visual Y scale.
    pub crouch_visual_scale: f32,

    /// Seconds to reach the crouched profile.
    pub crouch_down_duration: f32,

    /// Seconds to reach the standing profile.
    pub stand_up_duration: f32,

    /// Seconds speed stays crouched after standing is granted.
    pub stand_speed_hold_time: f32,

    /// Shrinks the headroom probe so touching walls do not block standing.
    pub clearance_skin: f32,
}

impl Default for CrouchConfig {
    fn default() -> Self {
        Self {
            crouch_height_ratio: 0.6,
            crouch_speed_ratio: 0.5,
            crouch_visual_scale: 0.6,
            crouch_down_duration: 0.2,
            stand_up_duration: 0.2,
            stand_speed_hold_time: 0.3,
            clearance_skin: 0.02,
        }
    }
}

/// Ladder climbing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LadderConfig {
    /// Climb speed along the ladder axis (meters/second).
    pub climb_speed: f32,

    /// Position smoothing rate toward the snap target (1/second).
    pub snap_speed: f32,

    /// Orientation smoothing rate (1/second).
    pub rotation_speed: f32,

    /// Gap kept between the capsule and the ladder face (meters).
    pub padding: f32,

    /// Seconds after attaching during which distance and push-away detaches
    /// are suppressed.
    pub attach_grace_time: f32,

    /// Seconds after detaching before the same character may attach again.
    pub reattach_cooldown: f32,

    /// Horizontal input needed to push off the ladder.
    pub push_away_threshold: f32,

    /// Horizontal speed of a jump-off (meters/second).
    pub jump_off_horizontal: f32,

    /// Vertical speed of a jump-off (meters/second).
    pub jump_off_vertical: f32,

    /// Distance below the ladder top at which climbing up steps off (meters).
    pub top_exit_distance: f32,

    /// How far past the ladder face the top step-off lands (meters).
    pub top_step_forward: f32,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            climb_speed: 2.5,
            snap_speed: 12.0,
            rotation_speed: 10.0,
            padding: 0.05,
            attach_grace_time: 0.2,
            reattach_cooldown: 0.3,
            push_away_threshold: 0.5,
            jump_off_horizontal: 3.0,
            jump_off_vertical: 4.5,
            top_exit_distance: 0.3,
            top_step_forward: 0.4,
        }
    }
}

impl LocomotionConfig {
    /// Snappy platformer tuning: quick jumps, generous timing windows.
    pub fn platformer() -> Self {
        Self {
            movement: MovementTuning {
                move_speed: 4.5,
                ..Default::default()
            },
            jump: JumpConfig {
                jump_force: 6.5,
                buffer_time: 0.2,
                coyote_time: 0.15,
                fall_multiplier: 3.0,
                ..Default::default()
            },
            ladder: LadderConfig {
                climb_speed: 3.5,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Heavy character: slow, short jumps, little forgiveness on slopes.
    pub fn heavy() -> Self {
        Self {
            movement: MovementTuning {
                move_speed: 2.2,
                ..Default::default()
            },
            ground: GroundConfig {
                max_walkable_slope: 40.0,
                ..Default::default()
            },
            slope: SlopeConfig {
                grace_time: 0.2,
                slide_acceleration: 16.0,
                ..Default::default()
            },
            jump: JumpConfig {
                jump_force: 4.0,
                buffer_time: 0.1,
                coyote_time: 0.06,
                ..Default::default()
            },
            crouch: CrouchConfig {
                crouch_down_duration: 0.3,
                stand_up_duration: 0.35,
                stand_speed_hold_time: 0.45,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Crouched move speed.
    pub fn crouch_speed(&self) -> f32 {
        self.movement.move_speed * self.crouch.crouch_speed_ratio
    }

    /// Check every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.movement;
        positive("movement.move_speed", m.move_speed)?;
        positive("movement.max_delta_time", m.max_delta_time)?;
        in_range("movement.input_dead_zone", m.input_dead_zone, 0.0, 1.0)?;
        in_range("movement.wall_angle", m.wall_angle, 0.0, 90.0)?;
        in_range("movement.wall_probe_skin", m.wall_probe_skin, 0.0, 1.0)?;
        let flat_right = Vec3::new(m.right_axis.x, 0.0, m.right_axis.z);
        if !m.right_axis.is_finite() || flat_right.length_squared() < 1e-6 {
            return Err(ConfigError::InvalidRightAxis(m.right_axis));
        }

        let g = &self.ground;
        if g.ground_mask == LayerMask::EMPTY {
            return Err(ConfigError::EmptyGroundMask);
        }
        positive("ground.sphere_radius_multiplier", g.sphere_radius_multiplier)?;
        positive("ground.cast_distance", g.cast_distance)?;
        in_range("ground.seam_epsilon", g.seam_epsilon, 0.0, 0.5)?;
        positive("ground.fallback_radius_multiplier", g.fallback_radius_multiplier)?;
        in_range("ground.max_walkable_slope", g.max_walkable_slope, 0.0, 89.0)?;
        in_range("ground.rising_speed_threshold", g.rising_speed_threshold, 0.0, 10.0)?;

        let s = &self.slope;
        positive("slope.grace_time", s.grace_time)?;
        positive("slope.uphill_reduction_rate", s.uphill_reduction_rate)?;
        positive("slope.uphill_recovery_rate", s.uphill_recovery_rate)?;
        in_range("slope.slide_acceleration", s.slide_acceleration, 0.0, 1000.0)?;
        in_range("slope.grace_slide_strength", s.grace_slide_strength, 0.0, 1.0)?;
        positive("slope.slip_fall_speed", s.slip_fall_speed)?;

        let j = &self.jump;
        positive("jump.jump_force", j.jump_force)?;
        positive("jump.crouch_jump_multiplier", j.crouch_jump_multiplier)?;
        positive("jump.buffer_time", j.buffer_time)?;
        positive("jump.coyote_time", j.coyote_time)?;
        in_range("jump.fall_multiplier", j.fall_multiplier, 1.0, 10.0)?;
        in_range("jump.low_jump_multiplier", j.low_jump_multiplier, 1.0, 10.0)?;

        let c = &self.crouch;
        in_range("crouch.crouch_height_ratio", c.crouch_height_ratio, 0.1, 1.0)?;
        in_range("crouch.crouch_speed_ratio", c.crouch_speed_ratio, 0.0, 1.0)?;
        positive("crouch.crouch_visual_scale", c.crouch_visual_scale)?;
        positive("crouch.crouch_down_duration", c.crouch_down_duration)?;
        positive("crouch.stand_up_duration", c.stand_up_duration)?;
        in_range("crouch.stand_speed_hold_time", c.stand_speed_hold_time, 0.0, 10.0)?;
        in_range("crouch.clearance_skin", c.clearance_skin, 0.0, 0.5)?;

        let l = &self.ladder;
        positive("ladder.climb_speed", l.climb_speed)?;
        positive("ladder.snap_speed", l.snap_speed)?;
        positive("ladder.rotation_speed", l.rotation_speed)?;
        in_range("ladder.padding", l.padding, 0.0, 1.0)?;
        in_range("ladder.attach_grace_time", l.attach_grace_time, 0.0, 5.0)?;
        in_range("ladder.reattach_cooldown", l.reattach_cooldown, 0.0, 5.0)?;
        in_range("ladder.push_away_threshold", l.push_away_threshold, 0.0, 1.0)?;
        in_range("ladder.jump_off_horizontal", l.jump_off_horizontal, 0.0, 100.0)?;
        in_range("ladder.jump_off_vertical", l.jump_off_vertical, 0.0, 100.0)?;
        in_range("ladder.top_exit_distance", l.top_exit_distance, 0.0, 5.0)?;
        in_range("ladder.top_step_forward", l.top_step_forward, 0.0, 5.0)?;

        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    // NaN fails both comparisons and lands here too
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert_eq!(LocomotionConfig::default().validate(), Ok(()));
        assert_eq!(LocomotionConfig::platformer().validate(), Ok(()));
        assert_eq!(LocomotionConfig::heavy().validate(), Ok(()));
    }

    #[test]
    fn test_crouch_speed_is_half_move_speed() {
        let config = LocomotionConfig::default();
        assert_eq!(config.crouch_speed(), 1.5);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = LocomotionConfig::default();
        config.jump.coyote_time = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { field: "jump.coyote_time", .. })
        ));

        let mut config = LocomotionConfig::default();
        config.ground.max_walkable_slope = f32::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::OutOfRange { .. })));

        let mut config = LocomotionConfig::default();
        config.ground.ground_mask = LayerMask::EMPTY;
        assert_eq!(config.validate(), Err(ConfigError::EmptyGroundMask));

        let mut config = LocomotionConfig::default();
        config.movement.right_axis = Vec3::Y;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRightAxis(_))));
    }
}
