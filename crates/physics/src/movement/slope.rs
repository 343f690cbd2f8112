//! Steep slope handling.
//!
//! On a slope steeper than the walkable limit the character first gets a grace
//! window: pushing uphill gets progressively weaker and a gentle downhill slide
//! builds up. Once the grace window runs out, or uphill pushing has been worn
//! down to nothing, the character is slipping and loses control.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::config::SlopeConfig;
use super::ground::GroundContact;

/// Uphill multiplier at or below which slipping is forced.
const SLIP_MULTIPLIER: f32 = 0.05;

/// Steepest slopes drain the uphill multiplier this many times faster.
const MAX_REDUCTION_SCALE: f32 = 6.0;

/// Persistent slope bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlopeState {
    /// Seconds spent continuously on a steep slope.
    pub steep_slope_timer: f32,
    /// Scale applied to uphill movement, in [0, 1].
    pub uphill_speed_multiplier: f32,
    /// Downhill velocity accumulated while on the current steep slope.
    pub slide_velocity: Vec3,
}

impl Default for SlopeState {
    fn default() -> Self {
        Self {
            steep_slope_timer: 0.0,
            uphill_speed_multiplier: 1.0,
            slide_velocity: Vec3::ZERO,
        }
    }
}

/// Result of one slope update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopeOutput {
    /// Desired horizontal velocity after attenuation.
    pub adjusted_horizontal: Vec3,
    /// Accumulated downhill slide velocity.
    pub slide_velocity: Vec3,
    /// Standing on a slope steeper than the walkable limit.
    pub is_steep: bool,
    /// Control is lost and the character falls.
    pub is_slipping: bool,
    /// Jumping is not allowed this tick.
    pub jump_blocked: bool,
}

/// Uphill attenuation, downhill slide and slip detection.
#[derive(Debug, Clone)]
pub struct SlopeSlideModel {
    config: SlopeConfig,
    max_walkable: f32,
    state: SlopeState,
}

impl SlopeSlideModel {
    pub fn new(config: SlopeConfig, max_walkable: f32) -> Self {
        Self {
            config,
            max_walkable,
            state: SlopeState::default(),
        }
    }

    pub fn state(&self) -> &SlopeState {
        &self.state
    }

    /// Advance one tick.
    ///
    /// `contact` is the sensed ground, `None` when airborne.
    pub fn update(
        &mut self,
        delta_time: f32,
        contact: Option<&GroundContact>,
        desired_horizontal: Vec3,
        gravity: Vec3,
    ) -> SlopeOutput {
        let Some(contact) = contact.filter(|c| c.angle > self.max_walkable) else {
            self.recover(delta_time);
            self.state.steep_slope_timer = 0.0;
            self.state.slide_velocity = Vec3::ZERO;
            return SlopeOutput {
                adjusted_horizontal: desired_horizontal,
                slide_velocity: Vec3::ZERO,
                is_steep: false,
                is_slipping: false,
                jump_blocked: false,
            };
        };

        self.state.steep_slope_timer += delta_time;

        let normal = contact.normal;
        let downhill = (gravity - normal * gravity.dot(normal)).normalize_or_zero();
        let steepness = inverse_lerp(self.max_walkable, 90.0, contact.angle);

        let pushing_uphill = desired_horizontal.dot(-downhill) > 0.0;
        if pushing_uphill {
            let rate = self.config.uphill_reduction_rate * lerp(1.0, MAX_REDUCTION_SCALE, steepness);
            self.state.uphill_speed_multiplier = (self.state.uphill_speed_multiplier - rate * delta_time).max(0.0);
        } else {
            self.recover(delta_time);
        }

        let is_slipping = self.state.steep_slope_timer >= self.config.grace_time
            || self.state.uphill_speed_multiplier <= SLIP_MULTIPLIER;

        let strength = if is_slipping {
            1.0
        } else {
            self.config.grace_slide_strength
        };
        self.state.slide_velocity += downhill * self.config.slide_acceleration * steepness * strength * delta_time;

        let adjusted_horizontal = if is_slipping {
            Vec3::ZERO
        } else if pushing_uphill {
            desired_horizontal * self.state.uphill_speed_multiplier
        } else {
            desired_horizontal
        };

        SlopeOutput {
            adjusted_horizontal,
            slide_velocity: self.state.slide_velocity,
            is_steep: true,
            is_slipping,
            jump_blocked: true,
        }
    }

    /// Forget everything, e.g. when grabbing a ladder.
    pub fn reset(&mut self) {
        self.state = SlopeState::default();
    }

    fn recover(&mut self, delta_time: f32) {
        self.state.uphill_speed_multiplier =
            (self.state.uphill_speed_multiplier + self.config.uphill_recovery_rate * delta_time).min(1.0);
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() < f32::EPSILON {
        0.0
    } else {
        ((value - a) / (b - a)).clamp(0.0, 1.0)
    }
}
