//! Character locomotion.
//!
//! This module implements a 2.5D platformer controller with:
//!
//! - Ground sensing with surface classification
//! - Steep slope sliding with a short grace window
//! - Buffered and coyote jumps with gravity shaping
//! - Crouching with a headroom check
//! - Stacked slow effects
//! - Ladder climbing
//!
//! # Design
//!
//! Movement is driven by the [`LocomotionController`], which reads and writes
//! the body only through a [`PhysicsQueryPort`]. Each piece (sensor, slope
//! model, jump timing, crouch, ladder) is a plain struct that can be tested
//! on its own.
//!
//! All movement runs on a fixed tick, so the same inputs produce the same
//! outputs.

mod config;
mod controller;
mod crouch;
mod events;
mod ground;
mod jump;
mod ladder;
mod port;
mod slope;
mod slow;
mod state;

pub use config::{
    ConfigError, CrouchConfig, GroundConfig, JumpConfig, LadderConfig, LocomotionConfig, MovementTuning, SlopeConfig,
};
pub use controller::{ControllerError, LocomotionController, Telemetry};
pub use crouch::{CapsuleProfile, CrouchController, CrouchGeometry};
pub use events::{EventQueue, LocomotionEvent};
pub use ground::{world_up, GroundContact, GroundSensor, SurfaceKind};
pub use jump::{gravity_shaping, JumpState, JumpUpdateResult};
pub use ladder::{
    AttachMode, AttachOutcome, ClimbStep, DetachReason, Ladder, LadderClimber, LadderHandle, LadderPhase, LadderSet,
    UP_INPUT_ATTACH_THRESHOLD,
};
pub use port::{BodyState, PhysicsQueryPort, PortError};
pub use slope::{SlopeOutput, SlopeSlideModel, SlopeState};
pub use slow::{SlowEffect, SlowEffectStack, SlowId, MIN_SLOW_MULTIPLIER};
pub use state::{resolve_state, LocomotionInput, MovementState, StateInputs};
