//! Caboose Game Logic
//!
//! This crate hosts the locomotion controller in a small game loop:
//!
//! - Input sampling from rendered frames into fixed ticks
//! - Level layout with ladders and hazard pads
//! - The fixed-step simulation that plays the controller's collaborators
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Simulation                            │
//! │  ┌──────────┐    ┌────────────────┐    ┌──────────────────┐  │
//! │  │ Input    │───►│ Locomotion     │───►│ Collision world  │  │
//! │  │ sampler  │    │ controller     │    │ (step, queries)  │  │
//! │  └──────────┘    └────────────────┘    └──────────────────┘  │
//! │        ladder volumes, hazard pads ──► commands, events      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod input;
pub mod level;
pub mod simulation;

// Re-export main types
pub use input::{InputSampler, PlayerInput};
pub use level::{HazardPad, Level, SpawnPoint};
pub use simulation::{Simulation, SimulationConfig, SimulationError};

// Re-export physics types for convenience
pub use caboose_physics::{
    CollisionWorld, LocomotionConfig, LocomotionController, LocomotionEvent, LocomotionInput, MovementState, Telemetry,
};
