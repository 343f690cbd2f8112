//! Caboose Physics
//!
//! A fixed-timestep character locomotion library for 2.5D platformers.
//!
//! # Architecture
//!
//! The crate is split into two main systems:
//!
//! - **Collision**: Casts capsules/spheres through the world, returns hit information
//! - **Movement**: Uses those queries to implement character locomotion
//!
//! The movement side only talks to collision through
//! [`movement::PhysicsQueryPort`], which [`CollisionWorld`] implements. Any
//! other backend can drive the controller by implementing the same trait.
//!
//! # Conventions
//!
//! - World up is opposite gravity, +Y by default
//! - Movement happens along a single right axis, +X by default
//! - A body's position is at its feet

pub mod collision;
pub mod movement;

// Re-export commonly used types
pub use collision::{
    BodyHandle, CapsuleShape, ColliderHandle, CollisionWorld, LayerMask, QueryFilter, RigidBody, SurfaceFlags,
    TraceResult, TraceShape,
};
pub use movement::{
    LadderHandle, LadderSet, LocomotionConfig, LocomotionController, LocomotionEvent, LocomotionInput,
    MovementState, PhysicsQueryPort, Telemetry,
};
