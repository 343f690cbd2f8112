//! Collision detection and character body hosting.
//!
//! This module provides world collision queries using capsule, sphere and box
//! shapes, plus a small kinematic integrator for character bodies.
//!
//! # Key Types
//!
//! - [`CollisionWorld`]: Static geometry, hosted bodies, and queries
//! - [`RigidBody`]: A capsule body moved by velocity
//! - [`TraceResult`] / [`CastHit`]: Output from sweeps and casts
//! - [`LayerMask`]: Which colliders a query may hit
//!
//! Capsules are positioned by their bottom-center. Sphere casts and traces
//! are resolved with a binary search on overlap followed by a parry3d contact
//! query for the surface normal.

mod body;
mod flags;
mod slide_move;
mod trace;
mod world;

pub use body::{BodyConstraints, BodyHandle, CapsuleShape, RigidBody};
pub use flags::{LayerMask, SurfaceFlags};
pub use slide_move::{clip_velocity, slide_move, OVERBOUNCE};
pub use trace::{CastHit, ColliderHandle, QueryFilter, TraceResult, TraceShape};
pub use world::{Collider, CollisionWorld, DEFAULT_GRAVITY};
