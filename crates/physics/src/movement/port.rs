//! The physics surface the locomotion controller drives.
//!
//! The controller never owns a body. It reads a [`BodyState`] snapshot each
//! tick, queries geometry, and writes results back through this trait.
//! [`CollisionWorld`] is the in-crate backend.

use glam::{Quat, Vec3};
use thiserror::Error;

use crate::collision::{
    BodyConstraints, BodyHandle, CapsuleShape, CastHit, ColliderHandle, CollisionWorld, QueryFilter,
};

/// A write through the port targeted something that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PortError {
    /// The body handle is dead.
    #[error("body {0:?} does not exist")]
    MissingBody(BodyHandle),

    /// The collider handle is dead.
    #[error("collider {0:?} does not exist")]
    MissingCollider(ColliderHandle),
}

/// Snapshot of a body taken at the start of a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyState {
    /// Body origin.
    pub position: Vec3,
    /// Orientation.
    pub rotation: Quat,
    /// Linear velocity.
    pub velocity: Vec3,
    /// Collision capsule.
    pub capsule: CapsuleShape,
    /// Whether gravity is applied.
    pub gravity_enabled: bool,
    /// Axis locks.
    pub constraints: BodyConstraints,
}

impl BodyState {
    /// World position of the capsule bottom-center.
    pub fn bottom(&self) -> Vec3 {
        self.position + self.capsule.bottom_offset()
    }

    /// The body's up axis in world space.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

/// Geometry queries and body access needed by the locomotion controller.
pub trait PhysicsQueryPort {
    /// World gravity.
    fn gravity(&self) -> Vec3;

    /// First hit of a sphere swept from `origin` along `direction`.
    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        filter: QueryFilter<'_>,
    ) -> Option<CastHit>;

    /// Whether a sphere overlaps anything.
    fn overlap_sphere(&self, center: Vec3, radius: f32, filter: QueryFilter<'_>) -> bool;

    /// Whether a capsule with segment `a`..`b` overlaps anything.
    fn overlap_capsule(&self, a: Vec3, b: Vec3, radius: f32, filter: QueryFilter<'_>) -> bool;

    /// Whether a collider exists and takes part in queries.
    fn collider_enabled(&self, collider: ColliderHandle) -> bool;

    /// Snapshot a body, `None` if it is gone.
    fn body(&self, body: BodyHandle) -> Option<BodyState>;

    /// Replace a body's velocity.
    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec3) -> Result<(), PortError>;

    /// Teleport a body.
    fn set_position(&mut self, body: BodyHandle, position: Vec3) -> Result<(), PortError>;

    /// Replace a body's orientation.
    fn set_rotation(&mut self, body: BodyHandle, rotation: Quat) -> Result<(), PortError>;

    /// Toggle gravity for a body.
    fn set_gravity_enabled(&mut self, body: BodyHandle, enabled: bool) -> Result<(), PortError>;

    /// Replace a body's axis locks.
    fn set_constraints(&mut self, body: BodyHandle, constraints: BodyConstraints) -> Result<(), PortError>;

    /// Let a body pass through a collider, or stop doing so.
    fn set_collision_ignored(
        &mut self,
        body: BodyHandle,
        collider: ColliderHandle,
        ignored: bool,
    ) -> Result<(), PortError>;

    /// Replace a body's capsule.
    fn set_capsule(&mut self, body: BodyHandle, capsule: CapsuleShape) -> Result<(), PortError>;
}

impl PhysicsQueryPort for CollisionWorld {
    fn gravity(&self) -> Vec3 {
        CollisionWorld::gravity(self)
    }

    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        filter: QueryFilter<'_>,
    ) -> Option<CastHit> {
        CollisionWorld::sphere_cast(self, origin, radius, direction, max_distance, filter)
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, filter: QueryFilter<'_>) -> bool {
        CollisionWorld::overlap_sphere(self, center, radius, filter)
    }

    fn overlap_capsule(&self, a: Vec3, b: Vec3, radius: f32, filter: QueryFilter<'_>) -> bool {
        CollisionWorld::overlap_capsule(self, a, b, radius, filter)
    }

    fn collider_enabled(&self, collider: ColliderHandle) -> bool {
        self.collider(collider).is_some_and(|c| c.enabled)
    }

    fn body(&self, body: BodyHandle) -> Option<BodyState> {
        CollisionWorld::body(self, body).map(|b| BodyState {
            position: b.position,
            rotation: b.rotation,
            velocity: b.velocity,
            capsule: b.capsule,
            gravity_enabled: b.gravity_enabled,
            constraints: b.constraints,
        })
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec3) -> Result<(), PortError> {
        self.body_mut(body).ok_or(PortError::MissingBody(body))?.velocity = velocity;
        Ok(())
    }

    fn set_position(&mut self, body: BodyHandle, position: Vec3) -> Result<(), PortError> {
        self.body_mut(body).ok_or(PortError::MissingBody(body))?.position = position;
        Ok(())
    }

    fn set_rotation(&mut self, body: BodyHandle, rotation: Quat) -> Result<(), PortError> {
        self.body_mut(body).ok_or(PortError::MissingBody(body))?.rotation = rotation.normalize();
        Ok(())
    }

    fn set_gravity_enabled(&mut self, body: BodyHandle, enabled: bool) -> Result<(), PortError> {
        self.body_mut(body).ok_or(PortError::MissingBody(body))?.gravity_enabled = enabled;
        Ok(())
    }

    fn set_constraints(&mut self, body: BodyHandle, constraints: BodyConstraints) -> Result<(), PortError> {
        self.body_mut(body).ok_or(PortError::MissingBody(body))?.constraints = constraints;
        Ok(())
    }

    fn set_collision_ignored(
        &mut self,
        body: BodyHandle,
        collider: ColliderHandle,
        ignored: bool,
    ) -> Result<(), PortError> {
        if self.collider(collider).is_none() {
            return Err(PortError::MissingCollider(collider));
        }
        let target = self.body_mut(body).ok_or(PortError::MissingBody(body))?;
        if ignored {
            if !target.ignored.contains(&collider) {
                target.ignored.push(collider);
            }
        } else {
            target.ignored.retain(|&c| c != collider);
        }
        Ok(())
    }

    fn set_capsule(&mut self, body: BodyHandle, capsule: CapsuleShape) -> Result<(), PortError> {
        self.body_mut(body).ok_or(PortError::MissingBody(body))?.capsule = capsule;
        Ok(())
    }
}
