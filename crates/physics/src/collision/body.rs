//! Kinematic character bodies hosted by the collision world.

use glam::{BVec3, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::flags::LayerMask;
use super::trace::ColliderHandle;

/// Handle to a body stored in a [`CollisionWorld`](super::CollisionWorld).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// Capsule geometry of a body, relative to the body origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapsuleShape {
    /// Cap radius.
    pub radius: f32,
    /// Total height.
    pub height: f32,
    /// Capsule center relative to the body origin.
    pub center: Vec3,
}

impl CapsuleShape {
    /// Offset from the body origin to the capsule's bottom-center.
    pub fn bottom_offset(&self) -> Vec3 {
        self.center - Vec3::new(0.0, self.height / 2.0, 0.0)
    }
}

/// Axis locks applied while integrating a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyConstraints {
    /// World axes along which the body may not translate.
    pub freeze_position: BVec3,
    /// World axes about which the body may not rotate.
    pub freeze_rotation: BVec3,
}

impl Default for BodyConstraints {
    fn default() -> Self {
        Self::upright()
    }
}

impl BodyConstraints {
    /// No locks at all.
    pub const NONE: Self = Self {
        freeze_position: BVec3::FALSE,
        freeze_rotation: BVec3::FALSE,
    };

    /// Upright side-scrolling character: no tilting, no drift along depth (Z).
    pub fn upright() -> Self {
        Self {
            freeze_position: BVec3::new(false, false, true),
            freeze_rotation: BVec3::new(true, false, true),
        }
    }

    /// Union of two constraint sets.
    pub fn union(self, other: Self) -> Self {
        Self {
            freeze_position: self.freeze_position | other.freeze_position,
            freeze_rotation: self.freeze_rotation | other.freeze_rotation,
        }
    }

    /// Zero the velocity components along frozen axes.
    pub fn apply_to_velocity(&self, velocity: Vec3) -> Vec3 {
        Vec3::select(self.freeze_position, Vec3::ZERO, velocity)
    }
}

/// A character body: a vertical capsule moved by velocity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidBody {
    /// Body origin in world space.
    pub position: Vec3,
    /// Orientation.
    pub rotation: Quat,
    /// Linear velocity (meters/second).
    pub velocity: Vec3,
    /// Collision capsule.
    pub capsule: CapsuleShape,
    /// Whether world gravity is applied while integrating.
    pub gravity_enabled: bool,
    /// Axis locks.
    pub constraints: BodyConstraints,
    /// Layers this body collides with while moving.
    pub collision_mask: LayerMask,
    /// Colliders this body currently passes through.
    pub ignored: Vec<ColliderHandle>,
}

impl RigidBody {
    /// Create a body at `position` with the given capsule.
    pub fn new(position: Vec3, capsule: CapsuleShape) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            capsule,
            gravity_enabled: true,
            constraints: BodyConstraints::upright(),
            collision_mask: LayerMask::MASK_BODY_SOLID,
            ignored: Vec::new(),
        }
    }

    /// World position of the capsule bottom-center.
    pub fn bottom(&self) -> Vec3 {
        self.position + self.capsule.bottom_offset()
    }

    /// The body's local up axis in world space.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capsule() -> CapsuleShape {
        CapsuleShape {
            radius: 0.3,
            height: 1.4,
            center: Vec3::new(0.0, 0.7, 0.0),
        }
    }

    #[test]
    fn test_bottom_follows_center() {
        let body = RigidBody::new(Vec3::new(2.0, 1.0, 0.0), capsule());
        assert_eq!(body.bottom(), Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn test_frozen_axes_drop_velocity() {
        let constraints = BodyConstraints::upright();
        let v = constraints.apply_to_velocity(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(v, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_union_keeps_all_locks() {
        let a = BodyConstraints {
            freeze_position: BVec3::new(true, false, false),
            freeze_rotation: BVec3::FALSE,
        };
        let merged = a.union(BodyConstraints::upright());
        assert_eq!(merged.freeze_position, BVec3::new(true, false, true));
        assert_eq!(merged.freeze_rotation, BVec3::new(true, false, true));
    }
}
