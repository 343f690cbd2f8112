//! Ground sensing.
//!
//! Once per tick a sphere slightly narrower than the capsule is cast down from
//! just above the capsule bottom. A hit inside the cast distance is ground; its
//! normal gives the slope angle and its collider gives the surface material.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collision::{ColliderHandle, QueryFilter, SurfaceFlags};

use super::config::GroundConfig;
use super::port::{BodyState, PhysicsQueryPort};

/// Footstep material of the ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SurfaceKind {
    /// Baseline for unclassified surfaces.
    #[default]
    Wood,
    Metal,
    Stone,
    Gravel,
    Glass,
}

impl SurfaceKind {
    /// Classify surface flags. Unclassified surfaces are wood.
    pub fn from_flags(flags: SurfaceFlags) -> Self {
        if flags.contains(SurfaceFlags::METAL) {
            Self::Metal
        } else if flags.contains(SurfaceFlags::STONE) {
            Self::Stone
        } else if flags.contains(SurfaceFlags::GRAVEL) {
            Self::Gravel
        } else if flags.contains(SurfaceFlags::GLASS) {
            Self::Glass
        } else {
            Self::Wood
        }
    }
}

/// What the character is standing on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundContact {
    /// Surface normal.
    pub normal: Vec3,
    /// Angle between the normal and world up (degrees).
    pub angle: f32,
    /// Steeper than the walkable limit.
    pub is_steep: bool,
    /// Footstep material.
    pub surface: SurfaceKind,
    /// Contact point.
    pub point: Vec3,
    /// Gap between the capsule bottom and the ground (meters).
    pub distance: f32,
    /// Collider stood on, if the backend reported one.
    pub collider: Option<ColliderHandle>,
}

impl GroundContact {
    /// The placeholder contact published while airborne.
    pub fn airborne(body_up: Vec3) -> Self {
        Self {
            normal: body_up,
            angle: 0.0,
            is_steep: false,
            surface: SurfaceKind::Wood,
            point: Vec3::ZERO,
            distance: f32::INFINITY,
            collider: None,
        }
    }
}

/// Downward probe classifying grounded and airborne.
#[derive(Debug, Clone)]
pub struct GroundSensor {
    config: GroundConfig,
}

impl GroundSensor {
    pub fn new(config: GroundConfig) -> Self {
        Self { config }
    }

    /// Layers treated as ground.
    pub fn filter<'a>(&self, exclude: &'a [ColliderHandle]) -> QueryFilter<'a> {
        QueryFilter::new(self.config.ground_mask).excluding(exclude)
    }

    /// Probe below the body. `None` means airborne.
    pub fn sense(
        &self,
        port: &dyn PhysicsQueryPort,
        body: &BodyState,
        exclude: &[ColliderHandle],
    ) -> Option<GroundContact> {
        let up = world_up(port.gravity());
        let bottom = body.bottom();
        let radius = body.capsule.radius * self.config.sphere_radius_multiplier;
        let epsilon = self.config.seam_epsilon;
        let filter = self.filter(exclude);

        // Lowest point of the probe starts epsilon above the feet
        let origin = bottom + up * (epsilon + radius);
        let reach = self.config.cast_distance + epsilon;

        if let Some(hit) = port.sphere_cast(origin, radius, -up, reach, filter) {
            let angle = hit.normal.angle_between(up).to_degrees();
            return Some(GroundContact {
                normal: hit.normal,
                angle,
                is_steep: angle > self.config.max_walkable_slope,
                surface: SurfaceKind::from_flags(hit.surface),
                point: hit.point,
                distance: (hit.distance - epsilon).max(0.0),
                collider: Some(hit.collider),
            });
        }

        if self.config.fallback_overlap {
            let fallback_radius = body.capsule.radius * self.config.fallback_radius_multiplier;
            if port.overlap_sphere(bottom, fallback_radius, filter) {
                return Some(GroundContact {
                    normal: up,
                    angle: 0.0,
                    is_steep: false,
                    surface: SurfaceKind::Wood,
                    point: bottom,
                    distance: 0.0,
                    collider: None,
                });
            }
        }

        None
    }
}

/// Unit vector opposite gravity, +Y when gravity is zero.
pub fn world_up(gravity: Vec3) -> Vec3 {
    (-gravity).try_normalize().unwrap_or(Vec3::Y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CapsuleShape, CollisionWorld, LayerMask, RigidBody};
    use glam::Quat;

    fn capsule() -> CapsuleShape {
        CapsuleShape {
            radius: 0.3,
            height: 1.4,
            center: Vec3::new(0.0, 0.7, 0.0),
        }
    }

    fn body_at(world: &mut CollisionWorld, position: Vec3) -> BodyState {
        let handle = world.add_body(RigidBody::new(position, capsule()));
        PhysicsQueryPort::body(world, handle).expect("body")
    }

    fn sensor() -> GroundSensor {
        GroundSensor::new(GroundConfig::default())
    }

    #[test]
    fn test_flat_floor_is_walkable_wood() {
        let mut world = CollisionWorld::new();
        world.add_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(10.0, 0.5, 2.0), LayerMask::GROUND);
        let body = body_at(&mut world, Vec3::new(0.0, 0.01, 0.0));

        let contact = sensor().sense(&world, &body, &[]).expect("grounded");
        assert!(contact.angle < 0.5);
        assert!(!contact.is_steep);
        assert_eq!(contact.surface, SurfaceKind::Wood);
    }

    #[test]
    fn test_surface_flags_classify_ground() {
        let mut world = CollisionWorld::new();
        let floor = world.add_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(10.0, 0.5, 2.0), LayerMask::GROUND);
        world.set_surface(floor, SurfaceFlags::METAL);
        let body = body_at(&mut world, Vec3::new(0.0, 0.01, 0.0));

        let contact = sensor().sense(&world, &body, &[]).expect("grounded");
        assert_eq!(contact.surface, SurfaceKind::Metal);
    }

    #[test]
    fn test_high_above_ground_is_airborne() {
        let mut world = CollisionWorld::new();
        world.add_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(10.0, 0.5, 2.0), LayerMask::GROUND);
        let body = body_at(&mut world, Vec3::new(0.0, 1.0, 0.0));

        assert!(sensor().sense(&world, &body, &[]).is_none());
    }

    #[test]
    fn test_non_ground_layers_are_ignored() {
        let mut world = CollisionWorld::new();
        world.add_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(10.0, 0.5, 2.0), LayerMask::LADDER);
        let body = body_at(&mut world, Vec3::new(0.0, 0.01, 0.0));

        assert!(sensor().sense(&world, &body, &[]).is_none());
    }

    #[test]
    fn test_steep_ramp_is_flagged() {
        let mut world = CollisionWorld::new();
        let tilt = Quat::from_rotation_z(60f32.to_radians());
        world.add_oriented_box(Vec3::ZERO, Vec3::new(4.0, 0.5, 2.0), tilt, LayerMask::GROUND);

        // Find a resting spot by dropping the probe straight onto the ramp
        let top = Vec3::new(0.0, 3.0, 0.0);
        let hit = world
            .sphere_cast(top, 0.3, Vec3::NEG_Y, 10.0, QueryFilter::new(LayerMask::GROUND))
            .expect("ramp");
        let resting = top - Vec3::new(0.0, hit.distance + 0.3 - 0.01, 0.0);
        let body = body_at(&mut world, resting);

        let contact = sensor().sense(&world, &body, &[]).expect("grounded on ramp");
        assert!((contact.angle - 60.0).abs() < 1.5, "angle={}", contact.angle);
        assert!(contact.is_steep);
    }

    #[test]
    fn test_world_up_falls_back_to_y() {
        assert_eq!(world_up(Vec3::new(0.0, -9.81, 0.0)), Vec3::Y);
        assert_eq!(world_up(Vec3::ZERO), Vec3::Y);
    }
}
