//! Slide move for collision response.
//!
//! Moves a shape along its velocity and, on impact, clips the velocity so the
//! shape slides along walls, floors and into corners instead of stopping dead.

use glam::Vec3;

use super::trace::{QueryFilter, TraceShape};
use super::world::CollisionWorld;

/// Maximum number of collision planes to track during a slide move.
const MAX_CLIP_PLANES: usize = 5;

/// Keeps clipped velocity from re-entering the plane it was clipped against.
pub const OVERBOUNCE: f32 = 1.001;

/// Clip velocity against a surface normal.
///
/// Removes the component of velocity going into the surface, with a small
/// overbounce to prevent sticking.
pub fn clip_velocity(velocity: Vec3, normal: Vec3, overbounce: f32) -> Vec3 {
    let backoff = velocity.dot(normal);

    let adjusted_backoff = if backoff < 0.0 {
        backoff * overbounce
    } else {
        backoff / overbounce
    };

    velocity - normal * adjusted_backoff
}

/// Perform a slide move through the collision world.
///
/// # Arguments
///
/// * `world` - The collision world to trace through
/// * `position` - Shape position, bottom-center for capsules (updated)
/// * `velocity` - Current velocity (updated)
/// * `shape` - Collision shape
/// * `delta_time` - Time step in seconds
/// * `filter` - Which colliders block the move
///
/// # Returns
///
/// Whether the full movement succeeded without any collisions.
pub fn slide_move(
    world: &CollisionWorld,
    position: &mut Vec3,
    velocity: &mut Vec3,
    shape: TraceShape,
    delta_time: f32,
    filter: QueryFilter<'_>,
) -> bool {
    let mut time_remaining = delta_time;
    let original_velocity = *velocity;
    let mut planes = [Vec3::ZERO; MAX_CLIP_PLANES];
    let mut num_planes = 0;

    for _ in 0..MAX_CLIP_PLANES {
        if velocity.length_squared() < 0.0001 {
            break;
        }

        let target = *position + *velocity * time_remaining;
        let trace = world.trace(*position, target, shape, filter);

        if trace.fraction >= 1.0 {
            *position = trace.end_position;
            return num_planes == 0;
        }

        if trace.fraction > 0.0 {
            *position = trace.end_position;
        }

        time_remaining *= 1.0 - trace.fraction;

        let Some(normal) = trace.hit_normal else {
            continue;
        };

        if trace.all_solid {
            *velocity = Vec3::ZERO;
            return false;
        }

        if num_planes < MAX_CLIP_PLANES {
            planes[num_planes] = normal;
            num_planes += 1;
        }

        // Find a clip that leaves velocity out of every plane touched so far.
        let mut clipped = *velocity;
        let mut found_valid = false;

        for i in 0..num_planes {
            clipped = clip_velocity(clipped, planes[i], OVERBOUNCE);

            let valid = (0..num_planes)
                .filter(|&j| j != i)
                .all(|j| clipped.dot(planes[j]) >= -0.01);

            if valid {
                *velocity = clipped;
                found_valid = true;
                break;
            }
        }

        if found_valid {
            continue;
        }

        if num_planes >= 2 {
            // Slide along the crease between the first two planes
            let crease = planes[0].cross(planes[1]).normalize_or_zero();
            *velocity = crease * original_velocity.dot(crease);

            if velocity.dot(planes[0]) < -0.01 || velocity.dot(planes[1]) < -0.01 {
                *velocity = Vec3::ZERO;
                return false;
            }
        } else {
            *velocity = Vec3::ZERO;
            return false;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::flags::LayerMask;

    const CAPSULE: TraceShape = TraceShape::Capsule {
        radius: 0.3,
        height: 1.4,
    };

    #[test]
    fn test_clip_velocity_wall() {
        let velocity = Vec3::new(10.0, 0.0, 5.0);
        let wall_normal = Vec3::new(-1.0, 0.0, 0.0);

        let clipped = clip_velocity(velocity, wall_normal, 1.0);

        assert!(clipped.x.abs() < 0.01);
        assert!((clipped.z - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_clip_velocity_leaves_separating_motion() {
        let velocity = Vec3::new(0.0, 3.0, 0.0);
        let clipped = clip_velocity(velocity, Vec3::Y, 1.0);
        assert!(clipped.length() < 0.01);

        // Moving along the plane is untouched
        let along = clip_velocity(Vec3::X, Vec3::Y, OVERBOUNCE);
        assert!((along - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_slide_move_no_collision() {
        let world = CollisionWorld::new();

        let mut position = Vec3::ZERO;
        let mut velocity = Vec3::new(5.0, 0.0, 0.0);

        let clean = slide_move(
            &world,
            &mut position,
            &mut velocity,
            CAPSULE,
            1.0,
            QueryFilter::new(LayerMask::MASK_BODY_SOLID),
        );

        assert!(clean);
        assert!((position.x - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_slide_move_with_wall() {
        let mut world = CollisionWorld::new();
        world.add_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(50.0, 0.5, 50.0), LayerMask::GROUND);
        world.add_box(Vec3::new(5.5, 2.0, 0.0), Vec3::new(0.5, 2.0, 10.0), LayerMask::GROUND);

        let mut position = Vec3::new(0.0, 0.01, 0.0);
        let mut velocity = Vec3::new(10.0, 0.0, 5.0);

        slide_move(
            &world,
            &mut position,
            &mut velocity,
            CAPSULE,
            1.0,
            QueryFilter::new(LayerMask::MASK_BODY_SOLID),
        );

        assert!(position.x < 5.0, "Position x={} should be < 5.0", position.x);
        assert!(velocity.x.abs() < 0.1);
    }

    #[test]
    fn test_slide_move_passes_through_volumes() {
        let mut world = CollisionWorld::new();
        world.add_box(Vec3::new(2.0, 0.7, 0.0), Vec3::new(0.5, 1.0, 1.0), LayerMask::LADDER);

        let mut position = Vec3::ZERO;
        let mut velocity = Vec3::new(4.0, 0.0, 0.0);
        let clean = slide_move(
            &world,
            &mut position,
            &mut velocity,
            CAPSULE,
            1.0,
            QueryFilter::new(LayerMask::MASK_BODY_SOLID),
        );

        assert!(clean);
        assert!((position.x - 4.0).abs() < 0.01);
    }
}
