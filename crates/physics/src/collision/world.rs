//! Collision world containing static geometry and character bodies.
//!
//! The world stores collidable geometry, answers shape queries against it and
//! integrates the kinematic character bodies it hosts.

use glam::{Quat, Vec3};
use parry3d::math::{Isometry, Point, Real};
use parry3d::na::{Quaternion, Translation3, UnitQuaternion};
use parry3d::query::{contact, Contact};
use parry3d::shape::SharedShape;

use super::body::{BodyHandle, RigidBody};
use super::flags::{LayerMask, SurfaceFlags};
use super::slide_move::slide_move;
use super::trace::{CastHit, ColliderHandle, QueryFilter, TraceResult, TraceShape};

/// Default world gravity (meters/second²).
pub const DEFAULT_GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

/// Binary search iterations for traces and casts.
const SEARCH_ITERATIONS: usize = 16;

/// Extra distance used when asking parry for the contact at a cast's end.
const CONTACT_SKIN: f32 = 0.01;

/// Smallest spacing between trace samples, for point traces.
const MIN_SAMPLE_SPACING: f32 = 0.02;

/// A piece of collision geometry in the world.
#[derive(Debug, Clone)]
pub struct Collider {
    /// Handle of this collider.
    pub handle: ColliderHandle,
    /// The collision shape.
    pub shape: SharedShape,
    /// Position and orientation in world space.
    pub transform: Isometry<Real>,
    /// Layer membership.
    pub layers: LayerMask,
    /// Surface material.
    pub surface: SurfaceFlags,
    /// Disabled colliders are invisible to every query.
    pub enabled: bool,
}

/// The collision world containing all geometry and bodies.
#[derive(Debug)]
pub struct CollisionWorld {
    /// Static world colliders (floors, ramps, ladder volumes, etc.).
    colliders: Vec<Collider>,
    /// Character bodies; removed bodies leave an empty slot.
    bodies: Vec<Option<RigidBody>>,
    /// Gravity applied to bodies with gravity enabled.
    gravity: Vec3,
    /// Next collider handle to assign.
    next_id: u32,
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionWorld {
    /// Create an empty collision world with default gravity.
    pub fn new() -> Self {
        Self {
            colliders: Vec::new(),
            bodies: Vec::new(),
            gravity: DEFAULT_GRAVITY,
            next_id: 0,
        }
    }

    /// World gravity.
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Replace world gravity.
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    // ========================================================================
    // Colliders
    // ========================================================================

    /// Add an axis-aligned box to the world.
    ///
    /// # Arguments
    ///
    /// * `center` - Center position of the box in world space
    /// * `half_extents` - Half-size in each axis (x, y, z)
    /// * `layers` - Layer membership for query filtering
    pub fn add_box(&mut self, center: Vec3, half_extents: Vec3, layers: LayerMask) -> ColliderHandle {
        self.add_oriented_box(center, half_extents, Quat::IDENTITY, layers)
    }

    /// Add a rotated box to the world. Ramps are boxes tilted about Z.
    pub fn add_oriented_box(
        &mut self,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        layers: LayerMask,
    ) -> ColliderHandle {
        let handle = ColliderHandle(self.next_id);
        self.next_id += 1;

        self.colliders.push(Collider {
            handle,
            shape: SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z),
            transform: isometry(center, rotation),
            layers,
            surface: SurfaceFlags::NONE,
            enabled: true,
        });

        handle
    }

    /// Set the surface material of a collider.
    pub fn set_surface(&mut self, handle: ColliderHandle, surface: SurfaceFlags) -> bool {
        match self.collider_mut(handle) {
            Some(collider) => {
                collider.surface = surface;
                true
            }
            None => false,
        }
    }

    /// Enable or disable a collider.
    pub fn set_collider_enabled(&mut self, handle: ColliderHandle, enabled: bool) -> bool {
        match self.collider_mut(handle) {
            Some(collider) => {
                collider.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Remove a collider. Returns false if it did not exist.
    pub fn remove_collider(&mut self, handle: ColliderHandle) -> bool {
        let before = self.colliders.len();
        self.colliders.retain(|c| c.handle != handle);
        self.colliders.len() != before
    }

    /// Look up a collider.
    pub fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.iter().find(|c| c.handle == handle)
    }

    fn collider_mut(&mut self, handle: ColliderHandle) -> Option<&mut Collider> {
        self.colliders.iter_mut().find(|c| c.handle == handle)
    }

    /// Get the number of colliders.
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    // ========================================================================
    // Bodies
    // ========================================================================

    /// Add a character body and return its handle.
    pub fn add_body(&mut self, body: RigidBody) -> BodyHandle {
        let handle = BodyHandle(self.bodies.len() as u32);
        self.bodies.push(Some(body));
        handle
    }

    /// Remove a body. Its handle stays dead.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        self.bodies.get_mut(handle.0 as usize).and_then(Option::take)
    }

    /// Look up a body.
    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle.0 as usize).and_then(Option::as_ref)
    }

    /// Look up a body mutably.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle.0 as usize).and_then(Option::as_mut)
    }

    /// Advance every body by `delta_time`: gravity, constraints, then a slide
    /// move through the static geometry.
    pub fn step(&mut self, delta_time: f32) {
        if !(delta_time > 0.0) {
            return;
        }

        for index in 0..self.bodies.len() {
            // Take the body out so the world can be queried while it moves.
            let Some(mut body) = self.bodies[index].take() else {
                continue;
            };

            if body.gravity_enabled {
                body.velocity += self.gravity * delta_time;
            }
            body.velocity = body.constraints.apply_to_velocity(body.velocity);

            let shape = TraceShape::Capsule {
                radius: body.capsule.radius,
                height: body.capsule.height,
            };
            let filter = QueryFilter::new(body.collision_mask).excluding(&body.ignored);

            let mut bottom = body.bottom();
            if self.shape_in_solid(bottom, shape, filter) {
                bottom = self.resolve_penetration(bottom, shape, filter);
            }

            slide_move(self, &mut bottom, &mut body.velocity, shape, delta_time, filter);
            body.position = bottom - body.capsule.bottom_offset();

            self.bodies[index] = Some(body);
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Trace a shape through the world.
    ///
    /// Sweeps the given shape from `start` to `end` and returns information
    /// about what was hit.
    pub fn trace(&self, start: Vec3, end: Vec3, shape: TraceShape, filter: QueryFilter<'_>) -> TraceResult {
        let delta = end - start;
        let distance = delta.length();

        // No movement - just check if position is valid
        if distance < 0.0001 {
            return if self.shape_in_solid(start, shape, filter) {
                TraceResult {
                    fraction: 0.0,
                    end_position: start,
                    hit_normal: Some(Vec3::Y),
                    hit_collider: None,
                    started_in_solid: true,
                    all_solid: true,
                }
            } else {
                TraceResult::no_hit(start)
            };
        }

        let start_in_solid = self.shape_in_solid(start, shape, filter);
        let in_solid = |t: f32| self.shape_in_solid(start + delta * t, shape, filter);

        // Sample at most one radius apart so walls thinner than the sweep
        // are not stepped over, then refine between the last clear sample
        // and the first blocked one.
        let bracket = if start_in_solid {
            in_solid(1.0).then_some((0.0, 1.0))
        } else {
            let spacing = shape.radius().max(MIN_SAMPLE_SPACING);
            let samples = (distance / spacing).ceil().max(1.0) as usize;
            let mut previous = 0.0;
            let mut bracket = None;
            for i in 1..=samples {
                let t = i as f32 / samples as f32;
                if in_solid(t) {
                    bracket = Some((previous, t));
                    break;
                }
                previous = t;
            }
            bracket
        };

        let Some((mut lo, mut hi)) = bracket else {
            let mut result = TraceResult::no_hit(end);
            result.started_in_solid = start_in_solid;
            return result;
        };

        for _ in 0..SEARCH_ITERATIONS {
            let mid = (lo + hi) * 0.5;
            if self.shape_in_solid(start + delta * mid, shape, filter) {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        let end_position = start + delta * lo;
        let test_shape = parry_shape(shape);
        let test_transform = isometry(start + delta * hi + shape.center_offset(), Quat::IDENTITY);
        let nearest = self.nearest_contact(&test_transform, &test_shape, filter, CONTACT_SKIN);

        let hit_normal = match nearest {
            Some((_, c)) => to_vec3(c.normal1.into_inner()),
            None => {
                // Fall back to opposite of movement direction (projected to horizontal)
                let horizontal = Vec3::new(-delta.x, 0.0, -delta.z);
                if horizontal.length_squared() > 0.0001 {
                    horizontal.normalize()
                } else {
                    Vec3::Y
                }
            }
        };

        TraceResult {
            fraction: lo,
            end_position,
            hit_normal: Some(hit_normal),
            hit_collider: nearest.map(|(collider, _)| collider.handle),
            started_in_solid: start_in_solid,
            all_solid: start_in_solid && lo < 0.001,
        }
    }

    /// Cast a sphere from `origin` along `direction` and return the first hit.
    ///
    /// The path is sampled at sphere-radius intervals so thin geometry is not
    /// skipped, then refined with a binary search.
    pub fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        filter: QueryFilter<'_>,
    ) -> Option<CastHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO || !(max_distance >= 0.0) || !(radius > 0.0) {
            return None;
        }

        let shape = TraceShape::Sphere { radius };
        let overlaps = |d: f32| self.shape_in_solid(origin + dir * d, shape, filter);

        let (mut lo, mut hi) = if overlaps(0.0) {
            (0.0, 0.0)
        } else {
            let samples = (max_distance / radius).ceil().max(1.0) as usize;
            let mut previous = 0.0;
            let mut bracket = None;
            for i in 1..=samples {
                let d = max_distance * i as f32 / samples as f32;
                if overlaps(d) {
                    bracket = Some((previous, d));
                    break;
                }
                previous = d;
            }
            bracket?
        };

        for _ in 0..SEARCH_ITERATIONS {
            if hi - lo <= f32::EPSILON {
                break;
            }
            let mid = (lo + hi) * 0.5;
            if overlaps(mid) {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        let ball = parry_shape(shape);
        let at = isometry(origin + dir * lo, Quat::IDENTITY);
        let (collider, c) = self.nearest_contact(&at, &ball, filter, (hi - lo) + CONTACT_SKIN)?;

        Some(CastHit {
            distance: lo,
            point: to_vec3(c.point1.coords),
            normal: to_vec3(c.normal1.into_inner()),
            collider: collider.handle,
            layers: collider.layers,
            surface: collider.surface,
        })
    }

    /// Check if a capsule spanning segment `a`..`b` overlaps anything.
    pub fn overlap_capsule(&self, a: Vec3, b: Vec3, radius: f32, filter: QueryFilter<'_>) -> bool {
        let shape = SharedShape::capsule(to_point(a), to_point(b), radius);
        self.any_contact(&Isometry::identity(), &shape, filter)
    }

    /// Check if a sphere overlaps anything.
    pub fn overlap_sphere(&self, center: Vec3, radius: f32, filter: QueryFilter<'_>) -> bool {
        self.shape_in_solid(center, TraceShape::Sphere { radius }, filter)
    }

    /// Every collider overlapping `shape` placed at `position`.
    pub fn overlapping(&self, position: Vec3, shape: TraceShape, filter: QueryFilter<'_>) -> Vec<ColliderHandle> {
        let test_shape = parry_shape(shape);
        let test_transform = isometry(position + shape.center_offset(), Quat::IDENTITY);

        self.colliders
            .iter()
            .filter(|c| c.enabled && filter.accepts(c.handle, c.layers))
            .filter(|c| {
                matches!(
                    contact(&c.transform, c.shape.as_ref(), &test_transform, test_shape.as_ref(), 0.0),
                    Ok(Some(_))
                )
            })
            .map(|c| c.handle)
            .collect()
    }

    /// Check if a shape placed at `position` is inside solid geometry.
    pub fn shape_in_solid(&self, position: Vec3, shape: TraceShape, filter: QueryFilter<'_>) -> bool {
        let test_shape = parry_shape(shape);
        let test_transform = isometry(position + shape.center_offset(), Quat::IDENTITY);
        self.any_contact(&test_transform, &test_shape, filter)
    }

    /// Push a shape out of solid geometry. Returns the corrected position.
    pub fn resolve_penetration(&self, position: Vec3, shape: TraceShape, filter: QueryFilter<'_>) -> Vec3 {
        let test_shape = parry_shape(shape);
        let test_transform = isometry(position + shape.center_offset(), Quat::IDENTITY);

        let mut correction = Vec3::ZERO;
        for c in self.colliders.iter().filter(|c| c.enabled && filter.accepts(c.handle, c.layers)) {
            if let Ok(Some(hit)) = contact(&c.transform, c.shape.as_ref(), &test_transform, test_shape.as_ref(), 0.0) {
                // Negative dist means penetration; normal1 points out of the collider.
                let depth = (-hit.dist).max(0.0);
                correction += to_vec3(hit.normal1.into_inner()) * (depth + 0.001);
            }
        }

        position + correction
    }

    // ========================================================================
    // Private helpers
    // ========================================================================

    fn any_contact(&self, at: &Isometry<Real>, shape: &SharedShape, filter: QueryFilter<'_>) -> bool {
        self.colliders
            .iter()
            .filter(|c| c.enabled && filter.accepts(c.handle, c.layers))
            .any(|c| matches!(contact(&c.transform, c.shape.as_ref(), at, shape.as_ref(), 0.0), Ok(Some(_))))
    }

    /// Closest collider within `prediction` of `shape`, with the contact
    /// expressed from the collider's side (normal1 points out of it).
    fn nearest_contact(
        &self,
        at: &Isometry<Real>,
        shape: &SharedShape,
        filter: QueryFilter<'_>,
        prediction: f32,
    ) -> Option<(&Collider, Contact)> {
        self.colliders
            .iter()
            .filter(|c| c.enabled && filter.accepts(c.handle, c.layers))
            .filter_map(|c| match contact(&c.transform, c.shape.as_ref(), at, shape.as_ref(), prediction) {
                Ok(Some(hit)) => Some((c, hit)),
                _ => None,
            })
            .min_by(|(_, a), (_, b)| a.dist.total_cmp(&b.dist))
    }
}

/// Create a parry3d shape from a [`TraceShape`].
fn parry_shape(shape: TraceShape) -> SharedShape {
    match shape {
        TraceShape::Capsule { radius, height } => {
            // Parry capsule is defined by half-height of the cylinder part
            let cylinder_half_height = (height - 2.0 * radius).max(0.0) / 2.0;
            SharedShape::capsule_y(cylinder_half_height, radius)
        }
        TraceShape::Sphere { radius } => SharedShape::ball(radius),
        TraceShape::Point => SharedShape::ball(0.001),
    }
}

fn isometry(position: Vec3, rotation: Quat) -> Isometry<Real> {
    let rotation = UnitQuaternion::from_quaternion(Quaternion::new(rotation.w, rotation.x, rotation.y, rotation.z));
    Isometry::from_parts(Translation3::new(position.x, position.y, position.z), rotation)
}

fn to_point(v: Vec3) -> Point<Real> {
    Point::new(v.x, v.y, v.z)
}

fn to_vec3(v: parry3d::math::Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::body::CapsuleShape;

    fn create_test_world() -> CollisionWorld {
        let mut world = CollisionWorld::new();

        // Floor at y=0
        world.add_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(50.0, 0.5, 50.0), LayerMask::GROUND);

        // Wall at x=10
        world.add_box(Vec3::new(10.0, 2.5, 0.0), Vec3::new(0.5, 2.5, 10.0), LayerMask::GROUND);

        world
    }

    fn ground() -> QueryFilter<'static> {
        QueryFilter::new(LayerMask::GROUND)
    }

    #[test]
    fn test_sphere_cast_hits_floor() {
        let world = create_test_world();

        let hit = world
            .sphere_cast(Vec3::new(0.0, 1.0, 0.0), 0.25, Vec3::NEG_Y, 2.0, ground())
            .expect("floor below");

        assert!((hit.distance - 0.75).abs() < 0.01, "distance={}", hit.distance);
        assert!(hit.normal.dot(Vec3::Y) > 0.99);
        assert_eq!(hit.layers, LayerMask::GROUND);
    }

    #[test]
    fn test_sphere_cast_miss() {
        let world = create_test_world();
        let hit = world.sphere_cast(Vec3::new(0.0, 1.0, 0.0), 0.25, Vec3::Y, 5.0, ground());
        assert!(hit.is_none());
    }

    #[test]
    fn test_sphere_cast_reports_ramp_normal() {
        let mut world = CollisionWorld::new();
        let tilt = Quat::from_rotation_z(30f32.to_radians());
        world.add_oriented_box(Vec3::ZERO, Vec3::new(5.0, 0.5, 5.0), tilt, LayerMask::GROUND);

        let hit = world
            .sphere_cast(Vec3::new(0.0, 3.0, 0.0), 0.2, Vec3::NEG_Y, 5.0, ground())
            .expect("ramp below");

        let angle = hit.normal.angle_between(Vec3::Y).to_degrees();
        assert!((angle - 30.0).abs() < 1.0, "angle={angle}");
    }

    #[test]
    fn test_trace_capsule_stops_at_wall() {
        let world = create_test_world();
        let shape = TraceShape::Capsule { radius: 0.4, height: 1.8 };

        let result = world.trace(Vec3::new(0.0, 0.1, 0.0), Vec3::new(15.0, 0.1, 0.0), shape, ground());

        assert!(result.hit_something());
        assert!(result.end_position.x < 9.6);
        assert!(result.hit_normal.expect("normal").x < -0.9);
    }

    #[test]
    fn test_trace_does_not_skip_thin_wall() {
        let mut world = CollisionWorld::new();
        world.add_box(Vec3::new(3.0, 1.0, 0.0), Vec3::new(0.05, 1.0, 5.0), LayerMask::GROUND);
        let shape = TraceShape::Capsule { radius: 0.3, height: 1.4 };

        // Both ends are clear; only the middle of the sweep crosses the wall
        let result = world.trace(Vec3::new(0.0, 0.1, 0.0), Vec3::new(6.0, 0.1, 0.0), shape, ground());

        assert!(result.hit_something());
        assert!(!result.started_in_solid);
        assert!(result.end_position.x < 2.7, "x={}", result.end_position.x);
        assert!(result.end_position.x > 2.5, "x={}", result.end_position.x);
        assert!(result.hit_normal.expect("normal").x < -0.9);
    }

    #[test]
    fn test_layer_filtering() {
        let mut world = CollisionWorld::new();
        world.add_box(Vec3::new(0.0, 1.0, 0.0), Vec3::splat(0.5), LayerMask::LADDER);

        assert!(!world.overlap_sphere(Vec3::new(0.0, 1.0, 0.0), 0.1, ground()));
        assert!(world.overlap_sphere(Vec3::new(0.0, 1.0, 0.0), 0.1, QueryFilter::new(LayerMask::LADDER)));
    }

    #[test]
    fn test_excluded_and_disabled_colliders_are_skipped() {
        let mut world = CollisionWorld::new();
        let block = world.add_box(Vec3::ZERO, Vec3::splat(0.5), LayerMask::GROUND);

        let skip = [block];
        assert!(!world.overlap_sphere(Vec3::ZERO, 0.1, ground().excluding(&skip)));

        world.set_collider_enabled(block, false);
        assert!(!world.overlap_sphere(Vec3::ZERO, 0.1, ground()));
    }

    #[test]
    fn test_overlap_capsule_detects_ceiling() {
        let mut world = create_test_world();
        world.add_box(Vec3::new(0.0, 1.5, 0.0), Vec3::new(2.0, 0.25, 2.0), LayerMask::GROUND);

        assert!(world.overlap_capsule(Vec3::new(0.0, 0.8, 0.0), Vec3::new(0.0, 1.2, 0.0), 0.3, ground()));
        assert!(!world.overlap_capsule(Vec3::new(5.0, 0.8, 0.0), Vec3::new(5.0, 1.2, 0.0), 0.3, ground()));
    }

    #[test]
    fn test_step_drops_body_onto_floor() {
        let mut world = create_test_world();
        let capsule = CapsuleShape {
            radius: 0.3,
            height: 1.4,
            center: Vec3::new(0.0, 0.7, 0.0),
        };
        let handle = world.add_body(RigidBody::new(Vec3::new(0.0, 1.0, 0.0), capsule));

        for _ in 0..120 {
            world.step(1.0 / 60.0);
        }

        let body = world.body(handle).expect("body");
        assert!(body.position.y >= -0.01 && body.position.y < 0.05, "y={}", body.position.y);
    }

    #[test]
    fn test_removed_body_handle_is_dead() {
        let mut world = CollisionWorld::new();
        let capsule = CapsuleShape {
            radius: 0.3,
            height: 1.4,
            center: Vec3::new(0.0, 0.7, 0.0),
        };
        let handle = world.add_body(RigidBody::new(Vec3::ZERO, capsule));

        assert!(world.remove_body(handle).is_some());
        assert!(world.body(handle).is_none());
        world.step(0.016);
    }
}
