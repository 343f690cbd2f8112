//! Query shapes, filters and results.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::flags::{LayerMask, SurfaceFlags};

/// Handle to a collider stored in a [`CollisionWorld`](super::CollisionWorld).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColliderHandle(pub u32);

/// Which colliders a query may hit.
#[derive(Debug, Clone, Copy)]
pub struct QueryFilter<'a> {
    /// Layers to collide with.
    pub mask: LayerMask,
    /// Colliders to skip regardless of layer.
    pub exclude: &'a [ColliderHandle],
}

impl<'a> QueryFilter<'a> {
    /// Filter on layers only.
    pub fn new(mask: LayerMask) -> Self {
        Self { mask, exclude: &[] }
    }

    /// Skip the given colliders.
    pub fn excluding(mut self, exclude: &'a [ColliderHandle]) -> Self {
        self.exclude = exclude;
        self
    }

    /// Whether a collider passes this filter.
    #[inline]
    pub fn accepts(&self, handle: ColliderHandle, layers: LayerMask) -> bool {
        self.mask.intersects(layers) && !self.exclude.contains(&handle)
    }
}

/// Result of sweeping a shape through the world.
///
/// Traces sweep a shape from a start position to an end position and
/// report what was hit along the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceResult {
    /// How far along the trace path we got before hitting something.
    ///
    /// - `1.0` = traveled the full distance (no collision)
    /// - `0.0` = hit something immediately at start
    pub fraction: f32,

    /// Final position after the trace.
    pub end_position: Vec3,

    /// Surface normal at the impact point, `None` if nothing was hit.
    pub hit_normal: Option<Vec3>,

    /// Collider that was hit.
    pub hit_collider: Option<ColliderHandle>,

    /// Whether the trace started inside solid geometry.
    pub started_in_solid: bool,

    /// Whether the entire trace was inside solid geometry.
    pub all_solid: bool,
}

impl Default for TraceResult {
    fn default() -> Self {
        Self::no_hit(Vec3::ZERO)
    }
}

impl TraceResult {
    /// Create a trace result indicating no collision occurred.
    pub fn no_hit(end_position: Vec3) -> Self {
        Self {
            fraction: 1.0,
            end_position,
            hit_normal: None,
            hit_collider: None,
            started_in_solid: false,
            all_solid: false,
        }
    }

    /// Check if this trace hit something.
    #[inline]
    pub fn hit_something(&self) -> bool {
        self.fraction < 1.0
    }

    /// Get the hit normal, defaulting to up if none.
    #[inline]
    pub fn normal_or_up(&self) -> Vec3 {
        self.hit_normal.unwrap_or(Vec3::Y)
    }
}

/// First contact of a shape cast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CastHit {
    /// Distance traveled along the cast direction before contact.
    pub distance: f32,
    /// Contact point on the hit surface (world space).
    pub point: Vec3,
    /// Outward surface normal at the contact.
    pub normal: Vec3,
    /// Collider that was hit.
    pub collider: ColliderHandle,
    /// Layers of the hit collider.
    pub layers: LayerMask,
    /// Material of the hit collider.
    pub surface: SurfaceFlags,
}

/// Shape used for traces and overlaps.
///
/// Capsules are vertical and positioned by their bottom-center, the same
/// convention body feet use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TraceShape {
    /// A vertical capsule (pill shape).
    Capsule {
        /// Radius of the capsule cylinder and end caps.
        radius: f32,
        /// Total height from bottom of lower cap to top of upper cap.
        height: f32,
    },

    /// A sphere, positioned by its center.
    Sphere {
        /// Sphere radius.
        radius: f32,
    },

    /// A single point.
    Point,
}

impl TraceShape {
    /// Get the effective radius of this shape for collision purposes.
    pub fn radius(&self) -> f32 {
        match self {
            Self::Capsule { radius, .. } | Self::Sphere { radius } => *radius,
            Self::Point => 0.0,
        }
    }

    /// Get the height of this shape.
    pub fn height(&self) -> f32 {
        match self {
            Self::Capsule { height, .. } => *height,
            Self::Sphere { radius } => radius * 2.0,
            Self::Point => 0.0,
        }
    }

    /// Offset from the query position to the shape's center.
    pub fn center_offset(&self) -> Vec3 {
        match self {
            Self::Capsule { height, .. } => Vec3::new(0.0, height / 2.0, 0.0),
            Self::Sphere { .. } | Self::Point => Vec3::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_result_no_hit() {
        let result = TraceResult::no_hit(Vec3::new(10.0, 0.0, 0.0));
        assert!(!result.hit_something());
        assert_eq!(result.fraction, 1.0);
        assert!(result.hit_normal.is_none());
        assert_eq!(result.normal_or_up(), Vec3::Y);
    }

    #[test]
    fn test_filter_excludes_handles() {
        let skip = [ColliderHandle(3)];
        let filter = QueryFilter::new(LayerMask::GROUND).excluding(&skip);

        assert!(filter.accepts(ColliderHandle(1), LayerMask::GROUND));
        assert!(!filter.accepts(ColliderHandle(3), LayerMask::GROUND));
        assert!(!filter.accepts(ColliderHandle(1), LayerMask::LADDER));
    }

    #[test]
    fn test_capsule_is_positioned_by_bottom() {
        let capsule = TraceShape::Capsule {
            radius: 0.3,
            height: 1.4,
        };
        assert_eq!(capsule.center_offset(), Vec3::new(0.0, 0.7, 0.0));
        assert_eq!(TraceShape::Sphere { radius: 0.5 }.height(), 1.0);
    }
}
