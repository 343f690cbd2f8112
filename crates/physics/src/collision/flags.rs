//! Layer and surface flags for collision filtering.
//!
//! Layers decide what a query can hit; surface flags describe what the hit
//! surface is made of so footsteps and ground classification can react to it.

use serde::{Deserialize, Serialize};

/// Layer membership of a collider.
///
/// Queries carry a mask and only consider colliders whose layers intersect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Nothing.
    pub const EMPTY: Self = Self(0);

    /// Walkable world geometry: floors, ramps, ceilings, walls.
    pub const GROUND: Self = Self(1 << 0);

    /// Solid geometry that blocks bodies but is never walkable.
    pub const BLOCKER: Self = Self(1 << 1);

    /// Ladder volumes and ladder rails.
    pub const LADDER: Self = Self(1 << 2);

    /// Hazard volumes (slow pads, damage zones).
    pub const HAZARD: Self = Self(1 << 3);

    /// Generic trigger volumes.
    pub const TRIGGER: Self = Self(1 << 4);

    /// Everything a character body collides with while moving.
    pub const MASK_BODY_SOLID: Self = Self(Self::GROUND.0 | Self::BLOCKER.0);

    /// Layers that never block movement.
    pub const MASK_NON_SOLID: Self =
        Self(Self::LADDER.0 | Self::HAZARD.0 | Self::TRIGGER.0);

    /// Check if these flags contain a specific flag.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any of the given flags are set.
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Remove flags from this set.
    #[inline]
    pub fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl std::ops::BitOr for LayerMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for LayerMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// Material properties of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SurfaceFlags(pub u32);

impl SurfaceFlags {
    /// Unclassified.
    pub const NONE: Self = Self(0);

    /// Wooden planks, crates, ladder rungs.
    pub const WOOD: Self = Self(1 << 0);

    /// Sheet metal, train roofs, grates.
    pub const METAL: Self = Self(1 << 1);

    /// Stone and concrete.
    pub const STONE: Self = Self(1 << 2);

    /// Gravel, ballast, dirt.
    pub const GRAVEL: Self = Self(1 << 3);

    /// Glass panes.
    pub const GLASS: Self = Self(1 << 4);

    /// Check if these flags contain a specific flag.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if no material is set.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for SurfaceFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_mask_operations() {
        let combined = LayerMask::GROUND | LayerMask::LADDER;

        assert!(combined.contains(LayerMask::GROUND));
        assert!(combined.contains(LayerMask::LADDER));
        assert!(!combined.contains(LayerMask::HAZARD));
        assert!(combined.intersects(LayerMask::MASK_BODY_SOLID));
        assert_eq!(combined.difference(LayerMask::LADDER), LayerMask::GROUND);
    }

    #[test]
    fn test_body_mask_ignores_volumes() {
        let mask = LayerMask::MASK_BODY_SOLID;
        assert!(mask.contains(LayerMask::GROUND));
        assert!(!mask.intersects(LayerMask::MASK_NON_SOLID));
    }

    #[test]
    fn test_surface_flags() {
        let flags = SurfaceFlags::METAL | SurfaceFlags::GLASS;
        assert!(flags.contains(SurfaceFlags::METAL));
        assert!(!flags.contains(SurfaceFlags::WOOD));
        assert!(SurfaceFlags::NONE.is_empty());
    }
}
