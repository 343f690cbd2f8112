//! Level layout: collision geometry, ladders, hazards and the spawn point.

use caboose_physics::collision::{ColliderHandle, CollisionWorld, LayerMask, SurfaceFlags};
use caboose_physics::movement::{Ladder, LadderHandle, LadderSet};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A level containing collision geometry and gameplay volumes.
#[derive(Debug)]
pub struct Level {
    /// Level identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Collision world for physics.
    pub collision: CollisionWorld,

    /// Climbable ladders.
    pub ladders: LadderSet,

    /// Pads that slow whoever stands on them.
    pub hazards: Vec<HazardPad>,

    /// Where the character starts.
    pub spawn: SpawnPoint,
}

/// Where the character starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Feet position in world space.
    pub position: Vec3,

    /// Initial facing.
    pub facing_right: bool,
}

impl Default for SpawnPoint {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.01, 0.0),
            facing_right: true,
        }
    }
}

/// A trigger pad that applies a slow on contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardPad {
    /// Trigger collider on the hazard layer.
    pub collider: ColliderHandle,

    /// Speed multiplier applied.
    pub multiplier: f32,

    /// Seconds the slow lasts.
    pub duration: f32,

    /// Seconds before the same pad can slow again.
    pub cooldown: f32,
}

impl Level {
    /// Create an empty level.
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            collision: CollisionWorld::new(),
            ladders: LadderSet::new(),
            hazards: Vec::new(),
            spawn: SpawnPoint::default(),
        }
    }

    /// A small yard exercising every locomotion feature.
    ///
    /// ```text
    ///                          ladder  platform
    ///   tunnel                   |======
    ///   ____   grate    pad      |              /  60 degree ramp
    /// ================================================
    /// -8        -2   0   3       6     8        14
    /// ```
    pub fn test_yard() -> Self {
        let mut level = Self::new("test_yard", "Test Yard");

        // Floor
        level
            .collision
            .add_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(40.0, 0.5, 5.0), LayerMask::GROUND);

        // Metal grate near the spawn
        let grate = level
            .collision
            .add_box(Vec3::new(-2.0, -0.05, 0.0), Vec3::new(1.0, 0.05, 5.0), LayerMask::GROUND);
        level.collision.set_surface(grate, SurfaceFlags::METAL);

        // Low tunnel, ceiling at y=1.0
        level
            .collision
            .add_box(Vec3::new(-8.0, 1.5, 0.0), Vec3::new(2.0, 0.5, 5.0), LayerMask::GROUND);

        // Platform reached by the ladder, top at y=4
        level
            .collision
            .add_box(Vec3::new(8.0, 3.75, 0.0), Vec3::new(1.9, 0.25, 5.0), LayerMask::GROUND);

        // Climbed from the spawn side, stepping off onto the platform
        level.add_ladder(Vec3::new(6.0, 2.0, 0.0), Vec3::new(0.1, 2.0, 0.4), 0.5, |ladder| {
            ladder
                .with_forward(Vec3::NEG_X)
                .with_top_exit(Vec3::new(6.8, 4.02, 0.0))
        });

        level.add_hazard(Vec3::new(3.0, 0.05, 0.0), Vec3::new(0.5, 0.05, 5.0), 0.5, 1.5, 1.0);

        // Steep ramp rising toward +X
        level.collision.add_oriented_box(
            Vec3::new(14.0, 0.0, 0.0),
            Vec3::new(3.0, 0.5, 5.0),
            Quat::from_rotation_z(60f32.to_radians()),
            LayerMask::GROUND,
        );

        level
    }

    /// Add a ladder: a rail box plus a wider trigger volume around it.
    ///
    /// Both colliders sit on the ladder layer and map back to the ladder.
    /// `configure` can override the geometry derived from the box.
    pub fn add_ladder(
        &mut self,
        center: Vec3,
        half_extents: Vec3,
        volume_margin: f32,
        configure: impl FnOnce(Ladder) -> Ladder,
    ) -> LadderHandle {
        let rail = self.collision.add_box(center, half_extents, LayerMask::LADDER);
        let margin = Vec3::new(volume_margin, 0.0, volume_margin);
        let volume = self
            .collision
            .add_box(center, half_extents + margin, LayerMask::LADDER);

        let ladder = Ladder::from_box(center, half_extents, Quat::IDENTITY).with_colliders(vec![rail, volume]);
        self.ladders.insert(configure(ladder))
    }

    /// Add a slowing pad.
    pub fn add_hazard(
        &mut self,
        center: Vec3,
        half_extents: Vec3,
        multiplier: f32,
        duration: f32,
        cooldown: f32,
    ) -> ColliderHandle {
        let collider = self.collision.add_box(center, half_extents, LayerMask::HAZARD);
        self.hazards.push(HazardPad {
            collider,
            multiplier,
            duration,
            cooldown,
        });
        collider
    }

    /// Look up the pad owning a collider.
    pub fn hazard(&self, collider: ColliderHandle) -> Option<&HazardPad> {
        self.hazards.iter().find(|h| h.collider == collider)
    }
}
