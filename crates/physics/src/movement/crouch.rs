//! Crouch geometry.
//!
//! Crouching shrinks the capsule toward a crouched profile over a short lerp;
//! standing grows it back once there is headroom. The capsule bottom never
//! moves, so height changes happen at the head. Speed follows the geometry on
//! the way down but lags on the way up: after standing is granted it is held
//! at its crouched value for a moment before lerping back.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collision::{CapsuleShape, QueryFilter};

use super::config::CrouchConfig;
use super::port::{BodyState, PhysicsQueryPort};

/// Lerp progress this close to 1 snaps to exactly 1.
const LERP_SNAP: f32 = 1e-4;

/// Standing and crouched capsule dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapsuleProfile {
    /// Cap radius, shared by both profiles.
    pub radius: f32,
    /// Standing height.
    pub standing_height: f32,
    /// Standing capsule center relative to the body origin.
    pub standing_center: Vec3,
    /// Crouched height.
    pub crouched_height: f32,
}

impl CapsuleProfile {
    /// Derive the crouched profile from a standing capsule.
    pub fn from_standing(capsule: CapsuleShape, crouch_height_ratio: f32) -> Self {
        let standing_height = capsule.height.max(capsule.radius * 2.0);
        Self {
            radius: capsule.radius,
            standing_height,
            standing_center: capsule.center,
            crouched_height: (standing_height * crouch_height_ratio).max(capsule.radius * 2.0),
        }
    }

    /// Body-local height of the capsule bottom.
    pub fn bottom_y(&self) -> f32 {
        self.standing_center.y - self.standing_height / 2.0
    }

    /// Capsule of the given height with the bottom kept in place.
    pub fn capsule_at(&self, height: f32) -> CapsuleShape {
        CapsuleShape {
            radius: self.radius,
            height,
            center: Vec3::new(
                self.standing_center.x,
                self.bottom_y() + height / 2.0,
                self.standing_center.z,
            ),
        }
    }
}

/// Geometry and speed produced by a crouch tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrouchGeometry {
    /// Capsule to apply to the body.
    pub capsule: CapsuleShape,
    /// Visual Y scale.
    pub visual_scale: f32,
    /// Move speed before slows.
    pub base_speed: f32,
}

/// Values a lerp started from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct LerpStart {
    height: f32,
    visual_scale: f32,
    speed: f32,
}

/// Crouch and stand lerps with a headroom gate.
#[derive(Debug, Clone)]
pub struct CrouchController {
    config: CrouchConfig,
    profile: CapsuleProfile,
    stand_speed: f32,
    crouch_speed: f32,

    is_crouching: bool,
    is_crouch_lerping: bool,
    is_standing_lerping: bool,
    crouch_lerp_t: f32,
    stand_lerp_t: f32,

    /// Seconds before speed starts recovering after standing.
    stand_speed_recovery_delay: f32,
    /// Speed recovery progress once the delay has run out.
    speed_recovery_t: f32,
    is_speed_recovering: bool,

    from: LerpStart,

    height: f32,
    visual_scale: f32,
    speed: f32,
}

impl CrouchController {
    pub fn new(config: CrouchConfig, profile: CapsuleProfile, stand_speed: f32) -> Self {
        let crouch_speed = stand_speed * config.crouch_speed_ratio;
        Self {
            config,
            profile,
            stand_speed,
            crouch_speed,
            is_crouching: false,
            is_crouch_lerping: false,
            is_standing_lerping: false,
            crouch_lerp_t: 0.0,
            stand_lerp_t: 0.0,
            stand_speed_recovery_delay: 0.0,
            speed_recovery_t: 0.0,
            is_speed_recovering: false,
            from: LerpStart {
                height: profile.standing_height,
                visual_scale: 1.0,
                speed: stand_speed,
            },
            height: profile.standing_height,
            visual_scale: 1.0,
            speed: stand_speed,
        }
    }

    /// Crouch is wanted or held.
    pub fn is_crouching(&self) -> bool {
        self.is_crouching
    }

    pub fn is_crouch_lerping(&self) -> bool {
        self.is_crouch_lerping
    }

    pub fn is_standing_lerping(&self) -> bool {
        self.is_standing_lerping
    }

    pub fn profile(&self) -> &CapsuleProfile {
        &self.profile
    }

    /// Current geometry and speed without advancing time.
    pub fn geometry(&self) -> CrouchGeometry {
        CrouchGeometry {
            capsule: self.profile.capsule_at(self.height),
            visual_scale: self.visual_scale,
            base_speed: self.speed,
        }
    }

    /// Start crouching. Repeated requests while crouched are no-ops.
    pub fn request_crouch(&mut self) {
        if self.is_crouching {
            return;
        }

        self.is_crouching = true;
        self.is_standing_lerping = false;
        self.is_speed_recovering = false;
        self.stand_speed_recovery_delay = 0.0;
        self.is_crouch_lerping = true;
        self.crouch_lerp_t = 0.0;
        self.from = self.snapshot();
    }

    /// Start standing if there is headroom.
    ///
    /// Returns false when the headroom check fails; nothing changes and the
    /// caller retries on a later tick. Requests while already standing succeed
    /// without doing anything.
    pub fn request_stand(&mut self, port: &dyn PhysicsQueryPort, body: &BodyState, filter: QueryFilter<'_>) -> bool {
        if !self.is_crouching {
            return true;
        }

        if !self.has_headroom(port, body, filter) {
            log::debug!("Stand refused: no headroom above {:?}", body.bottom());
            return false;
        }

        self.is_crouching = false;
        self.is_crouch_lerping = false;
        self.is_standing_lerping = true;
        self.stand_lerp_t = 0.0;
        self.from = self.snapshot();
        self.stand_speed_recovery_delay = self.config.stand_speed_hold_time;
        self.speed_recovery_t = 0.0;
        self.is_speed_recovering = true;
        true
    }

    /// Advance the lerps.
    pub fn tick(&mut self, delta_time: f32) -> CrouchGeometry {
        if self.is_crouch_lerping {
            self.crouch_lerp_t = advance(self.crouch_lerp_t, delta_time, self.config.crouch_down_duration);
            let t = self.crouch_lerp_t;
            self.height = lerp(self.from.height, self.profile.crouched_height, t);
            self.visual_scale = lerp(self.from.visual_scale, self.config.crouch_visual_scale, t);
            self.speed = lerp(self.from.speed, self.crouch_speed, t);
            if t >= 1.0 {
                self.is_crouch_lerping = false;
            }
        }

        if self.is_standing_lerping {
            self.stand_lerp_t = advance(self.stand_lerp_t, delta_time, self.config.stand_up_duration);
            let t = self.stand_lerp_t;
            self.height = lerp(self.from.height, self.profile.standing_height, t);
            self.visual_scale = lerp(self.from.visual_scale, 1.0, t);
            if t >= 1.0 {
                self.is_standing_lerping = false;
            }
        }

        if self.is_speed_recovering {
            let mut remaining = delta_time;
            if self.stand_speed_recovery_delay > 0.0 {
                let used = remaining.min(self.stand_speed_recovery_delay);
                self.stand_speed_recovery_delay -= used;
                remaining -= used;
                if self.stand_speed_recovery_delay <= LERP_SNAP {
                    self.stand_speed_recovery_delay = 0.0;
                }
            }

            if self.stand_speed_recovery_delay == 0.0 && remaining > 0.0 {
                self.speed_recovery_t = advance(self.speed_recovery_t, remaining, self.config.stand_up_duration);
                self.speed = lerp(self.from.speed, self.stand_speed, self.speed_recovery_t);
                if self.speed_recovery_t >= 1.0 {
                    self.is_speed_recovering = false;
                }
            }
        }

        self.geometry()
    }

    fn snapshot(&self) -> LerpStart {
        LerpStart {
            height: self.height,
            visual_scale: self.visual_scale,
            speed: self.speed,
        }
    }

    /// Probe the space between the current head and the standing head.
    fn has_headroom(&self, port: &dyn PhysicsQueryPort, body: &BodyState, filter: QueryFilter<'_>) -> bool {
        let radius = self.profile.radius - self.config.clearance_skin;
        if radius <= 0.0 {
            return true;
        }

        let up = body.up();
        let bottom = body.bottom();
        let r = self.profile.radius;
        let a = bottom + up * (self.height - r).max(r);
        let b = bottom + up * (self.profile.standing_height - r).max(r);

        !port.overlap_capsule(a, b, radius, filter)
    }
}

fn advance(t: f32, delta_time: f32, duration: f32) -> f32 {
    let next = if duration > 0.0 { t + delta_time / duration } else { 1.0 };
    if next >= 1.0 - LERP_SNAP {
        1.0
    } else {
        next
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    if t >= 1.0 {
        b
    } else {
        a + (b - a) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionWorld, LayerMask, RigidBody};

    const FRAME: f32 = 1.0 / 60.0;

    fn standing() -> CapsuleShape {
        CapsuleShape {
            radius: 0.3,
            height: 1.4,
            center: Vec3::new(0.0, 0.7, 0.0),
        }
    }

    fn controller() -> CrouchController {
        let config = CrouchConfig::default();
        let profile = CapsuleProfile::from_standing(standing(), config.crouch_height_ratio);
        CrouchController::new(config, profile, 3.0)
    }

    fn run(controller: &mut CrouchController, seconds: f32) -> CrouchGeometry {
        let mut geometry = controller.geometry();
        for _ in 0..((seconds / FRAME).ceil() as usize) {
            geometry = controller.tick(FRAME);
        }
        geometry
    }

    fn world_with_body(ceiling: Option<f32>) -> (CollisionWorld, BodyState) {
        let mut world = CollisionWorld::new();
        world.add_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(10.0, 0.5, 2.0), LayerMask::GROUND);
        if let Some(y) = ceiling {
            world.add_box(Vec3::new(0.0, y + 0.25, 0.0), Vec3::new(10.0, 0.25, 2.0), LayerMask::GROUND);
        }
        let handle = world.add_body(RigidBody::new(Vec3::new(0.0, 0.001, 0.0), standing()));
        let body = PhysicsQueryPort::body(&world, handle).expect("body");
        (world, body)
    }

    fn ground() -> QueryFilter<'static> {
        QueryFilter::new(LayerMask::GROUND)
    }

    #[test]
    fn test_profile_keeps_bottom() {
        let profile = CapsuleProfile::from_standing(standing(), 0.6);
        assert!((profile.crouched_height - 0.84).abs() < 1e-6);

        let crouched = profile.capsule_at(profile.crouched_height);
        assert!((crouched.bottom_offset().y - standing().bottom_offset().y).abs() < 1e-6);
    }

    #[test]
    fn test_crouch_reaches_exact_profile() {
        let mut controller = controller();
        controller.request_crouch();
        assert!(controller.is_crouch_lerping());

        let geometry = run(&mut controller, 0.2);
        assert!(!controller.is_crouch_lerping());
        assert_eq!(geometry.capsule.height, controller.profile().crouched_height);
        assert_eq!(geometry.visual_scale, 0.6);
        assert_eq!(geometry.base_speed, 1.5);
    }

    #[test]
    fn test_crouch_round_trip_restores_everything() {
        let (world, body) = world_with_body(None);
        let mut controller = controller();
        let original = controller.geometry();

        controller.request_crouch();
        run(&mut controller, 0.2);

        assert!(controller.request_stand(&world, &body, ground()));
        assert!(controller.is_standing_lerping());
        assert!(!controller.is_crouch_lerping());

        let config = CrouchConfig::default();
        let geometry = run(&mut controller, config.stand_up_duration + config.stand_speed_hold_time);
        assert_eq!(geometry, original);
    }

    #[test]
    fn test_speed_is_held_after_standing() {
        let (world, body) = world_with_body(None);
        let mut controller = controller();

        controller.request_crouch();
        run(&mut controller, 0.2);
        controller.request_stand(&world, &body, ground());

        // Geometry is back after stand_up_duration but speed has not moved yet
        let geometry = run(&mut controller, 0.2);
        assert_eq!(geometry.capsule.height, 1.4);
        assert_eq!(geometry.base_speed, 1.5);
    }

    #[test]
    fn test_low_ceiling_refuses_stand() {
        let (world, body) = world_with_body(Some(1.0));
        let mut controller = controller();

        controller.request_crouch();
        run(&mut controller, 0.2);

        assert!(!controller.request_stand(&world, &body, ground()));
        assert!(controller.is_crouching());
        assert!(!controller.is_standing_lerping());
    }

    #[test]
    fn test_crouch_cancels_stand_midway() {
        let (world, body) = world_with_body(None);
        let mut controller = controller();

        controller.request_crouch();
        run(&mut controller, 0.2);
        controller.request_stand(&world, &body, ground());
        let halfway = run(&mut controller, 0.1);

        controller.request_crouch();
        assert!(controller.is_crouch_lerping());
        assert!(!controller.is_standing_lerping());

        // The new lerp starts where the old one stopped
        let next = controller.tick(FRAME);
        assert!(next.capsule.height <= halfway.capsule.height);
        assert!(next.capsule.height > controller.profile().crouched_height);
    }

    #[test]
    fn test_stand_while_standing_is_noop() {
        let (world, body) = world_with_body(Some(1.0));
        let mut controller = controller();
        assert!(controller.request_stand(&world, &body, ground()));
        assert!(!controller.is_standing_lerping());
    }
}
