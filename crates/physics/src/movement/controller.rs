//! Locomotion controller.
//!
//! This is the main entry point for character movement. Each fixed tick it
//! senses the ground, runs either the ladder climb or ground/air movement,
//! writes the resulting velocity through the physics port, resolves the
//! discrete [`MovementState`], and queues edge events.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collision::{BodyHandle, LayerMask, QueryFilter};

use super::config::{ConfigError, LocomotionConfig};
use super::crouch::{CapsuleProfile, CrouchController, CrouchGeometry};
use super::events::{EventQueue, LocomotionEvent};
use super::ground::{world_up, GroundContact, GroundSensor, SurfaceKind};
use super::jump::{gravity_shaping, JumpState};
use super::ladder::{AttachOutcome, DetachReason, LadderClimber, LadderHandle, LadderSet};
use super::port::{BodyState, PhysicsQueryPort, PortError};
use super::slope::{SlopeSlideModel, SlopeState};
use super::slow::{SlowEffectStack, SlowId};
use super::state::{resolve_state, LocomotionInput, MovementState, StateInputs};

/// Ground closer than this holds the body against gravity.
const GROUND_SNAP_DISTANCE: f32 = 0.05;

/// Wall probe radius as a fraction of the capsule radius.
const WALL_PROBE_RADIUS: f32 = 0.95;

/// Why a controller could not be built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    #[error("invalid locomotion config: {0}")]
    Config(#[from] ConfigError),

    #[error("body {0:?} does not exist")]
    MissingBody(BodyHandle),
}

/// Read-only state published for animation, audio and camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub current_state: MovementState,
    pub is_grounded: bool,
    pub is_crouching: bool,
    pub facing_right: bool,
    /// Speed along the right axis over the current max speed, in [0, 1].
    pub horizontal_speed_normalized: f32,
    pub vertical_velocity: f32,
    /// Max speed after crouch, slows and the external multiplier.
    pub current_move_speed: f32,
    pub current_surface: SurfaceKind,
    /// Visual Y scale from crouching.
    pub visual_scale: f32,
    /// Ground angle in degrees, 0 when airborne.
    pub slope_angle: f32,
    pub is_slipping: bool,
}

/// Outcome of a ground/air tick.
struct MoveStep {
    grounded: bool,
    is_slipping: bool,
    stand_granted: bool,
    /// Part of the written velocity that only offsets the backend's gravity.
    gravity_compensation: Vec3,
}

/// Character locomotion.
///
/// # Example
///
/// ```ignore
/// let mut controller = LocomotionController::new(LocomotionConfig::default(), body, &world)?;
///
/// // Each fixed tick:
/// controller.tick(dt, &mut world, &ladders, &input);
/// world.step(dt);
/// for event in controller.drain_events() { /* ... */ }
/// ```
#[derive(Debug, Clone)]
pub struct LocomotionController {
    config: LocomotionConfig,
    body: BodyHandle,
    right: Vec3,

    sensor: GroundSensor,
    slope: SlopeSlideModel,
    jump: JumpState,
    crouch: CrouchController,
    slows: SlowEffectStack,
    ladder: LadderClimber,
    events: EventQueue,

    state: MovementState,
    contact: Option<GroundContact>,
    grounded: bool,
    /// Edge events need one tick of history.
    sensed_once: bool,
    is_slipping: bool,
    facing_right: bool,
    external_speed_multiplier: f32,
    telemetry: Telemetry,
    /// Warn once per outage, not every tick.
    body_missing: bool,
}

impl LocomotionController {
    /// Create a controller for an existing body.
    ///
    /// The body's current capsule becomes the standing profile.
    pub fn new(
        config: LocomotionConfig,
        body: BodyHandle,
        port: &dyn PhysicsQueryPort,
    ) -> Result<Self, ControllerError> {
        config.validate()?;
        let state = port.body(body).ok_or(ControllerError::MissingBody(body))?;

        let right = Vec3::new(config.movement.right_axis.x, 0.0, config.movement.right_axis.z).normalize();
        let profile = CapsuleProfile::from_standing(state.capsule, config.crouch.crouch_height_ratio);
        let crouch = CrouchController::new(config.crouch.clone(), profile, config.movement.move_speed);

        let telemetry = Telemetry {
            current_state: MovementState::Idle,
            is_grounded: false,
            is_crouching: false,
            facing_right: true,
            horizontal_speed_normalized: 0.0,
            vertical_velocity: 0.0,
            current_move_speed: config.movement.move_speed,
            current_surface: SurfaceKind::Wood,
            visual_scale: 1.0,
            slope_angle: 0.0,
            is_slipping: false,
        };

        Ok(Self {
            sensor: GroundSensor::new(config.ground.clone()),
            slope: SlopeSlideModel::new(config.slope.clone(), config.ground.max_walkable_slope),
            jump: JumpState::new(),
            crouch,
            slows: SlowEffectStack::new(),
            ladder: LadderClimber::new(config.ladder.clone(), right),
            events: EventQueue::new(),
            state: MovementState::Idle,
            contact: None,
            grounded: false,
            sensed_once: false,
            is_slipping: false,
            facing_right: true,
            external_speed_multiplier: 1.0,
            telemetry,
            body_missing: false,
            config,
            body,
            right,
        })
    }

    /// Advance one fixed tick.
    ///
    /// Call before stepping the physics backend so the velocity written here
    /// is integrated this tick.
    pub fn tick(
        &mut self,
        delta_time: f32,
        port: &mut dyn PhysicsQueryPort,
        ladders: &LadderSet,
        input: &LocomotionInput,
    ) {
        if !delta_time.is_finite() || delta_time <= 0.0 {
            log::warn!("Ignoring locomotion tick with dt={delta_time}");
            return;
        }

        // Clamp delta time to prevent physics explosions
        let delta_time = delta_time.min(self.config.movement.max_delta_time);

        let Some(body) = port.body(self.body) else {
            if !self.body_missing {
                log::warn!("Body {:?} is missing, skipping locomotion", self.body);
                self.body_missing = true;
            }
            return;
        };
        self.body_missing = false;

        self.slows.tick(delta_time);
        self.ladder.tick_cooldown(delta_time);

        if input.interact_pressed {
            self.events.push(LocomotionEvent::Interact);
        }

        let horizontal = input.horizontal_axis();
        let moving = input.has_horizontal_input(self.config.movement.input_dead_zone);
        if moving {
            self.facing_right = horizontal > 0.0;
        }

        let up = world_up(port.gravity());
        self.contact = self.sensor.sense(port, &body, &[]);

        let mut ladder_detach = None;
        let step = if self.ladder.is_attached() {
            ladder_detach = self.climb_ladder(delta_time, port, ladders, input);
            let geometry = self.crouch.tick(delta_time);
            self.apply_geometry(port, &body, &geometry);
            MoveStep {
                grounded: false,
                is_slipping: false,
                stand_granted: false,
                gravity_compensation: Vec3::ZERO,
            }
        } else {
            self.move_on_ground_or_air(delta_time, port, &body, input, up)
        };

        self.is_slipping = step.is_slipping;

        if self.sensed_once {
            if step.grounded && !self.grounded {
                self.events.push(LocomotionEvent::Land);
            } else if !step.grounded && self.grounded {
                self.events.push(LocomotionEvent::LeaveGround);
            }
        }
        self.grounded = step.grounded;
        self.sensed_once = true;

        let velocity =
            port.body(self.body).map(|b| b.velocity).unwrap_or(body.velocity) - step.gravity_compensation;

        let next = match ladder_detach {
            Some(DetachReason::JumpOff) => MovementState::Jumping,
            Some(_) if moving => MovementState::Walking,
            Some(_) => MovementState::Idle,
            None if step.stand_granted && step.grounded => MovementState::Idle,
            None => resolve_state(StateInputs {
                on_ladder: self.ladder.is_attached(),
                grounded: step.grounded,
                crouching: self.crouch.is_crouching(),
                moving,
                vertical_velocity: velocity.dot(up),
            }),
        };
        self.set_state(next);

        self.update_telemetry(velocity, up);
        log::trace!("Locomotion {:?}", self.telemetry);
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Apply a temporary slow.
    pub fn add_slow(&mut self, multiplier: f32, duration: f32) -> Option<SlowId> {
        self.slows.add_slow(multiplier, duration)
    }

    /// Scale speed on top of slows. Must be finite and non-negative.
    pub fn set_external_speed_multiplier(&mut self, multiplier: f32) {
        if multiplier.is_finite() && multiplier >= 0.0 {
            self.external_speed_multiplier = multiplier;
        } else {
            log::warn!("Ignoring external speed multiplier {multiplier}");
        }
    }

    /// Try to grab a ladder.
    pub fn try_attach_to_ladder(
        &mut self,
        port: &mut dyn PhysicsQueryPort,
        ladders: &LadderSet,
        ladder: LadderHandle,
    ) -> AttachOutcome {
        let outcome = self
            .ladder
            .try_attach(port, self.body, ladders, ladder, self.crouch.is_crouching());

        if outcome.is_attached() {
            self.slope.reset();
            self.jump.consume();
            self.events.push(LocomotionEvent::LadderAttached(ladder));
            self.set_state(MovementState::OnLadder);
        } else {
            log::debug!("Ladder attach refused: {:?}", outcome);
        }
        outcome
    }

    /// The host saw the body leave a ladder volume.
    pub fn notify_ladder_exit(&mut self, ladder: LadderHandle) {
        self.ladder.notify_exit(ladder);
    }

    /// Let go of the ladder. Returns false if not on one.
    pub fn detach_from_ladder(&mut self, port: &mut dyn PhysicsQueryPort) -> bool {
        if !self.ladder.detach(port, self.body) {
            return false;
        }
        self.events.push(LocomotionEvent::LadderDetached(DetachReason::Manual));
        self.set_state(MovementState::Idle);
        true
    }

    /// Take every event queued since the last drain.
    pub fn drain_events(&mut self) -> impl Iterator<Item = LocomotionEvent> + '_ {
        self.events.drain()
    }

    // ========================================================================
    // Telemetry
    // ========================================================================

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn current_state(&self) -> MovementState {
        self.state
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn is_crouching(&self) -> bool {
        self.crouch.is_crouching()
    }

    pub fn facing_right(&self) -> bool {
        self.facing_right
    }

    pub fn horizontal_speed_normalized(&self) -> f32 {
        self.telemetry.horizontal_speed_normalized
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.telemetry.vertical_velocity
    }

    /// Max speed after crouch, slows and the external multiplier.
    pub fn current_move_speed(&self) -> f32 {
        self.crouch.geometry().base_speed * self.slows.effective_multiplier() * self.external_speed_multiplier
    }

    pub fn current_surface(&self) -> SurfaceKind {
        self.telemetry.current_surface
    }

    pub fn is_slipping(&self) -> bool {
        self.is_slipping
    }

    pub fn ground_contact(&self) -> Option<&GroundContact> {
        self.contact.as_ref()
    }

    pub fn slope_state(&self) -> &SlopeState {
        self.slope.state()
    }

    pub fn jump_state(&self) -> &JumpState {
        &self.jump
    }

    pub fn crouch(&self) -> &CrouchController {
        &self.crouch
    }

    pub fn slows(&self) -> &SlowEffectStack {
        &self.slows
    }

    pub fn ladder(&self) -> &LadderClimber {
        &self.ladder
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    // ========================================================================
    // Ladder
    // ========================================================================

    fn climb_ladder(
        &mut self,
        delta_time: f32,
        port: &mut dyn PhysicsQueryPort,
        ladders: &LadderSet,
        input: &LocomotionInput,
    ) -> Option<DetachReason> {
        self.slope.reset();

        let reason = self.ladder.climb(delta_time, port, self.body, ladders, input).detached?;
        self.events.push(LocomotionEvent::LadderDetached(reason));
        if reason == DetachReason::JumpOff {
            self.jump.consume();
            self.events.push(LocomotionEvent::Jump);
        }
        Some(reason)
    }

    // ========================================================================
    // Ground and air movement
    // ========================================================================

    fn move_on_ground_or_air(
        &mut self,
        delta_time: f32,
        port: &mut dyn PhysicsQueryPort,
        body: &BodyState,
        input: &LocomotionInput,
        up: Vec3,
    ) -> MoveStep {
        let gravity = port.gravity();
        let contact = self.contact;

        let desired = self.right * input.horizontal_axis() * self.current_move_speed();
        let desired = self.project_against_walls(port, body, desired, delta_time, up);

        let slope = self.slope.update(delta_time, contact.as_ref(), desired, gravity);

        // Rising means leaving the ground plane upward, not walking up a ramp
        let vertical_speed = body.velocity.dot(up);
        let threshold = self.config.ground.rising_speed_threshold;
        let rising = vertical_speed > threshold
            && contact.map_or(true, |c| body.velocity.dot(c.normal) > threshold);
        let mut grounded = contact.is_some() && !slope.is_slipping && !rising;

        // Crouch is a level: held means crouch, released means try to stand
        let stand_granted = if input.crouch_held {
            self.crouch.request_crouch();
            false
        } else if self.crouch.is_crouching() {
            self.crouch.request_stand(port, body, self.sensor.filter(&[]))
        } else {
            false
        };
        let geometry = self.crouch.tick(delta_time);
        self.apply_geometry(port, body, &geometry);

        let jump = self
            .jump
            .update(&self.config.jump, delta_time, input.jump_pressed, grounded, slope.jump_blocked);

        // Depth drift is left to the body's constraints
        let along_right = self.right * body.velocity.dot(self.right);
        let depth = body.velocity - along_right - up * vertical_speed;

        let mut gravity_compensation = Vec3::ZERO;
        let mut velocity = match contact {
            _ if slope.is_slipping => {
                let fall = vertical_speed
                    .min(-self.config.slope.slip_fall_speed)
                    .min(slope.slide_velocity.dot(up));
                depth + up * fall
            }
            Some(contact) if grounded => {
                let planar = project_on_plane(slope.adjusted_horizontal, contact.normal);
                let mut v = depth + planar + slope.slide_velocity;
                if contact.distance <= GROUND_SNAP_DISTANCE {
                    // Cancel the gravity the backend is about to add
                    gravity_compensation = -gravity * delta_time;
                    v += gravity_compensation;
                } else {
                    v += up * vertical_speed.min(0.0);
                }
                v
            }
            _ => depth + slope.adjusted_horizontal + up * vertical_speed,
        };

        if jump.should_jump {
            let multiplier = if self.crouch.is_crouching() {
                self.config.jump.crouch_jump_multiplier
            } else {
                1.0
            };
            let force = self.config.jump.jump_force * multiplier;
            velocity = velocity - up * velocity.dot(up) + up * force;
            gravity_compensation = Vec3::ZERO;
            grounded = false;
            self.events.push(LocomotionEvent::Jump);
            log::debug!("Jump at {:.2} m/s", force);
        } else if jump.blocked {
            log::debug!("Jump discarded on steep slope");
        }

        if !grounded && !jump.should_jump {
            velocity += gravity_shaping(&self.config.jump, velocity.dot(up), input.jump_held, gravity) * delta_time;
        }

        log_port(port.set_velocity(self.body, velocity));

        MoveStep {
            grounded,
            is_slipping: slope.is_slipping,
            stand_granted,
            gravity_compensation,
        }
    }

    /// Clip desired movement against walls just ahead.
    fn project_against_walls(
        &self,
        port: &dyn PhysicsQueryPort,
        body: &BodyState,
        desired: Vec3,
        delta_time: f32,
        up: Vec3,
    ) -> Vec3 {
        let speed = desired.length();
        if speed < 1e-6 {
            return desired;
        }

        let direction = desired / speed;
        let center = body.position + body.capsule.center;
        let radius = body.capsule.radius * WALL_PROBE_RADIUS;
        let reach = speed * delta_time + self.config.movement.wall_probe_skin;
        let filter = QueryFilter::new(self.config.ground.ground_mask | LayerMask::BLOCKER);

        match port.sphere_cast(center, radius, direction, reach, filter) {
            Some(hit) if hit.normal.angle_between(up).to_degrees() >= self.config.movement.wall_angle => {
                let wall = (hit.normal - up * hit.normal.dot(up)).normalize_or_zero();
                desired - wall * desired.dot(wall).min(0.0)
            }
            _ => desired,
        }
    }

    fn apply_geometry(&self, port: &mut dyn PhysicsQueryPort, body: &BodyState, geometry: &CrouchGeometry) {
        if geometry.capsule != body.capsule {
            log_port(port.set_capsule(self.body, geometry.capsule));
        }
    }

    // ========================================================================
    // State
    // ========================================================================

    fn set_state(&mut self, next: MovementState) {
        if next == self.state {
            return;
        }
        log::debug!("State {:?} -> {:?}", self.state, next);
        self.events.push(LocomotionEvent::StateChanged {
            from: self.state,
            to: next,
        });
        self.state = next;
    }

    fn update_telemetry(&mut self, velocity: Vec3, up: Vec3) {
        let max_speed = self.current_move_speed();
        let along = velocity.dot(self.right).abs();
        let normalized = if max_speed > 1e-6 {
            (along / max_speed).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let (surface, angle) = match (&self.contact, self.grounded) {
            (Some(contact), true) => (contact.surface, contact.angle),
            (Some(contact), false) if self.is_slipping => (contact.surface, contact.angle),
            _ => (SurfaceKind::Wood, 0.0),
        };

        self.telemetry = Telemetry {
            current_state: self.state,
            is_grounded: self.grounded,
            is_crouching: self.crouch.is_crouching(),
            facing_right: self.facing_right,
            horizontal_speed_normalized: normalized,
            vertical_velocity: velocity.dot(up),
            current_move_speed: max_speed,
            current_surface: surface,
            visual_scale: self.crouch.geometry().visual_scale,
            slope_angle: angle,
            is_slipping: self.is_slipping,
        };
    }
}

/// Project `v` onto the plane with `normal`, keeping its length.
fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    let length = v.length();
    if length < 1e-6 {
        return Vec3::ZERO;
    }
    let projected = v - normal * v.dot(normal);
    projected.normalize_or_zero() * length
}

fn log_port(result: Result<(), PortError>) {
    if let Err(e) = result {
        log::warn!("Locomotion body update failed: {e}");
    }
}

// ============================================================================
// Tests
// ============================================================================
