//! Ladders and ladder climbing.
//!
//! A [`Ladder`] is pure geometry derived from a ladder box: a climb axis
//! through its middle (the spine), a front face, and a top. Ladders live in a
//! [`LadderSet`] and are referred to by generational [`LadderHandle`]s, so a
//! climber holding a handle to a removed ladder notices instead of touching a
//! stranger's ladder.
//!
//! The [`LadderClimber`] owns the attach/climb/detach protocol. While attached
//! it switches gravity off, locks rotation and depth, lets the body pass
//! through the ladder's colliders, and drives the body along the spine. Every
//! way of letting go restores what attaching changed.

use glam::{BVec3, Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::collision::{BodyConstraints, BodyHandle, ColliderHandle};

use super::config::LadderConfig;
use super::ground::world_up;
use super::port::{PhysicsQueryPort, PortError};
use super::state::LocomotionInput;

/// Vertical input needed to grab an [`AttachMode::UpInput`] ladder.
pub const UP_INPUT_ATTACH_THRESHOLD: f32 = 0.5;

/// Push-away input must point at least this much along the attach side.
const PUSH_AWAY_DOT: f32 = 0.5;

// ============================================================================
// Ladder geometry
// ============================================================================

/// How a character grabs a ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttachMode {
    /// Grab on touching the ladder volume.
    #[default]
    AutoOnEnter,
    /// Grab when pressing up inside the ladder volume.
    UpInput,
}

/// A climbable ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ladder {
    /// Reference point on the spine.
    pub base: Vec3,
    /// Climb direction (unit, upward).
    pub axis: Vec3,
    /// Outward normal of the climbable face (unit, perpendicular to `axis`).
    pub forward: Vec3,
    /// Half thickness of the ladder along `forward`.
    pub half_depth: f32,
    /// Half width of the ladder across `forward`.
    pub half_width: f32,
    /// Highest corner of the ladder bounds along `axis`.
    pub top_point: Vec3,
    /// Where a top step-off puts the feet, if not the default spot.
    pub top_exit: Option<Vec3>,
    pub attach_mode: AttachMode,
    /// Minimum cosine between `forward` and the approach direction.
    pub front_attach_dot_threshold: f32,
    /// Colliders a climber passes through while attached.
    pub colliders: Vec<ColliderHandle>,
    pub enabled: bool,
}

impl Ladder {
    /// Derive a ladder from a (possibly rotated) box.
    ///
    /// The box's most upward local axis becomes the climb axis. The front
    /// faces world ±X, picking the side that looks upward on leaning ladders.
    pub fn from_box(center: Vec3, half_extents: Vec3, rotation: Quat) -> Self {
        let basis = Mat3::from_quat(rotation);
        let local = [basis.x_axis, basis.y_axis, basis.z_axis];

        let mut axis = local[0];
        for candidate in &local[1..] {
            if candidate.dot(Vec3::Y).abs() > axis.dot(Vec3::Y).abs() {
                axis = *candidate;
            }
        }
        if axis.dot(Vec3::Y) < 0.0 {
            axis = -axis;
        }
        let axis = axis.normalize_or_zero();

        // World-space bounds of the rotated box
        let extents = basis.x_axis.abs() * half_extents.x
            + basis.y_axis.abs() * half_extents.y
            + basis.z_axis.abs() * half_extents.z;

        let forward = face_direction(Vec3::X, axis);
        let lateral = axis.cross(forward).normalize_or_zero();

        let mut top_point = center;
        let mut best = f32::NEG_INFINITY;
        for xi in [-1.0, 1.0] {
            for yi in [-1.0, 1.0] {
                for zi in [-1.0, 1.0] {
                    let corner = center + extents * Vec3::new(xi, yi, zi);
                    let d = corner.dot(axis);
                    if d > best {
                        best = d;
                        top_point = corner;
                    }
                }
            }
        }

        Self {
            base: center,
            axis,
            forward,
            half_depth: extents.dot(forward.abs()),
            half_width: extents.dot(lateral.abs()),
            top_point,
            top_exit: None,
            attach_mode: AttachMode::default(),
            front_attach_dot_threshold: 0.2,
            colliders: Vec::new(),
            enabled: true,
        }
    }

    /// Snap onto the spine through `point` instead of the box center.
    pub fn with_snap_point(mut self, point: Vec3) -> Self {
        self.base = point;
        self
    }

    /// Face the other way (or any direction, projected off the axis).
    pub fn with_forward(mut self, direction: Vec3) -> Self {
        let projected = (direction - self.axis * direction.dot(self.axis)).normalize_or_zero();
        if projected != Vec3::ZERO {
            self.forward = projected;
        }
        self
    }

    pub fn with_top_exit(mut self, exit: Vec3) -> Self {
        self.top_exit = Some(exit);
        self
    }

    pub fn with_attach_mode(mut self, mode: AttachMode) -> Self {
        self.attach_mode = mode;
        self
    }

    pub fn with_colliders(mut self, colliders: Vec<ColliderHandle>) -> Self {
        self.colliders = colliders;
        self
    }

    /// Signed distance of `point` along the climb axis from the base.
    pub fn along(&self, point: Vec3) -> f32 {
        (point - self.base).dot(self.axis)
    }

    /// Projection of `point` onto the spine.
    pub fn spine_point(&self, point: Vec3) -> Vec3 {
        self.base + self.axis * self.along(point)
    }

    /// Offset from the spine to `point`, perpendicular to the axis.
    pub fn planar_offset(&self, point: Vec3) -> Vec3 {
        point - self.spine_point(point)
    }

    /// Whether `point` is in front of the ladder.
    pub fn can_attach_from(&self, point: Vec3) -> bool {
        let planar = self.planar_offset(point);
        if planar.length_squared() < 1e-4 {
            return true;
        }
        self.forward.dot(planar.normalize()) >= self.front_attach_dot_threshold
    }

    /// Point `surface_offset` outside the face on `side`, level with `point`.
    pub fn snap_position(&self, point: Vec3, side: Vec3, surface_offset: f32) -> Vec3 {
        self.spine_point(point) + side * (self.half_depth + surface_offset)
    }

    /// Radius of the ladder's cross-section around the spine.
    pub fn lateral_radius(&self) -> f32 {
        self.half_depth.hypot(self.half_width)
    }

    /// Distance of the top along the axis.
    pub fn top_along(&self) -> f32 {
        self.along(self.top_point)
    }

    /// Whether entering the volume with this vertical input should grab.
    pub fn accepts_entry(&self, vertical_input: f32) -> bool {
        match self.attach_mode {
            AttachMode::AutoOnEnter => true,
            AttachMode::UpInput => vertical_input > UP_INPUT_ATTACH_THRESHOLD,
        }
    }
}

/// `hint` projected off `axis`, flipped to face upward on leaning ladders.
fn face_direction(hint: Vec3, axis: Vec3) -> Vec3 {
    let mut forward = hint - axis * hint.dot(axis);
    if forward.length_squared() < 1e-4 {
        forward = Vec3::Z - axis * axis.z;
    }
    let forward = forward.normalize_or_zero();

    if (-forward).dot(Vec3::Y) > forward.dot(Vec3::Y) {
        -forward
    } else {
        forward
    }
}

// ============================================================================
// Ladder storage
// ============================================================================

/// Generational reference to a ladder in a [`LadderSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LadderHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    ladder: Option<Ladder>,
}

/// All ladders in a level.
#[derive(Debug, Clone, Default)]
pub struct LadderSet {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl LadderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ladder: Ladder) -> LadderHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.ladder = Some(ladder);
            return LadderHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            ladder: Some(ladder),
        });
        LadderHandle { index, generation: 0 }
    }

    /// Remove a ladder. Outstanding handles to it go stale.
    pub fn remove(&mut self, handle: LadderHandle) -> Option<Ladder> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let ladder = slot.ladder.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Some(ladder)
    }

    pub fn get(&self, handle: LadderHandle) -> Option<&Ladder> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.ladder.as_ref())
    }

    pub fn get_mut(&mut self, handle: LadderHandle) -> Option<&mut Ladder> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.ladder.as_mut())
    }

    pub fn set_enabled(&mut self, handle: LadderHandle, enabled: bool) -> bool {
        match self.get_mut(handle) {
            Some(ladder) => {
                ladder.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// The ladder owning `collider`.
    pub fn find_by_collider(&self, collider: ColliderHandle) -> Option<LadderHandle> {
        self.iter()
            .find(|(_, ladder)| ladder.colliders.contains(&collider))
            .map(|(handle, _)| handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LadderHandle, &Ladder)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.ladder.as_ref().map(|ladder| {
                (
                    LadderHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    ladder,
                )
            })
        })
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A ladder that exists, is enabled, and still has its colliders.
fn usable<'a>(port: &dyn PhysicsQueryPort, ladders: &'a LadderSet, handle: LadderHandle) -> Option<&'a Ladder> {
    ladders
        .get(handle)
        .filter(|ladder| ladder.enabled && ladder.colliders.iter().all(|c| port.collider_enabled(*c)))
}

// ============================================================================
// Climbing
// ============================================================================

/// Where the climber is in the attach protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LadderPhase {
    Detached,
    /// Attached, with distance and push-away detaches suppressed.
    AttachGrace,
    Climbing,
}

/// Result of an attach attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachOutcome {
    Attached,
    AlreadyAttached,
    Crouching,
    /// Detached too recently.
    Cooldown,
    /// Handle is stale, or the ladder is disabled.
    InvalidLadder,
    /// Approached from behind the front face.
    WrongSide,
    MissingBody,
}

impl AttachOutcome {
    #[inline]
    pub fn is_attached(self) -> bool {
        self == Self::Attached
    }
}

/// Why the climber let go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetachReason {
    /// Requested by a caller.
    Manual,
    /// Drifted too far from the spine.
    LateralDistance,
    /// Pushed away from the ladder.
    PushAway,
    /// Jumped off.
    JumpOff,
    /// Climbed over the top.
    TopExit,
    /// The ladder was removed or disabled.
    LadderInvalid,
    /// The host reported the body left the ladder volume.
    LeftVolume,
}

/// Outcome of a climb tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClimbStep {
    /// Set when the climber let go this tick.
    pub detached: Option<DetachReason>,
}

/// What attaching changed, so detaching can put it back.
#[derive(Debug, Clone)]
struct Attachment {
    ladder: LadderHandle,
    axis: Vec3,
    /// Side of the ladder the body hangs on.
    side: Vec3,
    spine: Vec3,
    grace_timer: f32,
    ignored: Vec<ColliderHandle>,
    saved_gravity: bool,
    saved_constraints: BodyConstraints,
    saved_rotation: Quat,
    exit_reported: bool,
}

/// Attach/climb/detach protocol for one character.
#[derive(Debug, Clone)]
pub struct LadderClimber {
    config: LadderConfig,
    right_axis: Vec3,
    attachment: Option<Attachment>,
    reattach_cooldown: f32,
}

impl LadderClimber {
    pub fn new(config: LadderConfig, right_axis: Vec3) -> Self {
        Self {
            config,
            right_axis,
            attachment: None,
            reattach_cooldown: 0.0,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn phase(&self) -> LadderPhase {
        match &self.attachment {
            None => LadderPhase::Detached,
            Some(a) if a.grace_timer > 0.0 => LadderPhase::AttachGrace,
            Some(_) => LadderPhase::Climbing,
        }
    }

    pub fn attached_ladder(&self) -> Option<LadderHandle> {
        self.attachment.as_ref().map(|a| a.ladder)
    }

    pub fn climb_axis(&self) -> Option<Vec3> {
        self.attachment.as_ref().map(|a| a.axis)
    }

    /// Last spine point the body was projected to.
    pub fn spine_point(&self) -> Option<Vec3> {
        self.attachment.as_ref().map(|a| a.spine)
    }

    pub fn reattach_cooldown(&self) -> f32 {
        self.reattach_cooldown
    }

    /// Count down the reattach cooldown.
    pub fn tick_cooldown(&mut self, delta_time: f32) {
        self.reattach_cooldown = (self.reattach_cooldown - delta_time).max(0.0);
    }

    /// Try to grab a ladder.
    pub fn try_attach(
        &mut self,
        port: &mut dyn PhysicsQueryPort,
        body: BodyHandle,
        ladders: &LadderSet,
        handle: LadderHandle,
        crouching: bool,
    ) -> AttachOutcome {
        if self.attachment.is_some() {
            return AttachOutcome::AlreadyAttached;
        }
        if crouching {
            return AttachOutcome::Crouching;
        }
        if self.reattach_cooldown > 0.0 {
            return AttachOutcome::Cooldown;
        }
        let Some(ladder) = usable(port, ladders, handle) else {
            return AttachOutcome::InvalidLadder;
        };
        let Some(state) = port.body(body) else {
            return AttachOutcome::MissingBody;
        };

        let center = state.position + state.capsule.center;
        if !ladder.can_attach_from(center) {
            return AttachOutcome::WrongSide;
        }

        let planar = ladder.planar_offset(center);
        let side = if planar.dot(ladder.forward) < 0.0 {
            -ladder.forward
        } else {
            ladder.forward
        };

        let locks = BodyConstraints {
            freeze_position: BVec3::new(false, false, true),
            freeze_rotation: BVec3::TRUE,
        };
        log_port(port.set_gravity_enabled(body, false));
        log_port(port.set_constraints(body, state.constraints.union(locks)));
        let velocity = state.velocity - ladder.axis * state.velocity.dot(ladder.axis);
        log_port(port.set_velocity(body, velocity));

        let mut ignored = Vec::with_capacity(ladder.colliders.len());
        for &collider in &ladder.colliders {
            match port.set_collision_ignored(body, collider, true) {
                Ok(()) => ignored.push(collider),
                Err(e) => log::warn!("Ladder collider not ignored: {e}"),
            }
        }

        self.attachment = Some(Attachment {
            ladder: handle,
            axis: ladder.axis,
            side,
            spine: ladder.spine_point(center),
            grace_timer: self.config.attach_grace_time,
            ignored,
            saved_gravity: state.gravity_enabled,
            saved_constraints: state.constraints,
            saved_rotation: state.rotation,
            exit_reported: false,
        });

        log::debug!("Attached to ladder {:?} on side {:?}", handle, side);
        AttachOutcome::Attached
    }

    /// The host saw the body leave a ladder volume.
    pub fn notify_exit(&mut self, handle: LadderHandle) {
        if let Some(attachment) = self.attachment.as_mut() {
            if attachment.ladder == handle {
                attachment.exit_reported = true;
            }
        }
    }

    /// Let go. Returns false if not attached.
    pub fn detach(&mut self, port: &mut dyn PhysicsQueryPort, body: BodyHandle) -> bool {
        self.release(port, body, DetachReason::Manual).is_some()
    }

    /// One tick on the ladder.
    pub fn climb(
        &mut self,
        delta_time: f32,
        port: &mut dyn PhysicsQueryPort,
        body: BodyHandle,
        ladders: &LadderSet,
        input: &LocomotionInput,
    ) -> ClimbStep {
        let Some(attachment) = self.attachment.as_mut() else {
            return ClimbStep::default();
        };
        attachment.grace_timer = (attachment.grace_timer - delta_time).max(0.0);
        let in_grace = attachment.grace_timer > 0.0;
        let side = attachment.side;
        let handle = attachment.ladder;
        let exit_reported = std::mem::take(&mut attachment.exit_reported);

        let Some(ladder) = usable(port, ladders, handle) else {
            log::debug!("Ladder {:?} went away", handle);
            return self.detach_step(port, body, DetachReason::LadderInvalid);
        };
        let Some(state) = port.body(body) else {
            return ClimbStep::default();
        };

        let center = state.position + state.capsule.center;
        let radius = state.capsule.radius;
        let vertical = input.vertical_axis();

        if input.jump_pressed {
            self.release(port, body, DetachReason::JumpOff);
            let up = world_up(port.gravity());
            let launch = side * self.config.jump_off_horizontal + up * self.config.jump_off_vertical;
            log_port(port.set_velocity(body, launch));
            return ClimbStep {
                detached: Some(DetachReason::JumpOff),
            };
        }

        if vertical > 0.0 && ladder.along(center) >= ladder.top_along() - self.config.top_exit_distance {
            let exit = ladder.top_exit.unwrap_or_else(|| {
                let top = ladder.base + ladder.axis * ladder.top_along();
                top - side * (ladder.half_depth + radius + self.config.top_step_forward)
            });
            let step = self.detach_step(port, body, DetachReason::TopExit);
            log_port(port.set_position(body, exit - state.capsule.bottom_offset()));
            return step;
        }

        if !in_grace {
            if exit_reported {
                return self.detach_step(port, body, DetachReason::LeftVolume);
            }

            let reach = ladder.lateral_radius() + radius + self.config.padding;
            if ladder.planar_offset(center).length() > reach {
                return self.detach_step(port, body, DetachReason::LateralDistance);
            }

            let horizontal = input.horizontal_axis();
            if horizontal.abs() > self.config.push_away_threshold
                && (self.right_axis * horizontal.signum()).dot(side) > PUSH_AWAY_DOT
            {
                return self.detach_step(port, body, DetachReason::PushAway);
            }
        }

        // Pull toward the face, level with the current height
        let spine = ladder.spine_point(center);
        let target = ladder.snap_position(center, side, radius + self.config.padding);
        let blend = 1.0 - (-self.config.snap_speed * delta_time).exp();
        let snapped = center + (target - center) * blend;
        log_port(port.set_position(body, snapped - state.capsule.center));

        let upright = Quat::from_rotation_arc(Vec3::Y, ladder.axis);
        let turn = 1.0 - (-self.config.rotation_speed * delta_time).exp();
        log_port(port.set_rotation(body, state.rotation.slerp(upright, turn)));

        log_port(port.set_velocity(body, ladder.axis * vertical * self.config.climb_speed));

        if let Some(attachment) = self.attachment.as_mut() {
            attachment.spine = spine;
        }

        ClimbStep::default()
    }

    fn detach_step(&mut self, port: &mut dyn PhysicsQueryPort, body: BodyHandle, reason: DetachReason) -> ClimbStep {
        ClimbStep {
            detached: self.release(port, body, reason),
        }
    }

    /// Undo everything attaching changed.
    fn release(
        &mut self,
        port: &mut dyn PhysicsQueryPort,
        body: BodyHandle,
        reason: DetachReason,
    ) -> Option<DetachReason> {
        let attachment = self.attachment.take()?;

        log_port(port.set_gravity_enabled(body, attachment.saved_gravity));
        log_port(port.set_constraints(body, attachment.saved_constraints));
        log_port(port.set_rotation(body, attachment.saved_rotation));

        for collider in attachment.ignored {
            if let Err(e) = port.set_collision_ignored(body, collider, false) {
                log::debug!("Ladder collider already gone: {e}");
            }
        }

        if let Some(state) = port.body(body) {
            let along = attachment.axis * state.velocity.dot(attachment.axis);
            log_port(port.set_velocity(body, state.velocity - along));
        }

        self.reattach_cooldown = self.config.reattach_cooldown;
        log::debug!("Detached from ladder {:?}: {:?}", attachment.ladder, reason);
        Some(reason)
    }
}

fn log_port(result: Result<(), PortError>) {
    if let Err(e) = result {
        log::warn!("Ladder body update failed: {e}");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CapsuleShape, CollisionWorld, LayerMask, RigidBody};

    const FRAME: f32 = 1.0 / 60.0;

    struct Rig {
        world: CollisionWorld,
        body: BodyHandle,
        ladders: LadderSet,
        ladder: LadderHandle,
        climber: LadderClimber,
    }

    /// Floor, a 4m vertical ladder at x=0 facing +X, and a body in front of it.
    fn rig(body_position: Vec3) -> Rig {
        rig_with(body_position, LayerMask::LADDER, |ladder| ladder)
    }

    fn rig_with(body_position: Vec3, rail_layer: LayerMask, configure: impl FnOnce(Ladder) -> Ladder) -> Rig {
        let mut world = CollisionWorld::new();
        world.add_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(10.0, 0.5, 2.0), LayerMask::GROUND);
        let rail = world.add_box(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.1, 2.0, 0.4), rail_layer);

        let capsule = CapsuleShape {
            radius: 0.3,
            height: 1.4,
            center: Vec3::new(0.0, 0.7, 0.0),
        };
        let body = world.add_body(RigidBody::new(body_position, capsule));

        let mut ladders = LadderSet::new();
        let ladder = ladders.insert(configure(
            Ladder::from_box(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.1, 2.0, 0.4), Quat::IDENTITY)
                .with_colliders(vec![rail]),
        ));

        Rig {
            world,
            body,
            ladders,
            ladder,
            climber: LadderClimber::new(LadderConfig::default(), Vec3::X),
        }
    }

    impl Rig {
        fn attach(&mut self) -> AttachOutcome {
            self.climber
                .try_attach(&mut self.world, self.body, &self.ladders, self.ladder, false)
        }

        fn climb(&mut self, input: LocomotionInput) -> ClimbStep {
            self.climber
                .climb(FRAME, &mut self.world, self.body, &self.ladders, &input)
        }

        fn body(&self) -> &RigidBody {
            self.world.body(self.body).expect("body")
        }

        /// Push the body along X without climbing, returning where it ends up.
        fn shove(&mut self, speed: f32, ticks: usize) -> f32 {
            for _ in 0..ticks {
                let body = self.world.body_mut(self.body).expect("body");
                body.velocity.x = speed;
                self.world.step(FRAME);
            }
            self.body().position.x
        }
    }

    fn up() -> LocomotionInput {
        LocomotionInput {
            vertical: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_vertical_box_geometry() {
        let ladder = Ladder::from_box(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.1, 2.0, 0.4), Quat::IDENTITY);

        assert_eq!(ladder.axis, Vec3::Y);
        assert_eq!(ladder.forward, Vec3::X);
        assert!((ladder.half_depth - 0.1).abs() < 1e-6);
        assert!((ladder.half_width - 0.4).abs() < 1e-6);
        assert!((ladder.top_along() - 2.0).abs() < 1e-6);
        assert!(ladder.can_attach_from(Vec3::new(0.6, 1.0, 0.0)));
        assert!(!ladder.can_attach_from(Vec3::new(-0.6, 1.0, 0.0)));
    }

    #[test]
    fn test_leaning_ladder_faces_up() {
        // Lean the top toward -X; the +X face now looks upward
        let lean = Quat::from_rotation_z(20f32.to_radians());
        let ladder = Ladder::from_box(Vec3::ZERO, Vec3::new(0.1, 2.0, 0.4), lean);

        assert!(ladder.axis.y > 0.9);
        assert!(ladder.axis.x < 0.0);
        assert!(ladder.forward.y > 0.0);
        assert!(ladder.forward.dot(ladder.axis).abs() < 1e-5);
        assert!(ladder.top_point.y > 1.8);
    }

    #[test]
    fn test_stale_handles_do_not_resolve() {
        let mut set = LadderSet::new();
        let ladder = Ladder::from_box(Vec3::ZERO, Vec3::ONE, Quat::IDENTITY);
        let first = set.insert(ladder.clone());

        assert!(set.remove(first).is_some());
        assert!(set.remove(first).is_none());

        let second = set.insert(ladder);
        assert!(set.get(first).is_none());
        assert!(set.get(second).is_some());
        assert_ne!(first, second);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_up_input_mode_needs_up() {
        let ladder = Ladder::from_box(Vec3::ZERO, Vec3::ONE, Quat::IDENTITY).with_attach_mode(AttachMode::UpInput);
        assert!(!ladder.accepts_entry(0.0));
        assert!(ladder.accepts_entry(1.0));
    }

    #[test]
    fn test_attach_configures_body_and_is_idempotent() {
        let mut rig = rig(Vec3::new(0.6, 0.0, 0.0));
        rig.world.body_mut(rig.body).expect("body").velocity = Vec3::new(1.0, -2.0, 0.0);

        assert_eq!(rig.attach(), AttachOutcome::Attached);
        assert_eq!(rig.climber.phase(), LadderPhase::AttachGrace);

        let body = rig.body();
        assert!(!body.gravity_enabled);
        assert_eq!(body.velocity.y, 0.0);
        assert_eq!(body.constraints.freeze_rotation, BVec3::TRUE);
        assert_eq!(body.ignored.len(), 1);

        assert_eq!(rig.attach(), AttachOutcome::AlreadyAttached);
        assert_eq!(rig.body().ignored.len(), 1);
    }

    #[test]
    fn test_attach_rejections() {
        let mut rig = rig(Vec3::new(-0.6, 0.0, 0.0));
        assert_eq!(rig.attach(), AttachOutcome::WrongSide);

        let mut rig = self::rig(Vec3::new(0.6, 0.0, 0.0));
        let outcome = rig
            .climber
            .try_attach(&mut rig.world, rig.body, &rig.ladders, rig.ladder, true);
        assert_eq!(outcome, AttachOutcome::Crouching);

        rig.ladders.set_enabled(rig.ladder, false);
        assert_eq!(rig.attach(), AttachOutcome::InvalidLadder);
    }

    #[test]
    fn test_detach_restores_and_strips_axis_velocity() {
        let mut rig = rig(Vec3::new(0.6, 0.0, 0.0));
        let before = rig.body().clone();

        rig.attach();
        for _ in 0..20 {
            rig.climb(up());
        }
        assert!(rig.body().velocity.y > 0.0);

        assert!(rig.climber.detach(&mut rig.world, rig.body));
        assert!(!rig.climber.detach(&mut rig.world, rig.body));

        let body = rig.body();
        assert_eq!(body.velocity.y, 0.0);
        assert_eq!(body.gravity_enabled, before.gravity_enabled);
        assert_eq!(body.constraints, before.constraints);
        assert_eq!(body.rotation, before.rotation);
        assert!(body.ignored.is_empty());

        assert_eq!(rig.attach(), AttachOutcome::Cooldown);
    }

    #[test]
    fn test_climb_snaps_to_face_and_moves_along_axis() {
        let mut rig = rig(Vec3::new(0.8, 0.0, 0.0));
        rig.attach();

        for _ in 0..60 {
            rig.climb(up());
            rig.world.step(FRAME);
        }

        let body = rig.body();
        // Face at 0.1, plus radius 0.3, plus padding 0.05
        assert!((body.position.x - 0.45).abs() < 0.01, "x={}", body.position.x);
        assert!(body.position.y > 2.0);
        assert_eq!(rig.climber.phase(), LadderPhase::Climbing);
    }

    #[test]
    fn test_snap_point_moves_the_spine() {
        let mut rig = rig_with(Vec3::new(0.8, 0.0, 0.0), LayerMask::LADDER, |ladder| {
            ladder.with_snap_point(Vec3::new(0.2, 2.0, 0.0))
        });
        assert_eq!(rig.attach(), AttachOutcome::Attached);

        for _ in 0..60 {
            rig.climb(up());
            rig.world.step(FRAME);
        }

        // Spine at 0.2, plus half depth, radius and padding
        let body = rig.body();
        assert!((body.position.x - 0.65).abs() < 0.01, "x={}", body.position.x);
        assert!(body.position.y > 2.0);
    }

    #[test]
    fn test_attached_body_passes_through_solid_rails() {
        let mut rig = rig_with(Vec3::new(0.6, 0.01, 0.0), LayerMask::GROUND, |ladder| ladder);

        // Face at 0.1 plus radius 0.3
        let x = rig.shove(-3.0, 30);
        assert!(x > 0.39, "walked into the rail: x={x}");

        rig.world.body_mut(rig.body).expect("body").position = Vec3::new(0.6, 0.01, 0.0);
        assert_eq!(rig.attach(), AttachOutcome::Attached);
        let x = rig.shove(-3.0, 30);
        assert!(x < -0.5, "blocked while attached: x={x}");

        assert!(rig.climber.detach(&mut rig.world, rig.body));
        let x = rig.shove(3.0, 30);
        assert!(x < -0.39, "passed through after detaching: x={x}");
    }

    #[test]
    fn test_grace_suppresses_push_away() {
        let mut rig = rig(Vec3::new(0.6, 0.0, 0.0));
        rig.attach();

        let away = LocomotionInput {
            horizontal: 1.0,
            ..Default::default()
        };
        assert_eq!(rig.climb(away).detached, None);

        for _ in 0..20 {
            rig.climb(LocomotionInput::default());
        }
        assert_eq!(rig.climb(away).detached, Some(DetachReason::PushAway));
    }

    #[test]
    fn test_pushing_toward_ladder_does_not_detach() {
        let mut rig = rig(Vec3::new(0.6, 0.0, 0.0));
        rig.attach();
        for _ in 0..20 {
            rig.climb(LocomotionInput::default());
        }

        let into = LocomotionInput {
            horizontal: -1.0,
            ..Default::default()
        };
        assert_eq!(rig.climb(into).detached, None);
    }

    #[test]
    fn test_jump_off_launches_outward() {
        let mut rig = rig(Vec3::new(0.6, 0.5, 0.0));
        rig.attach();

        let jump = LocomotionInput {
            jump_pressed: true,
            ..Default::default()
        };
        assert_eq!(rig.climb(jump).detached, Some(DetachReason::JumpOff));

        let body = rig.body();
        assert!(body.gravity_enabled);
        assert!(body.velocity.x > 0.0);
        assert!(body.velocity.y > 0.0);
    }

    #[test]
    fn test_top_exit_steps_over() {
        let mut rig = rig(Vec3::new(0.45, 3.1, 0.0));
        rig.attach();

        assert_eq!(rig.climb(up()).detached, Some(DetachReason::TopExit));

        let body = rig.body();
        assert!((body.position - Vec3::new(-0.8, 4.0, 0.0)).length() < 1e-4);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn test_disabled_ladder_detaches_implicitly() {
        let mut rig = rig(Vec3::new(0.6, 0.0, 0.0));
        rig.attach();

        rig.ladders.set_enabled(rig.ladder, false);
        assert_eq!(rig.climb(up()).detached, Some(DetachReason::LadderInvalid));
        assert!(rig.body().gravity_enabled);
    }

    #[test]
    fn test_exit_notification_waits_for_grace() {
        let mut rig = rig(Vec3::new(0.6, 0.0, 0.0));
        rig.attach();

        rig.climber.notify_exit(rig.ladder);
        assert_eq!(rig.climb(LocomotionInput::default()).detached, None);

        for _ in 0..20 {
            rig.climb(LocomotionInput::default());
        }
        rig.climber.notify_exit(rig.ladder);
        assert_eq!(
            rig.climb(LocomotionInput::default()).detached,
            Some(DetachReason::LeftVolume)
        );
    }
}
