//! Game simulation - the fixed-step loop around the locomotion controller.
//!
//! Each tick the simulation plays the collaborators the controller expects
//! from its host: ladder trigger volumes, hazard pads, stepping the physics
//! world, and draining events.

use std::collections::HashMap;

use caboose_physics::collision::{BodyHandle, CapsuleShape, ColliderHandle, LayerMask, QueryFilter, RigidBody, TraceShape};
use caboose_physics::movement::{
    AttachMode, ControllerError, LadderHandle, LocomotionConfig, LocomotionController, LocomotionEvent,
    LocomotionInput,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input::{InputSampler, PlayerInput};
use crate::level::Level;

/// Why a simulation could not be built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("tick rate must be positive")]
    InvalidTickRate,

    #[error("max ticks per frame must be positive")]
    InvalidTickBudget,

    #[error(transparent)]
    Controller(#[from] ControllerError),
}

/// Game simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulation tick rate (ticks per second).
    pub tick_rate: u32,

    /// Ticks run at most per frame; leftover time is dropped.
    pub max_ticks_per_frame: u32,

    /// Character collision capsule.
    pub capsule: CapsuleShape,

    /// Locomotion tuning.
    pub locomotion: LocomotionConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            max_ticks_per_frame: 5,
            capsule: CapsuleShape {
                radius: 0.3,
                height: 1.4,
                center: Vec3::new(0.0, 0.7, 0.0),
            },
            locomotion: LocomotionConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Get the time step per tick in seconds.
    pub fn delta_time(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.tick_rate == 0 {
            return Err(SimulationError::InvalidTickRate);
        }
        if self.max_ticks_per_frame == 0 {
            return Err(SimulationError::InvalidTickBudget);
        }
        Ok(())
    }
}

/// The main game simulation.
#[derive(Debug)]
pub struct Simulation {
    /// Current frame/tick number.
    pub frame: u64,

    /// Simulation configuration.
    pub config: SimulationConfig,

    /// Current level.
    pub level: Level,

    body: BodyHandle,
    controller: LocomotionController,
    sampler: InputSampler,

    /// Unsimulated time carried between frames.
    accumulator: f32,

    /// Ladder volumes the body overlapped last tick.
    ladders_inside: Vec<LadderHandle>,

    /// Seconds until each hazard pad can slow again.
    hazard_cooldowns: HashMap<ColliderHandle, f32>,

    /// Events not yet handed to the host.
    events: Vec<LocomotionEvent>,
}

impl Simulation {
    /// Create a new simulation with the character at the level's spawn.
    pub fn new(config: SimulationConfig, mut level: Level) -> Result<Self, SimulationError> {
        config.validate()?;

        let body = level
            .collision
            .add_body(RigidBody::new(level.spawn.position, config.capsule));
        let controller = LocomotionController::new(config.locomotion.clone(), body, &level.collision)?;

        log::info!("Simulation started in {} at {:?}", level.name, level.spawn.position);

        Ok(Self {
            frame: 0,
            config,
            level,
            body,
            controller,
            sampler: InputSampler::new(),
            accumulator: 0.0,
            ladders_inside: Vec::new(),
            hazard_cooldowns: HashMap::new(),
            events: Vec::new(),
        })
    }

    /// Create a simulation with default configuration and the test yard.
    pub fn test() -> Result<Self, SimulationError> {
        Self::new(SimulationConfig::default(), Level::test_yard())
    }

    /// Feed one rendered frame. Runs as many fixed ticks as the elapsed time
    /// covers, up to the per-frame budget. Returns the ticks run.
    pub fn advance(&mut self, frame_time: f32, input: &PlayerInput) -> u32 {
        self.sampler.sample(input);
        self.events.clear();

        if !frame_time.is_finite() || frame_time < 0.0 {
            log::warn!("Ignoring frame time {frame_time}");
            return 0;
        }

        let delta_time = self.config.delta_time();
        self.accumulator += frame_time;

        let mut events = Vec::new();
        let mut ticks = 0;
        while self.accumulator >= delta_time && ticks < self.config.max_ticks_per_frame {
            let tick_input = self.sampler.take_tick_input();
            self.tick(&tick_input);
            events.append(&mut self.events);
            self.accumulator -= delta_time;
            ticks += 1;
        }
        self.events = events;

        if self.accumulator >= delta_time {
            log::debug!("Dropping {:.3}s of simulation time", self.accumulator);
            self.accumulator %= delta_time;
        }

        ticks
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self, input: &LocomotionInput) {
        let delta_time = self.config.delta_time();
        self.events.clear();

        self.update_ladder_volumes(input);
        self.update_hazards(delta_time);

        self.controller
            .tick(delta_time, &mut self.level.collision, &self.level.ladders, input);
        self.level.collision.step(delta_time);

        for event in self.controller.drain_events() {
            log::debug!("Frame {}: {:?}", self.frame, event);
            self.events.push(event);
        }

        self.frame += 1;
    }

    /// Get the delta time for this simulation.
    pub fn delta_time(&self) -> f32 {
        self.config.delta_time()
    }

    pub fn controller(&self) -> &LocomotionController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut LocomotionController {
        &mut self.controller
    }

    /// Feet position of the character.
    pub fn position(&self) -> Vec3 {
        self.level
            .collision
            .body(self.body)
            .map(|b| b.position)
            .unwrap_or(self.level.spawn.position)
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// Events from the most recent [`tick`](Self::tick), or from every tick
    /// of the most recent [`advance`](Self::advance).
    pub fn events(&self) -> &[LocomotionEvent] {
        &self.events
    }

    // ========================================================================
    // Trigger volumes
    // ========================================================================

    /// Colliders on `layers` the character's capsule overlaps.
    fn overlapping(&self, layers: LayerMask) -> Vec<ColliderHandle> {
        let Some(body) = self.level.collision.body(self.body) else {
            return Vec::new();
        };
        let shape = TraceShape::Capsule {
            radius: body.capsule.radius,
            height: body.capsule.height,
        };
        self.level
            .collision
            .overlapping(body.bottom(), shape, QueryFilter::new(layers))
    }

    fn update_ladder_volumes(&mut self, input: &LocomotionInput) {
        let mut inside: Vec<LadderHandle> = Vec::new();
        for collider in self.overlapping(LayerMask::LADDER) {
            if let Some(handle) = self.level.ladders.find_by_collider(collider) {
                if !inside.contains(&handle) {
                    inside.push(handle);
                }
            }
        }

        for &handle in &self.ladders_inside {
            if !inside.contains(&handle) {
                self.controller.notify_ladder_exit(handle);
            }
        }

        for &handle in &inside {
            if self.controller.ladder().is_attached() {
                break;
            }
            let Some(ladder) = self.level.ladders.get(handle) else {
                continue;
            };

            let entered = !self.ladders_inside.contains(&handle);
            let wants = match ladder.attach_mode {
                AttachMode::AutoOnEnter => entered,
                AttachMode::UpInput => ladder.accepts_entry(input.vertical_axis()),
            };
            if wants {
                let outcome =
                    self.controller
                        .try_attach_to_ladder(&mut self.level.collision, &self.level.ladders, handle);
                log::debug!("Ladder {:?} entry: {:?}", handle, outcome);
            }
        }

        self.ladders_inside = inside;
    }

    fn update_hazards(&mut self, delta_time: f32) {
        for remaining in self.hazard_cooldowns.values_mut() {
            *remaining = (*remaining - delta_time).max(0.0);
        }
        self.hazard_cooldowns.retain(|_, remaining| *remaining > 0.0);

        for collider in self.overlapping(LayerMask::HAZARD) {
            if self.hazard_cooldowns.contains_key(&collider) {
                continue;
            }
            let Some(pad) = self.level.hazard(collider).copied() else {
                continue;
            };
            if self.controller.add_slow(pad.multiplier, pad.duration).is_some() {
                log::debug!("Hazard {:?} slowed to {:.2} for {:.2}s", collider, pad.multiplier, pad.duration);
            }
            self.hazard_cooldowns.insert(collider, pad.cooldown);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
