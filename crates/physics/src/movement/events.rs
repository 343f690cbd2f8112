//! Edge-triggered locomotion events.
//!
//! The controller pushes events while it ticks; collaborators (audio,
//! animation, game progress) drain the queue once per tick.

use serde::{Deserialize, Serialize};

use super::ladder::{DetachReason, LadderHandle};
use super::state::MovementState;

/// Something that happened during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocomotionEvent {
    /// A jump launched, from the ground or off a ladder.
    Jump,
    /// Became grounded.
    Land,
    /// Stopped being grounded.
    LeaveGround,
    /// Interact was pressed.
    Interact,
    /// The discrete state changed.
    StateChanged {
        from: MovementState,
        to: MovementState,
    },
    /// Grabbed a ladder.
    LadderAttached(LadderHandle),
    /// Let go of a ladder.
    LadderDetached(DetachReason),
}

/// FIFO of events waiting to be drained.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<LocomotionEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: LocomotionEvent) {
        log::trace!("Event {:?}", event);
        self.events.push(event);
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = LocomotionEvent> + '_ {
        self.events.drain(..)
    }

    pub fn pending(&self) -> &[LocomotionEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
