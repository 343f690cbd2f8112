//! Temporary speed penalties.
//!
//! Hazards and other external sources push slows with a lifetime. Slows do not
//! compound: the strongest active one (smallest multiplier) is the only one
//! that counts.

use serde::{Deserialize, Serialize};

/// Smallest multiplier a slow may carry.
pub const MIN_SLOW_MULTIPLIER: f32 = 0.01;

/// Identifies one slow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlowId(pub u64);

/// One active slow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlowEffect {
    pub id: SlowId,
    /// Speed scale in (0, 1].
    pub multiplier: f32,
    /// Seconds left.
    pub remaining: f32,
}

/// Active slows and their combined multiplier.
#[derive(Debug, Clone)]
pub struct SlowEffectStack {
    effects: Vec<SlowEffect>,
    effective: f32,
    next_id: u64,
}

impl Default for SlowEffectStack {
    fn default() -> Self {
        Self::new()
    }
}

impl SlowEffectStack {
    pub fn new() -> Self {
        Self {
            effects: Vec::new(),
            effective: 1.0,
            next_id: 0,
        }
    }

    /// Add a slow lasting `duration` seconds.
    ///
    /// Multipliers are clamped into (0, 1]. Non-finite values and
    /// non-positive durations are rejected.
    pub fn add_slow(&mut self, multiplier: f32, duration: f32) -> Option<SlowId> {
        if !multiplier.is_finite() || !duration.is_finite() || duration <= 0.0 {
            log::warn!("Ignoring slow {multiplier} for {duration}s");
            return None;
        }

        let id = SlowId(self.next_id);
        self.next_id += 1;
        self.effects.push(SlowEffect {
            id,
            multiplier: multiplier.clamp(MIN_SLOW_MULTIPLIER, 1.0),
            remaining: duration,
        });
        self.recalculate();

        log::debug!("Slow {:?} x{:.2} for {:.2}s, effective x{:.2}", id, multiplier, duration, self.effective);
        Some(id)
    }

    /// Count down lifetimes and drop expired slows.
    pub fn tick(&mut self, delta_time: f32) {
        if self.effects.is_empty() {
            return;
        }

        for effect in &mut self.effects {
            effect.remaining -= delta_time;
        }

        let before = self.effects.len();
        self.effects.retain(|e| e.remaining > 0.0);
        if self.effects.len() != before {
            self.recalculate();
            log::debug!("Slow expired, effective x{:.2}", self.effective);
        }
    }

    /// Remove a slow early. Returns false if it already expired.
    pub fn remove(&mut self, id: SlowId) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| e.id != id);
        let removed = self.effects.len() != before;
        if removed {
            self.recalculate();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.effects.clear();
        self.recalculate();
    }

    /// The strongest active slow, or 1.
    pub fn effective_multiplier(&self) -> f32 {
        self.effective
    }

    pub fn active(&self) -> &[SlowEffect] {
        &self.effects
    }

    fn recalculate(&mut self) {
        self.effective = self
            .effects
            .iter()
            .map(|e| e.multiplier)
            .fold(1.0, f32::min);
    }
}
