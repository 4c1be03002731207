//! Pour simulation.
//!
//! A pour is modelled as a fixed, ordered profile of weight increments
//! (grams).  Once armed, the [`PourSimulator`] releases one increment per
//! elapsed interval and keeps a running total.  It never sleeps: the
//! caller supplies the current time on every [`advance`](PourSimulator::advance)
//! and the simulator compares it against the last emission.
//!
//! ```text
//!  arm(t0) ──▶ advance(t < t0+Δ)  → None
//!              advance(t ≥ t0+Δ)  → Some(reading #0)
//!              ...
//!              advance(...)       → Some(reading #n-1, finished)
//!              advance(...)       → None (until re-armed)
//! ```

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Upper bound on the number of increments in one profile.
pub const MAX_INCREMENTS: usize = 64;

/// Profile used when no configuration overrides it.
pub const DEFAULT_INCREMENTS: [f64; 4] = [2.3, 3.1, 1.2, 4.7];

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// The simulated "physical" pour: an ordered, non-empty sequence of
/// positive increments.  Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct PourProfile {
    increments: heapless::Vec<f64, MAX_INCREMENTS>,
}

impl PourProfile {
    /// Validate and copy `increments` into a profile.
    pub fn new(increments: &[f64]) -> Result<Self, ConfigError> {
        if increments.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "pour profile must contain at least one increment",
            ));
        }
        if increments.iter().any(|g| !g.is_finite() || *g <= 0.0) {
            return Err(ConfigError::ValidationFailed(
                "pour increments must be finite and greater than zero",
            ));
        }
        let increments = heapless::Vec::from_slice(increments).map_err(|_| {
            ConfigError::ValidationFailed("pour profile exceeds 64 increments")
        })?;
        Ok(Self { increments })
    }

    pub fn len(&self) -> usize {
        self.increments.len()
    }

    /// Always `false` for a validated profile.
    pub fn is_empty(&self) -> bool {
        self.increments.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.increments
    }
}

impl Default for PourProfile {
    fn default() -> Self {
        Self {
            increments: heapless::Vec::from_slice(&DEFAULT_INCREMENTS)
                .unwrap_or_default(),
        }
    }
}

impl TryFrom<Vec<f64>> for PourProfile {
    type Error = ConfigError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<PourProfile> for Vec<f64> {
    fn from(profile: PourProfile) -> Self {
        profile.increments.to_vec()
    }
}

// ---------------------------------------------------------------------------
// Progress cursor
// ---------------------------------------------------------------------------

/// Mutable cursor over a [`PourProfile`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PourProgress {
    /// Index of the next increment to emit.
    pub index: usize,
    /// Sum of the increments emitted since the pour was armed.
    pub total: f64,
    /// Time of the last emission (or of arming), in milliseconds.
    pub last_emit_ms: u64,
    /// True while a pour is in flight.
    pub active: bool,
}

/// One emitted increment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PourReading {
    /// Zero-based position of this increment in the profile.
    pub index: usize,
    /// Weight added by this increment (g).
    pub increment: f64,
    /// Running total after this increment (g).
    pub total: f64,
    /// True if this was the last increment of the profile.
    pub finished: bool,
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Cooperative-step pour simulator.
pub struct PourSimulator {
    profile: PourProfile,
    interval_ms: u64,
    progress: PourProgress,
}

impl PourSimulator {
    pub fn new(profile: PourProfile, interval_ms: u64) -> Self {
        Self {
            profile,
            interval_ms,
            progress: PourProgress::default(),
        }
    }

    /// Start a fresh pour: index 0, total 0, active, last emission = `now_ms`.
    pub fn arm(&mut self, now_ms: u64) {
        self.progress = PourProgress {
            index: 0,
            total: 0.0,
            last_emit_ms: now_ms,
            active: true,
        };
    }

    /// Stop emitting without touching the cursor (the total stays readable).
    pub fn abort(&mut self) {
        self.progress.active = false;
    }

    /// Forget the current pour entirely.
    pub fn clear(&mut self) {
        self.progress = PourProgress::default();
    }

    /// Emit at most one increment if the pour is active and the interval
    /// has elapsed since the last emission.  A clock that moves backwards
    /// never triggers an emission.
    pub fn advance(&mut self, now_ms: u64) -> Option<PourReading> {
        let p = &mut self.progress;
        if !p.active || p.index >= self.profile.len() {
            return None;
        }
        if now_ms.saturating_sub(p.last_emit_ms) < self.interval_ms || now_ms < p.last_emit_ms {
            return None;
        }

        let increment = self.profile.as_slice()[p.index];
        p.total += increment;
        p.index += 1;
        p.last_emit_ms = now_ms;

        let finished = p.index == self.profile.len();
        if finished {
            p.active = false;
        }

        Some(PourReading {
            index: p.index - 1,
            increment,
            total: p.total,
            finished,
        })
    }

    pub fn is_active(&self) -> bool {
        self.progress.active
    }

    /// Running total of the current (or last) pour.
    pub fn total(&self) -> f64 {
        self.progress.total
    }

    /// Number of increments emitted since the last arm.
    pub fn emitted(&self) -> usize {
        self.progress.index
    }

    pub fn progress(&self) -> &PourProgress {
        &self.progress
    }

    pub fn profile(&self) -> &PourProfile {
        &self.profile
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}
