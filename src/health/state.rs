//! Per-target health state machine.
//!
//! # States
//! - Unclassified: monitored, but no threshold reached yet
//! - Healthy: `healthy_threshold` consecutive successes
//! - Unhealthy: `unhealthy_threshold` consecutive failures
//!
//! # State Transitions
//! ```text
//! any → Unhealthy: failure streak reaches unhealthy_threshold
//! any → Healthy:   success streak reaches healthy_threshold
//! ```
//!
//! # Design Decisions
//! - An outcome zeroes the opposite streak before incrementing its own
//! - Streaks are capped at their threshold; flipping back needs a full fresh run
//! - Thresholds of 1 classify on the first outcome

use std::num::NonZeroU32;

use serde::Serialize;

/// Observable classification of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Unclassified,
    Healthy,
    Unhealthy,
}

/// Hysteresis thresholds, both at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub healthy: NonZeroU32,
    pub unhealthy: NonZeroU32,
}

impl Thresholds {
    /// Returns `None` if either threshold is zero.
    pub fn new(healthy: u32, unhealthy: u32) -> Option<Self> {
        Some(Self {
            healthy: NonZeroU32::new(healthy)?,
            unhealthy: NonZeroU32::new(unhealthy)?,
        })
    }
}

/// Consecutive-outcome counters for one target.
///
/// At most one of the two streaks is non-zero at any time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsecutiveCounters {
    success_streak: u32,
    failure_streak: u32,
}

impl ConsecutiveCounters {
    pub fn success_streak(&self) -> u32 {
        self.success_streak
    }

    pub fn failure_streak(&self) -> u32 {
        self.failure_streak
    }

    /// Record one outcome.
    ///
    /// Returns the classification the target must now hold when a threshold
    /// is reached (or still held), `None` when classification is unaffected.
    pub fn record(&mut self, success: bool, thresholds: Thresholds) -> Option<Classification> {
        if success {
            self.record_success(thresholds.healthy.get())
        } else {
            self.record_failure(thresholds.unhealthy.get())
        }
    }

    fn record_success(&mut self, healthy_threshold: u32) -> Option<Classification> {
        self.failure_streak = 0;
        if self.success_streak < healthy_threshold {
            self.success_streak += 1;
        }
        (self.success_streak == healthy_threshold).then_some(Classification::Healthy)
    }

    fn record_failure(&mut self, unhealthy_threshold: u32) -> Option<Classification> {
        self.success_streak = 0;
        if self.failure_streak < unhealthy_threshold {
            self.failure_streak += 1;
        }
        (self.failure_streak == unhealthy_threshold).then_some(Classification::Unhealthy)
    }
}
