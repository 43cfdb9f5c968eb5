//! Lock-free published classification.
//!
//! # Responsibilities
//! - Hold the externally visible (healthy, unhealthy) pair
//! - Replace it wholesale at the end of a round that changed classification
//!
//! # Design Decisions
//! - Both sequences live behind one `Arc`, swapped together with `ArcSwap`
//! - Published sequences are fresh copies, never the driver's working sets
//! - Sequences are sorted and deduplicated, so element-wise equality is set equality

use std::collections::BTreeSet;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::health::state::Classification;
use crate::health::target::Target;

/// An immutable view of the classification at the end of some round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    healthy: Vec<Target>,
    unhealthy: Vec<Target>,
}

impl Snapshot {
    fn from_sets(healthy: &BTreeSet<Target>, unhealthy: &BTreeSet<Target>) -> Self {
        Self {
            healthy: healthy.iter().cloned().collect(),
            unhealthy: unhealthy.iter().cloned().collect(),
        }
    }

    pub fn healthy(&self) -> &[Target] {
        &self.healthy
    }

    pub fn unhealthy(&self) -> &[Target] {
        &self.unhealthy
    }

    pub fn is_healthy(&self, target: &Target) -> bool {
        self.healthy.binary_search(target).is_ok()
    }

    pub fn classification(&self, target: &Target) -> Classification {
        if self.is_healthy(target) {
            Classification::Healthy
        } else if self.unhealthy.binary_search(target).is_ok() {
            Classification::Unhealthy
        } else {
            Classification::Unclassified
        }
    }

    /// Whether this snapshot holds exactly the given sets.
    pub fn matches(&self, healthy: &BTreeSet<Target>, unhealthy: &BTreeSet<Target>) -> bool {
        self.healthy.iter().eq(healthy.iter()) && self.unhealthy.iter().eq(unhealthy.iter())
    }
}

/// Atomically swappable holder of the current [`Snapshot`].
#[derive(Debug, Default)]
pub struct SnapshotPublisher {
    current: ArcSwap<Snapshot>,
}

impl SnapshotPublisher {
    /// Start with an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot. Never blocks, never observes a half-updated pair.
    pub fn read(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Replace the visible snapshot with copies of the given sets.
    pub fn publish(&self, healthy: &BTreeSet<Target>, unhealthy: &BTreeSet<Target>) {
        self.current
            .store(Arc::new(Snapshot::from_sets(healthy, unhealthy)));
    }
}
