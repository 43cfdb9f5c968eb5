//! Authoritative set of monitored targets.
//!
//! # Responsibilities
//! - Hold the targets probed each round
//! - Reconcile against the target source when a refresh is pending
//! - Purge classifier state of removed targets immediately
//!
//! # Design Decisions
//! - Only the driver mutates the set, once per round, before fan-out
//! - New targets start unclassified
//! - The pending request is cleared only after reconciliation completes

use std::collections::BTreeSet;

use crate::health::classifier::HealthClassifier;
use crate::health::refresh::RefreshHandle;
use crate::health::source::TargetSource;
use crate::health::target::Target;

/// Outcome of a reconciliation against a fresh target list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub added: Vec<Target>,
    pub removed: Vec<Target>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Monitored targets plus the refresh request state.
#[derive(Debug)]
pub struct TargetSetManager {
    monitored: BTreeSet<Target>,
    refresh: RefreshHandle,
    applied: u64,
}

impl TargetSetManager {
    pub fn new(refresh: RefreshHandle) -> Self {
        Self {
            monitored: BTreeSet::new(),
            refresh,
            applied: 0,
        }
    }

    pub fn refresh_handle(&self) -> RefreshHandle {
        self.refresh.clone()
    }

    pub fn request_refresh(&self) {
        self.refresh.request();
    }

    pub fn is_refresh_pending(&self) -> bool {
        self.refresh.generation() != self.applied
    }

    pub fn monitored(&self) -> &BTreeSet<Target> {
        &self.monitored
    }

    /// Reconcile with the source if a refresh is pending.
    ///
    /// Returns `None` when nothing was pending.
    pub fn reconcile_if_pending(
        &mut self,
        source: &dyn TargetSource,
        classifier: &mut HealthClassifier,
    ) -> Option<Reconciliation> {
        let generation = self.refresh.generation();
        if generation == self.applied {
            return None;
        }

        let fresh: BTreeSet<Target> = source.current_targets().into_iter().collect();
        let reconciliation = self.reconcile(fresh, classifier);
        self.applied = generation;
        Some(reconciliation)
    }

    fn reconcile(
        &mut self,
        fresh: BTreeSet<Target>,
        classifier: &mut HealthClassifier,
    ) -> Reconciliation {
        let added: Vec<Target> = fresh.difference(&self.monitored).cloned().collect();
        let removed: Vec<Target> = self.monitored.difference(&fresh).cloned().collect();

        for target in &removed {
            let previous = classifier.forget(target);
            tracing::info!(addr = %target, previous = ?previous, "Target removed from monitoring");
        }
        for target in &added {
            tracing::info!(addr = %target, "Target added to monitoring");
        }

        self.monitored = fresh;
        Reconciliation { added, removed }
    }
}
