//! Target sources: where the list of targets to monitor comes from.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

use crate::health::refresh::RefreshHandle;
use crate::health::target::Target;

/// Supplier of the current target list.
///
/// Sources that can tell when their list changes override [`subscribe`]
/// and call [`RefreshHandle::request`] on every change.
///
/// [`subscribe`]: TargetSource::subscribe
pub trait TargetSource: Send + Sync {
    fn current_targets(&self) -> Vec<Target>;

    /// Called once when an engine is built on this source.
    fn subscribe(&self, _refresh: RefreshHandle) {}
}

/// A fixed target list.
#[derive(Debug, Clone, Default)]
pub struct StaticTargetSource {
    targets: Vec<Target>,
}

impl StaticTargetSource {
    pub fn new(targets: Vec<Target>) -> Self {
        Self { targets }
    }
}

impl TargetSource for StaticTargetSource {
    fn current_targets(&self) -> Vec<Target> {
        self.targets.clone()
    }
}

/// A replaceable target list that signals subscribed engines on change.
#[derive(Debug, Default)]
pub struct SharedTargetSource {
    targets: ArcSwap<Vec<Target>>,
    subscribers: Mutex<Vec<RefreshHandle>>,
}

impl SharedTargetSource {
    pub fn new(targets: Vec<Target>) -> Self {
        Self {
            targets: ArcSwap::from_pointee(targets),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Replace the list. Returns `false` (and signals nobody) if it is unchanged.
    pub fn replace(&self, mut targets: Vec<Target>) -> bool {
        targets.sort();
        targets.dedup();

        let mut current = self.targets.load().as_ref().clone();
        current.sort();
        current.dedup();
        if current == targets {
            return false;
        }

        self.targets.store(Arc::new(targets));
        let subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for refresh in subscribers.iter() {
            refresh.request();
        }
        true
    }
}

impl TargetSource for SharedTargetSource {
    fn current_targets(&self) -> Vec<Target> {
        self.targets.load().as_ref().clone()
    }

    fn subscribe(&self, refresh: RefreshHandle) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(refresh);
    }
}

impl<S: TargetSource + ?Sized> TargetSource for Arc<S> {
    fn current_targets(&self) -> Vec<Target> {
        (**self).current_targets()
    }

    fn subscribe(&self, refresh: RefreshHandle) {
        (**self).subscribe(refresh)
    }
}
