//! Change detection and listener notification.
//!
//! # Responsibilities
//! - Compare the working sets with the last published snapshot
//! - Publish and notify listeners only when they differ
//!
//! # Design Decisions
//! - Listeners get no payload; they re-read the snapshot if they care
//! - Called synchronously, in registration order, from the driver
//! - A panicking listener is not caught

use std::sync::Arc;

use crate::health::classifier::HealthClassifier;
use crate::health::snapshot::SnapshotPublisher;

/// Receiver of "classification changed, re-check soon" signals.
pub trait Listener: Send + Sync {
    fn notify(&self);
}

impl<F> Listener for F
where
    F: Fn() + Send + Sync,
{
    fn notify(&self) {
        self()
    }
}

/// Publishes changed classifications and fans the signal out to listeners.
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: Vec<Arc<dyn Listener>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: Arc<dyn Listener>) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Publish and notify if the classifier's sets differ from the published ones.
    ///
    /// Returns whether a change was published.
    pub fn publish_if_changed(
        &self,
        classifier: &HealthClassifier,
        publisher: &SnapshotPublisher,
    ) -> bool {
        let previous = publisher.read();
        if previous.matches(classifier.healthy(), classifier.unhealthy()) {
            return false;
        }

        publisher.publish(classifier.healthy(), classifier.unhealthy());
        for listener in &self.listeners {
            listener.notify();
        }
        true
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
