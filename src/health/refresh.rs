//! Pending-refresh signal shared between callers and the driver.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Requests that the monitored target list be re-read at the start of the next round.
///
/// Requests are counted rather than flagged, so a request that arrives while
/// the driver is reconciling stays pending for the round after.
#[derive(Debug, Clone)]
pub struct RefreshHandle {
    requested: Arc<AtomicU64>,
}

impl RefreshHandle {
    /// Create a handle with one refresh already pending.
    pub fn new() -> Self {
        Self {
            requested: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Ask for a refresh. Safe from any thread; repeated calls coalesce.
    pub fn request(&self) {
        self.requested.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn generation(&self) -> u64 {
        self.requested.load(Ordering::Acquire)
    }
}

impl Default for RefreshHandle {
    fn default() -> Self {
        Self::new()
    }
}
