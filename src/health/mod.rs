//! Health classification engine.
//!
//! # Data Flow
//! ```text
//! Each tick (active.rs):
//!     target_set.rs reconciles with source.rs (if a refresh is pending)
//!     → probe.rs, one concurrent task per monitored target (fan-out)
//!     → join on every task (fan-in)
//!     → classifier.rs applies the batch through state.rs
//!     → notifier.rs compares with the published snapshot
//!         → snapshot.rs swaps in the new pair (if changed)
//!         → listeners notified (if changed)
//!
//! Readers (any thread):
//!     MonitorHandle::read() → Arc<Snapshot>, lock-free
//!     MonitorHandle::request_refresh() → refresh.rs
//! ```
//!
//! # Design Decisions
//! - Targets, counters and working sets belong to the driver alone
//! - Only the refresh request and the snapshot cross threads
//! - Probe failures are data, never errors of the engine

pub mod active;
pub mod classifier;
pub mod error;
pub mod notifier;
pub mod probe;
pub mod refresh;
pub mod snapshot;
pub mod source;
pub mod state;
pub mod target;
pub mod target_set;

pub use active::{HealthMonitor, HealthMonitorBuilder, MonitorConfig, MonitorHandle, RoundReport};
pub use classifier::{HealthClassifier, Transition};
pub use error::MonitorError;
pub use notifier::{ChangeNotifier, Listener};
pub use probe::{HttpProber, ProbeError, ProbeSetupError, Prober, TcpProber};
pub use refresh::RefreshHandle;
pub use snapshot::{Snapshot, SnapshotPublisher};
pub use source::{SharedTargetSource, StaticTargetSource, TargetSource};
pub use state::{Classification, ConsecutiveCounters, Thresholds};
pub use target::{ProbeOutcome, ProbeResult, Target};
pub use target_set::{Reconciliation, TargetSetManager};
