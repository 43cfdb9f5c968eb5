//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Metrics exporter → Prober → Engine → Watcher/Admin → Run
//!
//! Shutdown (shutdown.rs):
//!     Signal received → flag raised → driver exits between ticks → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Request target refresh
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, before the first round
//! - In-flight probes are never cancelled by shutdown

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
