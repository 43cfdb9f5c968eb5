//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Engine and service produce:
//!     → logging.rs (structured log events, one span per round)
//!     → metrics.rs (counters, gauges, histograms via an injected handle)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Round ID flows through every event of a round
//! - Metrics handles are explicit values, not process-wide registration side effects

pub mod logging;
pub mod metrics;

pub use metrics::MonitorMetrics;
