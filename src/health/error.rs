//! Engine errors.

use thiserror::Error;

use crate::health::probe::ProbeSetupError;

/// Errors building or running the health monitor.
///
/// Construction errors are fatal and returned before any round runs.
/// Round errors are logged by the driver and the round is dropped.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("{0} must be at least 1")]
    InvalidThreshold(&'static str),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("no prober configured")]
    MissingProber,

    #[error("no target source configured")]
    MissingTargetSource,

    #[error("probe transport setup failed: {0}")]
    ProbeSetup(#[from] ProbeSetupError),

    #[error("round incomplete: {0}")]
    IncompleteRound(String),
}
