//! Target identifiers and probe results.
//!
//! # Design Decisions
//! - Targets are opaque strings (usually `host:port`) owned by the target source
//! - Ordered so that exported snapshots are stable and comparable

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::health::probe::ProbeError;

/// An externally supplied identifier of a monitored endpoint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    /// Create a target from any string-like identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Target {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Target {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for Target {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Outcome of one probe. The error's content never affects classification.
pub type ProbeOutcome = Result<(), ProbeError>;

/// One round's result for one target.
#[derive(Debug)]
pub struct ProbeResult {
    pub target: Target,
    pub outcome: ProbeOutcome,
}

impl ProbeResult {
    pub fn success(target: impl Into<Target>) -> Self {
        Self {
            target: target.into(),
            outcome: Ok(()),
        }
    }

    pub fn failure(target: impl Into<Target>, error: ProbeError) -> Self {
        Self {
            target: target.into(),
            outcome: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}
