//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → health_check section → MonitorConfig for the engine
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → SharedTargetSource::replace (target list only)
//!     → refresh applied at the start of the next round
//! ```
//!
//! # Design Decisions
//! - Engine settings are immutable once loaded; only targets hot-reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AdminConfig, HealthCheckConfig, LogFormat, ObservabilityConfig, ProbeKind, ServiceConfig};
pub use validation::ValidationError;
pub use watcher::ConfigWatcher;
