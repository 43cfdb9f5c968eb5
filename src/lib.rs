//! Hysteresis-based target health monitoring library

pub mod admin;
pub mod config;
pub mod health;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServiceConfig;
pub use health::{HealthMonitor, MonitorConfig, MonitorHandle, Snapshot, Target};
pub use lifecycle::Shutdown;
