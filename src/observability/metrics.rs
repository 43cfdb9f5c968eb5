//! Metrics collection and exposition.
//!
//! # Metrics
//! - `health_rounds_total` (counter): completed rounds
//! - `health_rounds_failed_total` (counter): rounds dropped after an internal failure
//! - `health_probe_failures_total` (counter): failed probes
//! - `health_notifications_total` (counter): rounds that changed classification
//! - `health_round_duration_seconds` (histogram): fan-out to fan-in latency
//! - `health_targets` (gauge): targets by state (monitored/healthy/unhealthy)
//!
//! # Design Decisions
//! - Handles are registered once per engine and injected at construction
//! - Every series carries an `instance` label so engines do not collide
//! - `MonitorMetrics::noop()` for tests and embedders without a recorder

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram, Counter, Gauge, Histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Metric handles for one monitor instance.
#[derive(Clone)]
pub struct MonitorMetrics {
    rounds: Counter,
    failed_rounds: Counter,
    probe_failures: Counter,
    notifications: Counter,
    round_duration: Histogram,
    monitored: Gauge,
    healthy: Gauge,
    unhealthy: Gauge,
}

impl MonitorMetrics {
    /// Register handles against the installed recorder.
    pub fn new(instance: &str) -> Self {
        let instance = instance.to_string();
        Self {
            rounds: counter!("health_rounds_total", "instance" => instance.clone()),
            failed_rounds: counter!("health_rounds_failed_total", "instance" => instance.clone()),
            probe_failures: counter!("health_probe_failures_total", "instance" => instance.clone()),
            notifications: counter!("health_notifications_total", "instance" => instance.clone()),
            round_duration: histogram!("health_round_duration_seconds", "instance" => instance.clone()),
            monitored: gauge!("health_targets", "instance" => instance.clone(), "state" => "monitored"),
            healthy: gauge!("health_targets", "instance" => instance.clone(), "state" => "healthy"),
            unhealthy: gauge!("health_targets", "instance" => instance, "state" => "unhealthy"),
        }
    }

    /// Handles that discard everything.
    pub fn noop() -> Self {
        Self {
            rounds: Counter::noop(),
            failed_rounds: Counter::noop(),
            probe_failures: Counter::noop(),
            notifications: Counter::noop(),
            round_duration: Histogram::noop(),
            monitored: Gauge::noop(),
            healthy: Gauge::noop(),
            unhealthy: Gauge::noop(),
        }
    }

    pub fn record_round(&self, started: Instant, probe_failures: usize) {
        self.rounds.increment(1);
        self.probe_failures.increment(probe_failures as u64);
        self.round_duration.record(started.elapsed().as_secs_f64());
    }

    pub fn record_failed_round(&self) {
        self.failed_rounds.increment(1);
    }

    pub fn record_targets(&self, monitored: usize, healthy: usize, unhealthy: usize) {
        self.monitored.set(monitored as f64);
        self.healthy.set(healthy as f64);
        self.unhealthy.set(unhealthy as f64);
    }

    pub fn record_notification(&self) {
        self.notifications.increment(1);
    }
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::noop()
    }
}

/// Install the Prometheus exporter with its own scrape listener.
pub fn install_exporter(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus exporter listening");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_handles_accept_updates() {
        let m = MonitorMetrics::noop();
        m.record_round(Instant::now(), 3);
        m.record_failed_round();
        m.record_targets(3, 2, 1);
        m.record_notification();
    }

    #[test]
    fn test_handles_without_recorder() {
        // No recorder installed: registration falls back to no-op handles
        let m = MonitorMetrics::new("test");
        m.record_round(Instant::now(), 0);
        m.record_targets(1, 1, 0);
    }
}
