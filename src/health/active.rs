//! Active health checking: the round driver.
//!
//! # Responsibilities
//! - Own the recurring timer and stop on shutdown
//! - Per tick: reconcile targets, fan out probes, join, classify, publish
//! - Keep monitoring through failed rounds
//!
//! # Design Decisions
//! - One task per monitored target, no concurrency cap
//! - The round is a barrier: nothing is classified until every probe returns
//! - Shutdown is observed between ticks, so in-flight probes finish naturally
//! - Refresh requests arriving mid-round apply at the next round

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{self, MissedTickBehavior};
use tracing::Instrument;
use uuid::Uuid;

use crate::health::classifier::{HealthClassifier, Transition};
use crate::health::error::MonitorError;
use crate::health::notifier::{ChangeNotifier, Listener};
use crate::health::probe::{ProbeError, Prober};
use crate::health::refresh::RefreshHandle;
use crate::health::snapshot::{Snapshot, SnapshotPublisher};
use crate::health::source::TargetSource;
use crate::health::state::{Classification, Thresholds};
use crate::health::target::{ProbeResult, Target};
use crate::health::target_set::{Reconciliation, TargetSetManager};
use crate::observability::metrics::MonitorMetrics;

/// Engine settings, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    pub unhealthy_threshold: u32,
    pub healthy_threshold: u32,
    /// Budget for a single probe. The engine does not enforce it; the
    /// prober must be built with this same value.
    pub probe_timeout: Duration,
    pub probe_interval: Duration,
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<Thresholds, MonitorError> {
        if self.unhealthy_threshold == 0 {
            return Err(MonitorError::InvalidThreshold("unhealthy_threshold"));
        }
        if self.healthy_threshold == 0 {
            return Err(MonitorError::InvalidThreshold("healthy_threshold"));
        }
        if self.probe_timeout.is_zero() {
            return Err(MonitorError::ZeroDuration("probe_timeout"));
        }
        if self.probe_interval.is_zero() {
            return Err(MonitorError::ZeroDuration("probe_interval"));
        }
        Thresholds::new(self.healthy_threshold, self.unhealthy_threshold)
            .ok_or(MonitorError::InvalidThreshold("thresholds"))
    }
}

/// Cloneable read/refresh access to a running monitor.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    publisher: Arc<SnapshotPublisher>,
    refresh: RefreshHandle,
}

impl MonitorHandle {
    /// Latest published classification. Lock-free.
    pub fn read(&self) -> Arc<Snapshot> {
        self.publisher.read()
    }

    /// Re-read the target source at the start of the next round.
    pub fn request_refresh(&self) {
        self.refresh.request();
    }

    pub fn refresh_handle(&self) -> RefreshHandle {
        self.refresh.clone()
    }
}

/// Summary of one completed round.
#[derive(Debug, Clone)]
pub struct RoundReport {
    pub round: u64,
    pub reconciliation: Option<Reconciliation>,
    pub probed: usize,
    pub failures: usize,
    pub transitions: Vec<Transition>,
    pub changed: bool,
}

/// Builder for [`HealthMonitor`].
pub struct HealthMonitorBuilder {
    config: MonitorConfig,
    prober: Option<Arc<dyn Prober>>,
    source: Option<Arc<dyn TargetSource>>,
    listeners: Vec<Arc<dyn Listener>>,
    metrics: Option<MonitorMetrics>,
}

impl HealthMonitorBuilder {
    pub fn prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = Some(prober);
        self
    }

    pub fn target_source(mut self, source: Arc<dyn TargetSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Register a listener. Listeners are notified in registration order.
    pub fn listener(mut self, listener: Arc<dyn Listener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn metrics(mut self, metrics: MonitorMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> Result<HealthMonitor, MonitorError> {
        let thresholds = self.config.validate()?;
        let prober = self.prober.ok_or(MonitorError::MissingProber)?;
        let source = self.source.ok_or(MonitorError::MissingTargetSource)?;

        let refresh = RefreshHandle::new();
        source.subscribe(refresh.clone());

        let mut notifier = ChangeNotifier::new();
        for listener in self.listeners {
            notifier.register(listener);
        }

        Ok(HealthMonitor {
            config: self.config,
            prober,
            source,
            targets: TargetSetManager::new(refresh),
            classifier: HealthClassifier::new(thresholds),
            publisher: Arc::new(SnapshotPublisher::new()),
            notifier,
            metrics: self.metrics.unwrap_or_default(),
            round: 0,
            #[cfg(test)]
            cancel_probes: false,
        })
    }
}

/// The periodic driver tying target reconciliation, probing,
/// classification and publication together.
pub struct HealthMonitor {
    config: MonitorConfig,
    prober: Arc<dyn Prober>,
    source: Arc<dyn TargetSource>,
    targets: TargetSetManager,
    classifier: HealthClassifier,
    publisher: Arc<SnapshotPublisher>,
    notifier: ChangeNotifier,
    metrics: MonitorMetrics,
    round: u64,
    #[cfg(test)]
    cancel_probes: bool,
}

impl HealthMonitor {
    pub fn builder(config: MonitorConfig) -> HealthMonitorBuilder {
        HealthMonitorBuilder {
            config,
            prober: None,
            source: None,
            listeners: Vec::new(),
            metrics: None,
        }
    }

    pub fn handle(&self) -> MonitorHandle {
        MonitorHandle {
            publisher: Arc::clone(&self.publisher),
            refresh: self.targets.refresh_handle(),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn monitored(&self) -> impl Iterator<Item = &Target> {
        self.targets.monitored().iter()
    }

    pub fn classification(&self, target: &Target) -> Classification {
        self.classifier.classification(target)
    }

    /// Tick until the shutdown flag is raised or its sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            interval_ms = self.config.probe_interval.as_millis() as u64,
            timeout_ms = self.config.probe_timeout.as_millis() as u64,
            healthy_threshold = self.config.healthy_threshold,
            unhealthy_threshold = self.config.unhealthy_threshold,
            listeners = self.notifier.listener_count(),
            "Health monitor starting"
        );

        let mut ticker = time::interval(self.config.probe_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        tracing::info!("Shutdown coordinator dropped, stopping health monitor");
                        break;
                    }
                }
            }
        }

        tracing::info!(rounds = self.round, "Health monitor stopped");
    }

    /// Run one round, logging and swallowing round-level failures.
    async fn tick(&mut self) {
        let span = tracing::info_span!("round", round = self.round + 1, id = %Uuid::new_v4());
        match self.run_round().instrument(span).await {
            Ok(report) => {
                tracing::debug!(
                    round = report.round,
                    probed = report.probed,
                    failures = report.failures,
                    changed = report.changed,
                    "Round complete"
                );
            }
            Err(e) => {
                self.metrics.record_failed_round();
                tracing::error!(error = %e, "Health round failed, keeping previous classification");
            }
        }
    }

    /// Execute exactly one round.
    pub async fn run_round(&mut self) -> Result<RoundReport, MonitorError> {
        self.round += 1;
        let started = Instant::now();

        let reconciliation = self
            .targets
            .reconcile_if_pending(self.source.as_ref(), &mut self.classifier);
        if let Some(r) = reconciliation.as_ref().filter(|r| !r.is_empty()) {
            tracing::info!(
                added = r.added.len(),
                removed = r.removed.len(),
                monitored = self.targets.monitored().len(),
                "Target set reconciled"
            );
        }

        let results = self.probe_all().await?;
        let failures = results.iter().filter(|r| !r.is_success()).count();

        let transitions = self.classifier.apply(&results);
        for t in &transitions {
            match t.to {
                Classification::Unhealthy => {
                    tracing::warn!(addr = %t.target, from = ?t.from, "Target marked unhealthy")
                }
                _ => tracing::info!(addr = %t.target, from = ?t.from, to = ?t.to, "Target classification changed"),
            }
        }

        let changed = self.notifier.publish_if_changed(&self.classifier, &self.publisher);
        if changed {
            self.metrics.record_notification();
        }
        self.metrics.record_round(started, failures);
        self.metrics.record_targets(
            self.targets.monitored().len(),
            self.classifier.healthy().len(),
            self.classifier.unhealthy().len(),
        );

        Ok(RoundReport {
            round: self.round,
            reconciliation,
            probed: results.len(),
            failures,
            transitions,
            changed,
        })
    }

    /// Fan out one probe per monitored target and wait for all of them.
    async fn probe_all(&self) -> Result<Vec<ProbeResult>, MonitorError> {
        let mut tasks = JoinSet::new();
        for target in self.targets.monitored() {
            let prober = Arc::clone(&self.prober);
            let target = target.clone();
            tasks.spawn(async move {
                let outcome = AssertUnwindSafe(prober.probe(&target))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        tracing::error!(addr = %target, "Probe panicked, counting as failure");
                        Err(ProbeError::Panicked)
                    });
                ProbeResult { target, outcome }
            });
        }

        #[cfg(test)]
        if self.cancel_probes {
            tasks.abort_all();
        }

        let mut results = Vec::with_capacity(tasks.len());
        let mut lost = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => lost = Some(e.to_string()),
            }
        }

        if let Some(reason) = lost {
            return Err(MonitorError::IncompleteRound(reason));
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::source::StaticTargetSource;
    use async_trait::async_trait;

    struct AlwaysUp;

    #[async_trait]
    impl Prober for AlwaysUp {
        async fn probe(&self, _target: &Target) -> Result<(), ProbeError> {
            Ok(())
        }
    }

    struct Switchable(std::sync::atomic::AtomicBool);

    #[async_trait]
    impl Prober for Switchable {
        async fn probe(&self, _target: &Target) -> Result<(), ProbeError> {
            if self.0.load(std::sync::atomic::Ordering::SeqCst) {
                Err(ProbeError::Status(500))
            } else {
                Ok(())
            }
        }
    }

    struct Panicky;

    #[async_trait]
    impl Prober for Panicky {
        async fn probe(&self, target: &Target) -> Result<(), ProbeError> {
            if target.as_str() == "boom" {
                panic!("prober bug");
            }
            Ok(())
        }
    }

    fn config() -> MonitorConfig {
        MonitorConfig {
            unhealthy_threshold: 1,
            healthy_threshold: 1,
            probe_timeout: Duration::from_millis(100),
            probe_interval: Duration::from_millis(50),
        }
    }

    fn source(ids: &[&str]) -> Arc<dyn TargetSource> {
        Arc::new(StaticTargetSource::new(ids.iter().map(|s| Target::from(*s)).collect()))
    }

    #[test]
    fn test_config_validation() {
        let mut c = config();
        c.unhealthy_threshold = 0;
        assert!(matches!(c.validate(), Err(MonitorError::InvalidThreshold("unhealthy_threshold"))));

        let mut c = config();
        c.probe_interval = Duration::ZERO;
        assert!(matches!(c.validate(), Err(MonitorError::ZeroDuration("probe_interval"))));

        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_builder_requires_collaborators() {
        let missing_prober = HealthMonitor::builder(config()).target_source(source(&["a"])).build();
        assert!(matches!(missing_prober, Err(MonitorError::MissingProber)));

        let missing_source = HealthMonitor::builder(config()).prober(Arc::new(AlwaysUp)).build();
        assert!(matches!(missing_source, Err(MonitorError::MissingTargetSource)));
    }

    #[tokio::test]
    async fn test_first_round_loads_targets() {
        let mut monitor = HealthMonitor::builder(config())
            .prober(Arc::new(AlwaysUp))
            .target_source(source(&["a", "b"]))
            .build()
            .unwrap();
        let handle = monitor.handle();
        assert!(handle.read().healthy().is_empty());

        let report = monitor.run_round().await.unwrap();
        assert_eq!(report.probed, 2);
        assert!(report.changed);
        assert_eq!(handle.read().healthy(), &[Target::from("a"), Target::from("b")]);
    }

    #[tokio::test]
    async fn test_panicking_probe_counts_as_failure() {
        let mut monitor = HealthMonitor::builder(config())
            .prober(Arc::new(Panicky))
            .target_source(source(&["ok", "boom"]))
            .build()
            .unwrap();

        let report = monitor.run_round().await.unwrap();
        assert_eq!(report.failures, 1);
        let snap = monitor.handle().read();
        assert_eq!(snap.healthy(), &[Target::from("ok")]);
        assert_eq!(snap.unhealthy(), &[Target::from("boom")]);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let monitor = HealthMonitor::builder(config())
            .prober(Arc::new(AlwaysUp))
            .target_source(source(&["a"]))
            .build()
            .unwrap();
        let handle = monitor.handle();
        let (tx, rx) = watch::channel(false);

        let task = tokio::spawn(monitor.run(rx));
        time::sleep(Duration::from_millis(120)).await;
        tx.send_replace(true);

        time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
        assert_eq!(handle.read().healthy(), &[Target::from("a")]);
    }

    #[tokio::test]
    async fn test_failed_round_keeps_previous_snapshot() {
        let prober = Arc::new(Switchable(Default::default()));
        let mut monitor = HealthMonitor::builder(config())
            .prober(prober.clone())
            .target_source(source(&["a"]))
            .build()
            .unwrap();
        let handle = monitor.handle();

        monitor.tick().await;
        let before = handle.read();
        assert_eq!(before.healthy(), &[Target::from("a")]);

        prober.0.store(true, std::sync::atomic::Ordering::SeqCst);
        monitor.cancel_probes = true;
        assert!(matches!(monitor.run_round().await, Err(MonitorError::IncompleteRound(_))));
        monitor.tick().await;
        assert!(Arc::ptr_eq(&before, &handle.read()));
        assert_eq!(monitor.classification(&Target::from("a")), Classification::Healthy);

        // The next round runs normally and sees the failure
        monitor.cancel_probes = false;
        monitor.tick().await;
        assert_eq!(monitor.round, 4);
        assert_eq!(handle.read().unhealthy(), &[Target::from("a")]);
        assert!(handle.read().healthy().is_empty());
    }
}
