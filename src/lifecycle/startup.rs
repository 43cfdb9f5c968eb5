//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order from a validated config
//! - Start background tasks (monitor, config watcher, admin endpoint)
//! - Wait for a stop signal, then drain
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The admin endpoint starts last, once the monitor exists

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinError;

use crate::admin::{self, AdminState};
use crate::config::{ConfigWatcher, HealthCheckConfig, ProbeKind, ServiceConfig};
use crate::health::{
    HealthMonitor, Listener, MonitorError, MonitorHandle, ProbeSetupError, Prober,
    SharedTargetSource, HttpProber, TcpProber,
};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics::{install_exporter, MonitorMetrics};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("monitor: {0}")]
    Monitor(#[from] MonitorError),

    #[error("probe: {0}")]
    Probe(#[from] ProbeSetupError),

    #[error("metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("config watcher: {0}")]
    Watcher(#[from] notify::Error),

    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("health monitor aborted: {0}")]
    MonitorAborted(String),
}

/// Prober for the configured probe kind, bounded by `timeout`.
pub fn build_prober(
    config: &HealthCheckConfig,
    timeout: Duration,
) -> Result<Arc<dyn Prober>, ProbeSetupError> {
    let prober: Arc<dyn Prober> = match config.kind {
        ProbeKind::Http => Arc::new(HttpProber::new(&config.path, timeout)?),
        ProbeKind::Tcp => Arc::new(TcpProber::new(timeout)?),
    };
    Ok(prober)
}

/// Assemble an engine over `source` from the `health_check` section.
pub fn build_monitor(
    config: &ServiceConfig,
    source: Arc<SharedTargetSource>,
    metrics: MonitorMetrics,
    listeners: Vec<Arc<dyn Listener>>,
) -> Result<HealthMonitor, StartupError> {
    let engine = config.health_check.monitor_config();
    let prober = build_prober(&config.health_check, engine.probe_timeout)?;
    let builder = listeners.into_iter().fold(
        HealthMonitor::builder(engine)
            .prober(prober)
            .target_source(source)
            .metrics(metrics),
        |builder, listener| builder.listener(listener),
    );
    Ok(builder.build()?)
}

/// Outcome of the monitor task. Any exit other than a clean stop is fatal.
fn monitor_exit(res: Result<(), JoinError>) -> Result<(), StartupError> {
    res.map_err(|e| {
        tracing::error!(error = %e, "Health monitor task ended abnormally");
        StartupError::MonitorAborted(e.to_string())
    })
}

fn parse_addr(value: &str) -> Result<SocketAddr, StartupError> {
    value
        .parse()
        .map_err(|_| StartupError::InvalidAddress(value.to_string()))
}

/// Log every published change. Runs until the monitor handle's owner is gone.
async fn report_changes(changed: Arc<Notify>, handle: MonitorHandle) {
    loop {
        changed.notified().await;
        let snapshot = handle.read();
        tracing::info!(
            healthy = snapshot.healthy().len(),
            unhealthy = snapshot.unhealthy().len(),
            "Target classification changed"
        );
    }
}

/// Run the service until SIGINT/SIGTERM.
///
/// `config_path` enables hot reload of the target list.
pub async fn run(config: ServiceConfig, config_path: Option<PathBuf>) -> Result<(), StartupError> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        targets = config.targets.len(),
        "target-health starting"
    );

    let metrics = if config.observability.metrics_enabled {
        let addr = parse_addr(&config.observability.metrics_address)?;
        install_exporter(addr)?;
        tracing::info!(address = %addr, "Metrics exporter listening");
        MonitorMetrics::new("default")
    } else {
        MonitorMetrics::noop()
    };

    let source = Arc::new(SharedTargetSource::new(config.target_list()));

    let changed = Arc::new(Notify::new());
    let on_change = Arc::clone(&changed);
    let listener: Arc<dyn Listener> = Arc::new(move || on_change.notify_one());

    let monitor = build_monitor(&config, Arc::clone(&source), metrics, vec![listener])?;
    let handle = monitor.handle();
    let reporter = tokio::spawn(report_changes(changed, handle.clone()));

    let _watcher = match &config_path {
        Some(path) => Some(ConfigWatcher::new(path, Arc::clone(&source)).run()?),
        None => None,
    };

    let shutdown = Shutdown::new();

    let admin_task = if config.admin.enabled {
        let addr = parse_addr(&config.admin.bind_address)?;
        let listener = TcpListener::bind(addr).await?;
        let state = AdminState::new(handle.clone(), &config.admin.api_key);
        Some(tokio::spawn(admin::serve(listener, state, shutdown.subscribe())))
    } else {
        None
    };

    let mut monitor_task = tokio::spawn(monitor.run(shutdown.subscribe()));
    let mut monitor_exited = None;

    tokio::select! {
        res = signals::listen(handle.refresh_handle()) => {
            if let Err(e) = res {
                tracing::error!(error = %e, "Signal handling failed, shutting down");
            }
        }
        res = &mut monitor_task => {
            monitor_exited = Some(monitor_exit(res));
        }
    }

    shutdown.trigger();

    let monitor_result = match monitor_exited {
        Some(result) => result,
        None => monitor_exit(monitor_task.await),
    };
    if let Some(task) = admin_task {
        match task.await {
            Ok(Err(e)) => tracing::error!(error = %e, "Admin endpoint failed"),
            Err(e) => tracing::error!(error = %e, "Admin endpoint task ended abnormally"),
            Ok(Ok(())) => {}
        }
    }
    reporter.abort();

    monitor_result?;
    tracing::info!("Shutdown complete");
    Ok(())
}
