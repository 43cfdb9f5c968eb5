//! Probe transports against real sockets.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{closed_port, monitor_config, start_mock_backend, start_programmable_backend};
use target_health::health::{
    HealthMonitor, HttpProber, ProbeError, Prober, StaticTargetSource, Target, TcpProber,
};

fn http_prober(timeout_ms: u64) -> HttpProber {
    HttpProber::new("/health", Duration::from_millis(timeout_ms)).unwrap()
}

#[tokio::test]
async fn test_http_success_status() {
    let addr = start_mock_backend(200).await;
    let result = http_prober(1000).probe(&Target::from(addr.to_string())).await;
    assert!(result.is_ok(), "{result:?}");

    let addr = start_mock_backend(204).await;
    assert!(http_prober(1000).probe(&Target::from(addr.to_string())).await.is_ok());
}

#[tokio::test]
async fn test_http_error_status_fails() {
    let addr = start_mock_backend(503).await;
    let result = http_prober(1000).probe(&Target::from(addr.to_string())).await;
    assert!(matches!(result, Err(ProbeError::Status(503))), "{result:?}");
}

#[tokio::test]
async fn test_http_connection_refused_fails() {
    let addr = closed_port().await;
    let result = http_prober(1000).probe(&Target::from(addr.to_string())).await;
    assert!(matches!(result, Err(ProbeError::Connect(_))), "{result:?}");
}

#[tokio::test]
async fn test_http_slow_backend_times_out() {
    let addr = start_programmable_backend(|| async { (200, Duration::from_millis(500)) }).await;
    let result = http_prober(100).probe(&Target::from(addr.to_string())).await;
    assert!(matches!(result, Err(ProbeError::Timeout(_))), "{result:?}");
}

#[tokio::test]
async fn test_tcp_probe() {
    let open = start_mock_backend(200).await;
    let prober = TcpProber::new(Duration::from_millis(500)).unwrap();
    assert!(prober.probe(&Target::from(open.to_string())).await.is_ok());

    let closed = closed_port().await;
    assert!(prober.probe(&Target::from(closed.to_string())).await.is_err());
}

#[tokio::test]
async fn test_backend_recovery_through_monitor() {
    let failing = Arc::new(AtomicUsize::new(2));
    let remaining = failing.clone();
    let addr = start_programmable_backend(move || {
        let remaining = remaining.clone();
        async move {
            let left = remaining.load(Ordering::SeqCst);
            if left > 0 {
                remaining.store(left - 1, Ordering::SeqCst);
                (500, Duration::ZERO)
            } else {
                (200, Duration::ZERO)
            }
        }
    })
    .await;

    let target = Target::from(addr.to_string());
    let mut monitor = HealthMonitor::builder(monitor_config(2, 2))
        .prober(Arc::new(http_prober(1000)))
        .target_source(Arc::new(StaticTargetSource::new(vec![target.clone()])))
        .build()
        .unwrap();
    let handle = monitor.handle();

    monitor.run_round().await.unwrap();
    monitor.run_round().await.unwrap();
    assert_eq!(handle.read().unhealthy(), std::slice::from_ref(&target));

    monitor.run_round().await.unwrap();
    assert_eq!(handle.read().unhealthy(), std::slice::from_ref(&target));

    monitor.run_round().await.unwrap();
    assert!(handle.read().is_healthy(&target));
    assert!(handle.read().unhealthy().is_empty());
}
