//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use target_health::health::{MonitorConfig, ProbeError, Prober, Target};

pub fn monitor_config(healthy: u32, unhealthy: u32) -> MonitorConfig {
    MonitorConfig {
        unhealthy_threshold: unhealthy,
        healthy_threshold: healthy,
        probe_timeout: Duration::from_millis(500),
        probe_interval: Duration::from_millis(20),
    }
}

pub fn targets(names: &[&str]) -> Vec<Target> {
    names.iter().map(|n| Target::from(*n)).collect()
}

/// Prober whose per-target outcome can be flipped between rounds.
///
/// Targets marked down fail; everything else succeeds. Every call is counted.
#[derive(Default)]
pub struct ScriptedProber {
    down: Mutex<HashSet<Target>>,
    calls: Mutex<HashMap<Target, usize>>,
    delay: Option<Duration>,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_down(&self, target: &str, down: bool) {
        let mut set = self.down.lock().unwrap();
        if down {
            set.insert(Target::from(target));
        } else {
            set.remove(&Target::from(target));
        }
    }

    pub fn calls(&self, target: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&Target::from(target))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, target: &Target) -> Result<(), ProbeError> {
        *self.calls.lock().unwrap().entry(target.clone()).or_default() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.down.lock().unwrap().contains(target) {
            Err(ProbeError::Status(503))
        } else {
            Ok(())
        }
    }
}

/// Listener that counts notifications.
#[derive(Default)]
pub struct CountingListener {
    count: AtomicUsize,
}

impl CountingListener {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl target_health::health::Listener for CountingListener {
    fn notify(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Start a programmable mock HTTP backend on an ephemeral port.
///
/// `f` is called once per request and returns `(status, delay)`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, Duration)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut request = Vec::new();
                        let mut buf = [0u8; 1024];
                        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => request.extend_from_slice(&buf[..n]),
                            }
                        }

                        let (status, delay) = f().await;
                        tokio::time::sleep(delay).await;
                        let status_text = match status {
                            200 => "200 OK",
                            204 => "204 No Content",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                            status_text
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// A backend that always answers with `status`, immediately.
pub async fn start_mock_backend(status: u16) -> SocketAddr {
    start_programmable_backend(move || async move { (status, Duration::ZERO) }).await
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
