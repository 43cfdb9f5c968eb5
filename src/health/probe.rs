//! Probe transports.
//!
//! # Responsibilities
//! - Perform one health check against one target
//! - Bound every check by the configured probe timeout
//!
//! # Design Decisions
//! - Every non-success (status, transport, resolution, timeout) is a `ProbeError`
//! - The engine counts errors, it never inspects them
//! - Transport setup errors surface at construction, not per probe

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time;
use url::Url;

use crate::health::target::Target;

/// Why a probe did not succeed.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("health endpoint returned status {0}")]
    Status(u16),

    #[error("invalid probe address: {0}")]
    InvalidAddress(String),

    #[error("probe task panicked")]
    Panicked,
}

/// Errors building a probe transport.
#[derive(Debug, Error)]
pub enum ProbeSetupError {
    #[error("probe path must start with '/', got {0:?}")]
    InvalidPath(String),

    #[error("probe timeout must be greater than zero")]
    ZeroTimeout,
}

/// Performs a single health check against a target.
///
/// Implementations must return within their own time budget.
#[async_trait]
pub trait Prober: Send + Sync + 'static {
    async fn probe(&self, target: &Target) -> Result<(), ProbeError>;
}

/// `GET http://{target}{path}`; any 2xx is healthy.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client<HttpConnector, Body>,
    path: String,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(path: &str, timeout: Duration) -> Result<Self, ProbeSetupError> {
        if !path.starts_with('/') || path.chars().any(char::is_whitespace) {
            return Err(ProbeSetupError::InvalidPath(path.to_string()));
        }
        if timeout.is_zero() {
            return Err(ProbeSetupError::ZeroTimeout);
        }

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            path: path.to_string(),
            timeout,
        })
    }

    fn url_for(&self, target: &Target) -> Result<Url, ProbeError> {
        let mut url = Url::parse(&format!("http://{}", target))
            .map_err(|e| ProbeError::InvalidAddress(format!("{}: {}", target, e)))?;
        if url.host_str().is_none() {
            return Err(ProbeError::InvalidAddress(target.to_string()));
        }
        url.set_path(&self.path);
        Ok(url)
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, target: &Target) -> Result<(), ProbeError> {
        let url = self.url_for(target)?;
        let request = Request::builder()
            .method("GET")
            .uri(url.as_str())
            .header("user-agent", "target-health-probe")
            .body(Body::empty())
            .map_err(|e| ProbeError::InvalidAddress(e.to_string()))?;

        match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) if response.status().is_success() => Ok(()),
            Ok(Ok(response)) => {
                tracing::debug!(addr = %target, status = %response.status(), "Health probe failed: non-success status");
                Err(ProbeError::Status(response.status().as_u16()))
            }
            Ok(Err(e)) => {
                tracing::debug!(addr = %target, error = %e, "Health probe failed: connection error");
                Err(ProbeError::Connect(e.to_string()))
            }
            Err(_) => {
                tracing::debug!(addr = %target, "Health probe failed: timeout");
                Err(ProbeError::Timeout(self.timeout))
            }
        }
    }
}

/// Healthy if a TCP connection to the target can be established.
#[derive(Debug, Clone)]
pub struct TcpProber {
    timeout: Duration,
}

impl TcpProber {
    pub fn new(timeout: Duration) -> Result<Self, ProbeSetupError> {
        if timeout.is_zero() {
            return Err(ProbeSetupError::ZeroTimeout);
        }
        Ok(Self { timeout })
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, target: &Target) -> Result<(), ProbeError> {
        match time::timeout(self.timeout, TcpStream::connect(target.as_str())).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => {
                tracing::debug!(addr = %target, error = %e, "TCP probe failed");
                Err(ProbeError::Connect(e.to_string()))
            }
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        }
    }
}
