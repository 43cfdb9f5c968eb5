//! Admin HTTP endpoint.
//!
//! - `GET /healthz`: liveness, unauthenticated
//! - `GET /admin/status`: version
//! - `GET /admin/targets`: current snapshot
//! - `POST /admin/refresh`: re-read targets at the next round

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::health::MonitorHandle;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// State injected into admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub handle: MonitorHandle,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(handle: MonitorHandle, api_key: &str) -> Self {
        Self {
            handle,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    let protected = Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/targets", get(get_targets))
        .route("/admin/refresh", post(post_refresh))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware));

    Router::new()
        .route("/healthz", get(healthz))
        .merge(protected)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve the admin router until the shutdown flag is raised.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin endpoint listening");

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await?;

    tracing::info!("Admin endpoint stopped");
    Ok(())
}
