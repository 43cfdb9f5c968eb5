use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::health::{Snapshot, Target};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct TargetCounts {
    pub healthy: usize,
    pub unhealthy: usize,
}

#[derive(Serialize)]
pub struct TargetsResponse {
    pub healthy: Vec<Target>,
    pub unhealthy: Vec<Target>,
    pub counts: TargetCounts,
}

impl From<&Snapshot> for TargetsResponse {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            healthy: snapshot.healthy().to_vec(),
            unhealthy: snapshot.unhealthy().to_vec(),
            counts: TargetCounts {
                healthy: snapshot.healthy().len(),
                unhealthy: snapshot.unhealthy().len(),
            },
        }
    }
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

pub async fn get_targets(State(state): State<AdminState>) -> Json<TargetsResponse> {
    let snapshot = state.handle.read();
    Json(TargetsResponse::from(snapshot.as_ref()))
}

pub async fn post_refresh(State(state): State<AdminState>) -> StatusCode {
    state.handle.request_refresh();
    tracing::info!("Target refresh requested via admin API");
    StatusCode::ACCEPTED
}

pub async fn healthz() -> &'static str {
    "ok"
}
