//! Health check handler

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::LiveStatus;
use crate::interfaces::http::state::AppState;

/// Service health response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok`, `loading` or `degraded`
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub subscriptions: SubscriptionHealth,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionHealth {
    pub status: String,
    pub error: Option<String>,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Live subscriptions are ready or still loading", body = HealthResponse),
        (status = 503, description = "A live subscription failed", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, subscriptions) = match state.dashboard.status() {
        LiveStatus::Ready => ("ok", SubscriptionHealth { status: "ready".into(), error: None }),
        LiveStatus::Loading => (
            "loading",
            SubscriptionHealth { status: "loading".into(), error: None },
        ),
        LiveStatus::Failed(reason) => (
            "degraded",
            SubscriptionHealth { status: "failed".into(), error: Some(reason) },
        ),
    };
    let http_status = if status == "degraded" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        http_status,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            subscriptions,
        }),
    )
}
