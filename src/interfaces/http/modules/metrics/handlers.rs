//! `GET /metrics` renders the process-wide Prometheus recorder: login
//! attempts and durations, HTTP request counters and the number of active
//! live subscriptions.

use axum::{extract::State, http::header, http::StatusCode, response::IntoResponse};

use crate::interfaces::http::state::AppState;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
            handle.render(),
        ),
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
            "# metrics recorder not installed\n".to_string(),
        ),
    }
}
