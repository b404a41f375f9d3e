//! Alert settings and rule handlers
//!
//! Settings and rules are scoped to the calling admin.

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;

use crate::application::alerts::{evaluate_latency, metric_values, NewAlertRule};
use crate::application::compute_aggregate;
use crate::domain::{AlertRule, AlertSettings, Identity, TriggeredAlert};
use crate::interfaces::http::common::{ApiError, ApiResponse, ApiResult};
use crate::interfaces::http::state::AppState;
use crate::views::{alert_settings_view, AlertSettingsView};

fn settings_view(state: &AppState, settings: AlertSettings) -> AlertSettingsView {
    let metrics = state.dashboard.metrics();
    let latency = metrics
        .items
        .first()
        .map(|snapshot| evaluate_latency(&settings, &snapshot.response_times));
    alert_settings_view(settings, latency)
}

#[utoipa::path(
    get,
    path = "/api/v1/settings/alerts",
    tag = "Alerts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's latency alert settings", body = ApiResponse<AlertSettingsView>),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Signed in without the admin role")
    )
)]
pub async fn get_alert_settings(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<AlertSettingsView> {
    let settings = state.alert_settings.get(&identity.uid).await?;
    Ok(Json(ApiResponse::success(settings_view(&state, settings))))
}

#[utoipa::path(
    put,
    path = "/api/v1/settings/alerts",
    tag = "Alerts",
    security(("bearer_auth" = [])),
    request_body = AlertSettings,
    responses(
        (status = 200, description = "Settings saved", body = ApiResponse<AlertSettingsView>),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Signed in without the admin role"),
        (status = 422, description = "Negative threshold or unsupported percentile")
    )
)]
pub async fn update_alert_settings(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(settings): Json<AlertSettings>,
) -> ApiResult<AlertSettingsView> {
    let saved = state.alert_settings.save(&identity.uid, settings).await?;
    Ok(Json(ApiResponse::success(settings_view(&state, saved))))
}

#[utoipa::path(
    get,
    path = "/api/v1/alerts/rules",
    tag = "Alerts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's alert rules", body = ApiResponse<Vec<AlertRule>>),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Signed in without the admin role")
    )
)]
pub async fn list_alert_rules(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Json<ApiResponse<Vec<AlertRule>>> {
    Json(ApiResponse::success(
        state.alert_rules.list_for(&identity.uid).await,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/alerts/rules",
    tag = "Alerts",
    security(("bearer_auth" = [])),
    request_body = NewAlertRule,
    responses(
        (status = 201, description = "Rule created", body = ApiResponse<AlertRule>),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Rule targets another user, or caller is not an admin"),
        (status = 422, description = "Empty field or non-numeric value")
    )
)]
pub async fn create_alert_rule(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(rule): Json<NewAlertRule>,
) -> Result<(StatusCode, Json<ApiResponse<AlertRule>>), ApiError> {
    let rule = state
        .alert_rules
        .add(&identity.uid, rule, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(rule))))
}

#[utoipa::path(
    post,
    path = "/api/v1/alerts/check",
    tag = "Alerts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Rules that fired during this check", body = ApiResponse<Vec<TriggeredAlert>>),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Signed in without the admin role")
    )
)]
pub async fn check_alerts(State(state): State<AppState>) -> Json<ApiResponse<Vec<TriggeredAlert>>> {
    let snapshot = state
        .dashboard
        .metrics()
        .items
        .into_iter()
        .next()
        .unwrap_or_default();
    let values = metric_values(
        &compute_aggregate(&snapshot),
        &state.dashboard.aggregate().stats,
    );
    let triggered = state.alert_rules.check_and_trigger(&values, Utc::now()).await;
    Json(ApiResponse::success(triggered))
}
