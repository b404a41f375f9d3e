//! Dashboard view handlers
//!
//! Every handler renders from the session's current live values; nothing
//! here reads the store directly.

use axum::{
    extract::{Query, State},
    Json,
};

use super::dto::ViewQuery;
use crate::application::dashboard::DashboardSession;
use crate::interfaces::http::common::{ApiResponse, ApiResult};
use crate::interfaces::http::state::AppState;
use crate::views::{
    dashboard_view, errors_view, performance_view, record_table, DashboardInputs, DashboardTab,
    DashboardView, ErrorFilter, ErrorsView, PerformanceView, RecordTable, TableView,
};

pub fn render_dashboard(
    session: &DashboardSession,
    tab: DashboardTab,
    filter: &ErrorFilter,
) -> DashboardView {
    let users = session.users();
    let errors = session.errors();
    let metrics = session.metrics();
    let inputs = DashboardInputs {
        stats: session.aggregate().stats,
        users: &users,
        errors: &errors,
        metrics: &metrics,
        error_filter: filter,
    };
    dashboard_view(tab, &inputs)
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "Dashboard",
    security(("bearer_auth" = [])),
    params(ViewQuery),
    responses(
        (status = 200, description = "Tabs, stat cards and the selected tab", body = ApiResponse<DashboardView>),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Signed in without the admin role"),
        (status = 422, description = "Unknown tab or severity")
    )
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<DashboardView> {
    let tab = query.tab()?;
    let filter = query.error_filter()?;
    Ok(Json(ApiResponse::success(render_dashboard(
        &state.dashboard,
        tab,
        &filter,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Registered users", body = ApiResponse<TableView>),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Signed in without the admin role")
    )
)]
pub async fn list_users(State(state): State<AppState>) -> Json<ApiResponse<TableView>> {
    let users = state.dashboard.users();
    Json(ApiResponse::success(record_table(RecordTable::Users, &users)))
}

#[utoipa::path(
    get,
    path = "/api/v1/database",
    tag = "Dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Database monitor over the users collection", body = ApiResponse<TableView>),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Signed in without the admin role")
    )
)]
pub async fn database_monitor(State(state): State<AppState>) -> Json<ApiResponse<TableView>> {
    let users = state.dashboard.users();
    Json(ApiResponse::success(record_table(RecordTable::Database, &users)))
}

#[utoipa::path(
    get,
    path = "/api/v1/performance",
    tag = "Dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Login API performance", body = ApiResponse<PerformanceView>),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Signed in without the admin role")
    )
)]
pub async fn performance(State(state): State<AppState>) -> Json<ApiResponse<PerformanceView>> {
    let metrics = state.dashboard.metrics();
    Json(ApiResponse::success(performance_view(&metrics)))
}

#[utoipa::path(
    get,
    path = "/api/v1/errors",
    tag = "Dashboard",
    security(("bearer_auth" = [])),
    params(ViewQuery),
    responses(
        (status = 200, description = "Recorded login errors, filtered", body = ApiResponse<ErrorsView>),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Signed in without the admin role"),
        (status = 422, description = "Unknown severity")
    )
)]
pub async fn list_errors(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<ErrorsView> {
    let filter = query.error_filter()?;
    let errors = state.dashboard.errors();
    Ok(Json(ApiResponse::success(errors_view(&errors, &filter))))
}
