//! Authentication API handlers

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};

use super::dto::{CurrentUser, LoginRequest, LoginResponse, RegisterRequest};
use crate::domain::Identity;
use crate::interfaces::http::common::{ApiError, ApiResponse, ValidatedJson};
use crate::interfaces::http::middleware::{SessionToken, AUTH_COOKIE};
use crate::interfaces::http::state::AppState;

fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        AUTH_COOKIE, token, max_age_secs
    )
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in; also sets the authToken cookie", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid email or password"),
        (status = 422, description = "Malformed email or short password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.auth.login(&request.email, &request.password).await?;

    let cookie = session_cookie(&session.token, session.expires_in);
    let body = LoginResponse {
        token: session.token,
        token_type: "Bearer".to_string(),
        expires_in: session.expires_in,
        user: session.identity,
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(ApiResponse::success(body))))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<Identity>),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Identity>>), ApiError> {
    let identity = state
        .auth
        .register(
            &request.email,
            &request.password,
            request.display_name.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(identity))))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Session revoked; clears the authToken cookie"),
        (status = 401, description = "No valid session")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.logout(&token).await?;
    Ok((
        [(header::SET_COOKIE, session_cookie("", 0))],
        Json(ApiResponse::success(())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current session", body = ApiResponse<CurrentUser>),
        (status = 401, description = "No valid session")
    )
)]
pub async fn current_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Json<ApiResponse<CurrentUser>> {
    let access = state.guard.evaluate(Some(&token)).await;
    Json(ApiResponse::success(CurrentUser {
        user: identity,
        access,
    }))
}
