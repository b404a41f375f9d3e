//! Request middleware
//!
//! - `admin_guard`: lets a request through only when the access guard
//!   resolves it to an authenticated admin
//! - `session_guard`: requires any valid session
//! - `http_metrics`: request counter and latency histogram
//!
//! A credential is read from `Authorization: Bearer`, then the `?token=`
//! query parameter, then the `authToken` cookie.

use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, Query, Request, State},
    http::{header, HeaderMap, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use super::common::{ApiError, ApiResponse};
use super::state::AppState;
use crate::application::AccessState;

/// Cookie holding the session token on browser clients.
pub const AUTH_COOKIE: &str = "authToken";

/// The raw credential of the current request, inserted next to its
/// [`Identity`](crate::domain::Identity).
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
}

fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

pub fn extract_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let from_query = || {
        Query::<TokenQuery>::try_from_uri(uri)
            .ok()
            .and_then(|Query(q)| q.token)
    };
    bearer(headers)
        .or_else(from_query)
        .or_else(|| cookie(headers, AUTH_COOKIE))
        .filter(|token| !token.is_empty())
}

/// Body of a 401 from the admin guard.
#[derive(Debug, Serialize, ToSchema)]
pub struct Unauthenticated {
    pub success: bool,
    pub error: String,
    /// Relative route the client should navigate to
    pub redirect: String,
}

fn unauthenticated(redirect: String) -> Response {
    let body = Unauthenticated {
        success: false,
        error: "Authentication required".to_string(),
        redirect,
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

pub async fn admin_guard(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let token = extract_token(request.headers(), request.uri());

    match state.guard.evaluate(token.as_deref()).await {
        AccessState::Authenticated { identity } => {
            debug!(uid = %identity.uid, path = %request.uri().path(), "Admin access granted");
            request.extensions_mut().insert(identity);
            if let Some(token) = token {
                request.extensions_mut().insert(SessionToken(token));
            }
            next.run(request).await
        }
        AccessState::Unauthenticated { redirect_to } => unauthenticated(redirect_to),
        AccessState::Forbidden { reason } => {
            (StatusCode::FORBIDDEN, Json(ApiResponse::<()>::error(reason))).into_response()
        }
        // evaluate() only returns terminal states
        AccessState::Loading | AccessState::CheckingRole { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::<()>::error("Access check did not complete")),
        )
            .into_response(),
    }
}

pub async fn session_guard(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let Some(token) = extract_token(request.headers(), request.uri()) else {
        return unauthenticated(crate::application::access::LOGIN_ROUTE.to_string());
    };

    match state.auth.current_identity(&token).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            request.extensions_mut().insert(SessionToken(token));
            next.run(request).await
        }
        Err(e) => ApiError(e).into_response(),
    }
}

/// Records `http_requests_total{method,path,status}` and
/// `http_request_duration_seconds{method,path}`. Unmatched requests are
/// grouped under `unmatched` so scanners cannot blow up label cardinality.
pub async fn http_metrics(request: Request<Body>, next: Next) -> Response {
    let method = request.method().as_str().to_owned();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_owned(), |p| p.as_str().to_owned());

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed = started.elapsed().as_secs_f64();

    metrics::counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(elapsed);

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn bearer_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("authToken=cookie"));
        assert_eq!(
            extract_token(&headers, &uri("/api/v1/users?token=query")).as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn query_parameter_before_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("authToken=cookie"));
        assert_eq!(
            extract_token(&headers, &uri("/live?tab=1&token=query")).as_deref(),
            Some("query")
        );
    }

    #[test]
    fn cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; authToken=from-cookie; lang=en"),
        );
        assert_eq!(
            extract_token(&headers, &uri("/api/v1/users")).as_deref(),
            Some("from-cookie")
        );
    }

    #[test]
    fn no_credential() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        headers.insert(header::COOKIE, HeaderValue::from_static("authToken="));
        assert_eq!(extract_token(&headers, &uri("/api/v1/users")), None);
    }
}
