//! API router with Swagger UI

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::common::ApiResponse;
use super::middleware::{admin_guard, http_metrics, session_guard, Unauthenticated};
use super::modules::{alerts, auth, chat, dashboard, health, metrics};
use super::state::AppState;
use crate::application::alerts::{LatencyAlertStatus, NewAlertRule};
use crate::application::MetricsAggregate;
use crate::config::CorsConfig;
use crate::domain::{
    AlertCondition, AlertFrequency, AlertRule, AlertSettings, ComparisonOperator, ErrorRecord,
    Identity, Severity, StatCardInfo, TriggeredAlert,
};
use crate::views::{
    AlertSettingsView, ChartSeries, DashboardTab, DashboardView, ErrorsView, MetricCard,
    PercentileOption, PerformanceView, RecordTable, SeverityCounts, SeverityFilter, StatCardView,
    TabContent, TabView, TableRow, TableView,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token from /api/v1/auth/login. The authToken cookie and the token query parameter are accepted too.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        auth::logout,
        auth::current_user,
        dashboard::get_dashboard,
        dashboard::dashboard_live,
        dashboard::list_users,
        dashboard::database_monitor,
        dashboard::performance,
        dashboard::list_errors,
        alerts::get_alert_settings,
        alerts::update_alert_settings,
        alerts::list_alert_rules,
        alerts::create_alert_rule,
        alerts::check_alerts,
        chat::chat,
    ),
    components(
        schemas(
            ApiResponse<String>,
            Unauthenticated,
            health::HealthResponse,
            health::SubscriptionHealth,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::RegisterRequest,
            auth::CurrentUser,
            Identity,
            DashboardView,
            DashboardTab,
            TabView,
            StatCardView,
            StatCardInfo,
            TabContent,
            TableView,
            TableRow,
            RecordTable,
            PerformanceView,
            MetricCard,
            ChartSeries,
            MetricsAggregate,
            ErrorsView,
            ErrorRecord,
            Severity,
            SeverityFilter,
            SeverityCounts,
            AlertSettings,
            AlertSettingsView,
            PercentileOption,
            LatencyAlertStatus,
            AlertRule,
            NewAlertRule,
            AlertCondition,
            AlertFrequency,
            ComparisonOperator,
            TriggeredAlert,
            chat::ChatRequest,
            chat::ChatReply,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service and live subscription health"),
        (name = "Authentication", description = "Email/password sessions backed by JWT"),
        (name = "Dashboard", description = "Admin-only views over the live collections"),
        (name = "Alerts", description = "Latency alert settings and user-defined alert rules"),
        (name = "Assistant", description = "Chat assistant answering from the dashboard counters"),
    ),
    info(
        title = "Admin Dashboard API",
        version = "1.0.0",
        description = "Live administrative dashboard: users, login performance, errors and alerts",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Create the API router with all routes
pub fn create_api_router(state: AppState, cors: &CorsConfig) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .with_state(state.clone());

    // Auth routes (any signed-in user)
    let session_routes = Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::current_user))
        .layer(middleware::from_fn_with_state(state.clone(), session_guard))
        .with_state(state.clone());

    // Dashboard, settings and alerts (admins only)
    let admin_routes = Router::new()
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/dashboard/live", get(dashboard::dashboard_live))
        .route("/users", get(dashboard::list_users))
        .route("/database", get(dashboard::database_monitor))
        .route("/performance", get(dashboard::performance))
        .route("/errors", get(dashboard::list_errors))
        .route(
            "/settings/alerts",
            get(alerts::get_alert_settings).put(alerts::update_alert_settings),
        )
        .route(
            "/alerts/rules",
            get(alerts::list_alert_rules).post(alerts::create_alert_rule),
        )
        .route("/alerts/check", post(alerts::check_alerts))
        .layer(middleware::from_fn_with_state(state.clone(), admin_guard))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::prometheus_metrics))
        .route("/chat", post(chat::chat))
        .with_state(state);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .merge(public_routes)
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/auth", session_routes)
        .nest("/api/v1", admin_routes)
        .layer(middleware::from_fn(http_metrics))
        .layer(cors_layer(cors))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    use axum::body::Body;
    use axum::http::{header, HeaderMap, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::application::access::NOT_ADMIN_MESSAGE;
    use crate::application::alerts::{AlertRuleBook, AlertSettingsService};
    use crate::application::assistant::{ChatService, StatsReplyGenerator};
    use crate::application::dashboard::DashboardSession;
    use crate::application::{AccessGuard, AuthService, LiveCollectionBinder, LoginMetricsRecorder};
    use crate::domain::{CredentialProvider, DocumentStore};
    use crate::infrastructure::crypto::JwtConfig;
    use crate::infrastructure::identity::LocalCredentialProvider;
    use crate::infrastructure::storage::InMemoryDocumentStore;
    use crate::shared::RetryConfig;

    const ADMIN: (&str, &str) = ("admin@example.com", "admin123");
    const MEMBER: (&str, &str) = ("member@example.com", "member123");

    async fn app() -> Router {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let jwt = JwtConfig {
            secret: "router-test-secret".into(),
            expiration_hours: 1,
            issuer: "admin-dashboard".into(),
        };
        let provider = Arc::new(LocalCredentialProvider::new(store.clone(), jwt).with_bcrypt_cost(4));
        provider
            .ensure_admin(ADMIN.0, ADMIN.1, Some("Admin"))
            .await
            .unwrap();
        provider.register(MEMBER.0, MEMBER.1, None).await.unwrap();
        let credentials: Arc<dyn CredentialProvider> = provider;

        let binder = LiveCollectionBinder::new(store.clone());
        let dashboard = DashboardSession::open(&binder, &RetryConfig::default())
            .await
            .unwrap();

        let state = AppState {
            auth: Arc::new(AuthService::new(
                credentials.clone(),
                LoginMetricsRecorder::new(store.clone()),
            )),
            guard: Arc::new(AccessGuard::new(credentials, store.clone())),
            dashboard: Arc::new(dashboard),
            alert_settings: Arc::new(AlertSettingsService::new(store)),
            alert_rules: Arc::new(AlertRuleBook::new()),
            chat: Arc::new(ChatService::new(Arc::new(StatsReplyGenerator))),
            metrics: None,
            started_at: Instant::now(),
        };
        create_api_router(state, &CorsConfig::default())
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn login(app: &Router, (email, password): (&str, &str)) -> String {
        let (status, _, body) = send(
            app,
            json_request(
                "POST",
                "/api/v1/auth/login",
                None,
                json!({"email": email, "password": password}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    #[test]
    fn openapi_documents_dashboard_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/dashboard",
            "/api/v1/dashboard/live",
            "/api/v1/errors",
            "/chat",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
    }

    #[tokio::test]
    async fn anonymous_is_sent_to_login() {
        let app = app().await;
        let (status, _, body) = send(&app, get("/api/v1/users", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["redirect"], "/login");
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let app = app().await;
        let token = login(&app, MEMBER).await;
        let (status, _, body) = send(&app, get("/api/v1/dashboard", Some(&token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], NOT_ADMIN_MESSAGE);
    }

    #[tokio::test]
    async fn admin_sees_users_table() {
        let app = app().await;
        let token = login(&app, ADMIN).await;
        let (status, _, body) = send(&app, get("/api/v1/users", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn login_cookie_authenticates() {
        let app = app().await;
        let (status, headers, _) = send(
            &app,
            json_request(
                "POST",
                "/api/v1/auth/login",
                None,
                json!({"email": ADMIN.0, "password": ADMIN.1}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let cookie = headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("authToken="));

        let request = Request::builder()
            .uri("/api/v1/dashboard?tab=2")
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["activeTab"], 2);
        assert_eq!(body["data"]["content"]["kind"], "users");
    }

    #[tokio::test]
    async fn token_query_parameter_authenticates() {
        let app = app().await;
        let token = login(&app, ADMIN).await;
        let uri = format!("/api/v1/performance?token={}", token);
        let (status, _, _) = send(&app, get(&uri, None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn bad_credentials_and_malformed_input() {
        let app = app().await;
        let (status, _, _) = send(
            &app,
            json_request(
                "POST",
                "/api/v1/auth/login",
                None,
                json!({"email": ADMIN.0, "password": "wrong-password"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, _) = send(
            &app,
            json_request(
                "POST",
                "/api/v1/auth/login",
                None,
                json!({"email": "not-an-email", "password": "secret1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn logout_revokes_session() {
        let app = app().await;
        let token = login(&app, MEMBER).await;

        let (status, _, body) = send(&app, get("/api/v1/auth/me", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["user"]["email"], MEMBER.0);
        assert_eq!(body["data"]["access"]["state"], "forbidden");

        let (status, headers, _) = send(
            &app,
            json_request("POST", "/api/v1/auth/logout", Some(&token), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let cleared = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cleared.contains("Max-Age=0"));

        let (status, _, _) = send(&app, get("/api/v1/auth/me", Some(&token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_tab_is_rejected() {
        let app = app().await;
        let token = login(&app, ADMIN).await;
        let (status, _, _) = send(&app, get("/api/v1/dashboard?tab=9", Some(&token))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let (status, _, _) = send(&app, get("/api/v1/errors?severity=fatal", Some(&token))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn failed_login_shows_up_in_errors() {
        let app = app().await;
        let _ = send(
            &app,
            json_request(
                "POST",
                "/api/v1/auth/login",
                None,
                json!({"email": MEMBER.0, "password": "nope-nope"}),
            ),
        )
        .await;
        let token = login(&app, ADMIN).await;

        let deadline = Instant::now() + std::time::Duration::from_secs(2);
        loop {
            let (status, _, body) =
                send(&app, get("/api/v1/errors?severity=warning", Some(&token))).await;
            assert_eq!(status, StatusCode::OK);
            if body["data"]["errors"].as_array().is_some_and(|e| e.len() == 1) {
                assert_eq!(body["data"]["counts"]["warning"], 1);
                break;
            }
            assert!(Instant::now() < deadline, "error never appeared: {body}");
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
    }

    #[tokio::test]
    async fn alert_settings_round_trip() {
        let app = app().await;
        let token = login(&app, ADMIN).await;

        let (status, _, body) = send(&app, get("/api/v1/settings/alerts", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["settings"]["percentile"], 85);

        let (status, _, _) = send(
            &app,
            json_request(
                "PUT",
                "/api/v1/settings/alerts",
                Some(&token),
                json!({"enabled": true, "thresholdSecs": 2.5, "percentile": 42}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _, _) = send(
            &app,
            json_request(
                "PUT",
                "/api/v1/settings/alerts",
                Some(&token),
                json!({"enabled": false, "thresholdSecs": 2.5, "percentile": 95}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, _, body) = send(&app, get("/api/v1/settings/alerts", Some(&token))).await;
        assert_eq!(body["data"]["settings"]["enabled"], false);
        assert_eq!(body["data"]["settings"]["percentile"], 95);
    }

    #[tokio::test]
    async fn alert_rules_for_own_account_only() {
        let app = app().await;
        let token = login(&app, ADMIN).await;

        let rule = json!({
            "condition": {"field": "totalUsers", "operator": ">=", "value": 1},
            "frequency": "once",
            "notificationMessage": "Users signed up"
        });
        let (status, _, body) = send(
            &app,
            json_request("POST", "/api/v1/alerts/rules", Some(&token), rule),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        let foreign = json!({
            "userId": "someone-else",
            "condition": {"field": "totalUsers", "operator": ">", "value": 0},
            "frequency": "recurring",
            "notificationMessage": "x"
        });
        let (status, _, _) = send(
            &app,
            json_request("POST", "/api/v1/alerts/rules", Some(&token), foreign),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, _, body) = send(&app, get("/api/v1/alerts/rules", Some(&token))).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        // Not due for another minute
        let (status, _, body) = send(
            &app,
            json_request("POST", "/api/v1/alerts/check", Some(&token), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn chat_greets_on_empty_message() {
        let app = app().await;
        let (status, _, body) = send(
            &app,
            json_request(
                "POST",
                "/chat",
                None,
                json!({"message": "", "statCardInfo": {"totalUsers": 3}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let reply = body["data"]["reply"].as_str().unwrap();
        assert!(reply.starts_with("Hello!"));
        assert!(reply.contains("Total Users: 3"));
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = app().await;
        let (status, _, body) = send(&app, get("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["status"] == "ok" || body["status"] == "loading");
    }
}
