//! Collection and document names shared by every component that talks to
//! the document store.

/// uid-keyed profile documents carrying the `role` attribute.
pub const USERS: &str = "users";
/// Ambient dashboard counters.
pub const DASHBOARD_STATS: &str = "dashboardStats";
/// API metrics documents.
pub const API_METRICS: &str = "apiMetrics";
/// The single login metrics document inside [`API_METRICS`].
pub const LOGIN_METRICS_DOC: &str = "login-metrics";
/// Append-only log of failed login attempts.
pub const LOGIN_ERRORS: &str = "loginErrors";
/// Per-user latency alert settings.
pub const ALERT_SETTINGS: &str = "alertSettings";

/// Role value granting access to the dashboard.
pub const ADMIN_ROLE: &str = "admin";
