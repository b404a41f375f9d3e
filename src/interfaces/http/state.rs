//! Shared handler state

use std::sync::Arc;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::application::alerts::{AlertRuleBook, AlertSettingsService};
use crate::application::assistant::ChatService;
use crate::application::dashboard::DashboardSession;
use crate::application::{AccessGuard, AuthService};

/// Services every route group draws from. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub guard: Arc<AccessGuard>,
    pub dashboard: Arc<DashboardSession>,
    pub alert_settings: Arc<AlertSettingsService>,
    pub alert_rules: Arc<AlertRuleBook>,
    pub chat: Arc<ChatService>,
    pub metrics: Option<PrometheusHandle>,
    pub started_at: Instant,
}
