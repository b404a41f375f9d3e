//! Latency alert settings and user-defined alert rules

pub mod rules;
pub mod settings;

pub use rules::{metric_values, AlertRuleBook, NewAlertRule};
pub use settings::{evaluate_latency, validate_settings, AlertSettingsService, LatencyAlertStatus};
