//! Alert settings view.

use serde::Serialize;
use utoipa::ToSchema;

use super::format::number;
use crate::application::alerts::LatencyAlertStatus;
use crate::domain::{AlertSettings, ALLOWED_PERCENTILES};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PercentileOption {
    pub value: u8,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertSettingsView {
    pub settings: AlertSettings,
    pub description: String,
    pub percentile_options: Vec<PercentileOption>,
    pub latency: Option<LatencyAlertStatus>,
}

pub fn describe(settings: &AlertSettings) -> String {
    format!(
        "Alert will trigger when duration exceeds {} seconds at the {}th percentile",
        number(settings.threshold_secs),
        settings.percentile
    )
}

pub fn alert_settings_view(
    settings: AlertSettings,
    latency: Option<LatencyAlertStatus>,
) -> AlertSettingsView {
    AlertSettingsView {
        description: describe(&settings),
        percentile_options: ALLOWED_PERCENTILES
            .iter()
            .map(|&p| PercentileOption {
                value: p,
                label: format!("{}th percentile", p),
            })
            .collect(),
        settings,
        latency,
    }
}
