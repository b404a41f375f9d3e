use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use utoipa::ToSchema;

use crate::domain::document::{Document, FromDocument};

/// Percentiles offered by the alert settings form.
pub const ALLOWED_PERCENTILES: [u8; 5] = [50, 75, 85, 90, 95];

/// Latency alert configuration of one admin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertSettings {
    pub enabled: bool,
    /// Duration threshold in seconds.
    pub threshold_secs: f64,
    /// One of [`ALLOWED_PERCENTILES`].
    pub percentile: u8,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_secs: 1.0,
            percentile: 85,
        }
    }
}

impl AlertSettings {
    pub fn to_data(&self) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("enabled".into(), json!(self.enabled));
        data.insert("thresholdSecs".into(), json!(self.threshold_secs));
        data.insert("percentile".into(), json!(self.percentile));
        data
    }
}

impl FromDocument for AlertSettings {
    fn from_document(doc: &Document) -> Self {
        let defaults = Self::default();
        Self {
            enabled: doc
                .field("enabled")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.enabled),
            threshold_secs: doc
                .f64_field("thresholdSecs")
                .filter(|v| v.is_finite() && *v >= 0.0)
                .unwrap_or(defaults.threshold_secs),
            percentile: doc
                .u64_field("percentile")
                .and_then(|p| u8::try_from(p).ok())
                .filter(|p| ALLOWED_PERCENTILES.contains(p))
                .unwrap_or(defaults.percentile),
        }
    }
}

/// How often a rule may fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AlertFrequency {
    Once,
    Recurring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ComparisonOperator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "==")]
    Equal,
}

impl ComparisonOperator {
    pub fn holds(&self, observed: f64, threshold: f64) -> bool {
        match self {
            Self::GreaterThan => observed > threshold,
            Self::GreaterOrEqual => observed >= threshold,
            Self::LessThan => observed < threshold,
            Self::LessOrEqual => observed <= threshold,
            Self::Equal => (observed - threshold).abs() < f64::EPSILON,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::GreaterThan => ">",
            Self::GreaterOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessOrEqual => "<=",
            Self::Equal => "==",
        };
        f.write_str(symbol)
    }
}

/// `field operator value`, e.g. `failedCalls > 10`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AlertCondition {
    pub field: String,
    pub operator: ComparisonOperator,
    pub value: f64,
}

/// A user-defined alert rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertRule {
    pub id: String,
    pub user_id: String,
    pub condition: AlertCondition,
    pub frequency: AlertFrequency,
    pub notification_message: String,
    /// `None` once a one-shot rule has fired.
    pub next_alert_time: Option<DateTime<Utc>>,
}

/// A rule whose condition held during a check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriggeredAlert {
    pub rule_id: String,
    pub user_id: String,
    pub alert_message: String,
    pub condition: AlertCondition,
    pub observed: f64,
}
