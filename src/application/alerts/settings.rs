//! Latency alert settings
//!
//! Settings live at `alertSettings/{uid}`; a missing document means the
//! defaults. Evaluation compares the configured percentile of the recorded
//! login response times against the threshold.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::application::metrics::percentile;
use crate::domain::{
    collections, AlertSettings, DocumentStore, DomainError, DomainResult, FromDocument,
    ALLOWED_PERCENTILES,
};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LatencyAlertStatus {
    pub enabled: bool,
    pub percentile: u8,
    pub threshold_secs: f64,
    /// Observed duration at the percentile, absent without samples
    pub observed_secs: Option<f64>,
    pub triggered: bool,
}

pub fn validate_settings(settings: &AlertSettings) -> DomainResult<()> {
    if !settings.threshold_secs.is_finite() || settings.threshold_secs < 0.0 {
        return Err(DomainError::Validation(
            "threshold must be a non-negative number of seconds".into(),
        ));
    }
    if !ALLOWED_PERCENTILES.contains(&settings.percentile) {
        return Err(DomainError::Validation(format!(
            "percentile must be one of {:?}",
            ALLOWED_PERCENTILES
        )));
    }
    Ok(())
}

/// Evaluate settings against response times in milliseconds.
pub fn evaluate_latency(settings: &AlertSettings, response_times_ms: &[f64]) -> LatencyAlertStatus {
    let observed_secs = percentile(response_times_ms, settings.percentile).map(|ms| ms / 1000.0);
    let triggered =
        settings.enabled && observed_secs.is_some_and(|secs| secs > settings.threshold_secs);

    LatencyAlertStatus {
        enabled: settings.enabled,
        percentile: settings.percentile,
        threshold_secs: settings.threshold_secs,
        observed_secs,
        triggered,
    }
}

#[derive(Clone)]
pub struct AlertSettingsService {
    store: Arc<dyn DocumentStore>,
}

impl AlertSettingsService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, uid: &str) -> DomainResult<AlertSettings> {
        Ok(self
            .store
            .get(collections::ALERT_SETTINGS, uid)
            .await?
            .map(|doc| AlertSettings::from_document(&doc))
            .unwrap_or_default())
    }

    pub async fn save(&self, uid: &str, settings: AlertSettings) -> DomainResult<AlertSettings> {
        validate_settings(&settings)?;
        self.store
            .set(collections::ALERT_SETTINGS, uid, settings.to_data())
            .await?;
        info!(
            uid,
            enabled = settings.enabled,
            threshold_secs = settings.threshold_secs,
            percentile = settings.percentile,
            "Alert settings saved"
        );
        Ok(settings)
    }
}
