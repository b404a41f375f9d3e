//! Login metrics recorder
//!
//! Every login attempt bumps the counters of `apiMetrics/login-metrics`
//! in one atomic transform; failed attempts also append to `loginErrors`.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map};
use tracing::debug;

use crate::domain::{
    collections, DocumentStore, DomainError, DomainResult, FieldTransform, Severity,
};

/// Name stored on the metrics document when it is first created.
pub const LOGIN_METRIC_NAME: &str = "login-api";

#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Succeeded,
    Failed { message: String, severity: Severity },
}

impl LoginOutcome {
    pub fn failed(err: &DomainError) -> Self {
        Self::Failed {
            message: failure_message(err),
            severity: classify_failure(err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Credential rejections are warnings; anything else is critical.
pub fn classify_failure(err: &DomainError) -> Severity {
    match err {
        DomainError::Auth(_) | DomainError::Validation(_) => Severity::Warning,
        _ => Severity::Critical,
    }
}

fn failure_message(err: &DomainError) -> String {
    let message = match err {
        DomainError::Auth(m)
        | DomainError::Network(m)
        | DomainError::Permission(m)
        | DomainError::Validation(m)
        | DomainError::Conflict(m)
        | DomainError::Configuration(m)
        | DomainError::Internal(m) => m.clone(),
        other => other.to_string(),
    };
    if message.trim().is_empty() {
        "An unknown error occurred.".to_string()
    } else {
        message
    }
}

#[derive(Clone)]
pub struct LoginMetricsRecorder {
    store: Arc<dyn DocumentStore>,
}

impl LoginMetricsRecorder {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, outcome: &LoginOutcome, response_time_ms: u64) -> DomainResult<()> {
        let failed = i64::from(!outcome.is_success());
        let transforms = [
            FieldTransform::increment("totalCalls", 1),
            FieldTransform::increment("failedCalls", failed),
            FieldTransform::append("responseTimes", response_time_ms),
            FieldTransform::set_if_absent("metricName", LOGIN_METRIC_NAME),
        ];
        self.store
            .transform(
                collections::API_METRICS,
                collections::LOGIN_METRICS_DOC,
                &transforms,
            )
            .await?;

        if let LoginOutcome::Failed { message, severity } = outcome {
            let mut error = Map::new();
            error.insert("errorMessage".into(), json!(message));
            error.insert("timestamp".into(), json!(Utc::now().to_rfc3339()));
            error.insert("responseTime".into(), json!(response_time_ms));
            error.insert("severity".into(), json!(severity.as_str()));
            let id = self.store.add(collections::LOGIN_ERRORS, error).await?;
            debug!(error_id = %id, %severity, "Login error recorded");
        }

        Ok(())
    }
}
