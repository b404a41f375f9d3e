//! Per-user alert rules
//!
//! Rules are kept in process. A rule is due when its `next_alert_time`
//! has passed; firing a one-shot rule retires it, firing a recurring rule
//! pushes it an hour out.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;
use utoipa::ToSchema;

use crate::application::metrics::MetricsAggregate;
use crate::domain::{
    AlertCondition, AlertFrequency, AlertRule, DashboardStats, DomainError, DomainResult,
    TriggeredAlert,
};

/// Body of a rule creation request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAlertRule {
    /// Must match the caller when present
    #[serde(default)]
    pub user_id: Option<String>,
    pub condition: AlertCondition,
    pub frequency: AlertFrequency,
    pub notification_message: String,
}

/// First due time of a newly created rule.
fn first_alert_time(frequency: AlertFrequency, now: DateTime<Utc>) -> DateTime<Utc> {
    match frequency {
        AlertFrequency::Once => now + Duration::minutes(1),
        AlertFrequency::Recurring => now + Duration::hours(1),
    }
}

fn next_alert_time(frequency: AlertFrequency, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match frequency {
        AlertFrequency::Once => None,
        AlertFrequency::Recurring => Some(now + Duration::hours(1)),
    }
}

/// Named values a rule condition can refer to.
pub fn metric_values(metrics: &MetricsAggregate, stats: &DashboardStats) -> HashMap<String, f64> {
    let mut values = HashMap::from([
        ("totalCalls".to_string(), metrics.total as f64),
        ("successfulCalls".to_string(), metrics.successful as f64),
        ("failedCalls".to_string(), metrics.failed as f64),
        ("successRate".to_string(), metrics.success_rate_pct),
        ("totalUsers".to_string(), stats.total_users as f64),
        ("activeErrors".to_string(), stats.active_errors as f64),
        ("apiRequests".to_string(), stats.api_requests as f64),
        ("databaseOps".to_string(), stats.database_ops as f64),
    ]);
    if let Some(avg) = metrics.avg_response_time_ms {
        values.insert("avgResponseTime".to_string(), avg);
    }
    values
}

#[derive(Default)]
pub struct AlertRuleBook {
    rules: RwLock<Vec<AlertRule>>,
}

impl AlertRuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(
        &self,
        owner: &str,
        rule: NewAlertRule,
        now: DateTime<Utc>,
    ) -> DomainResult<AlertRule> {
        if rule.user_id.as_deref().is_some_and(|id| id != owner) {
            return Err(DomainError::Permission(
                "You can only add rules for your own account.".into(),
            ));
        }
        if rule.condition.field.trim().is_empty() {
            return Err(DomainError::Validation("condition field is required".into()));
        }
        if !rule.condition.value.is_finite() {
            return Err(DomainError::Validation("condition value must be a number".into()));
        }

        let rule = AlertRule {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: owner.to_string(),
            condition: rule.condition,
            frequency: rule.frequency,
            notification_message: rule.notification_message,
            next_alert_time: Some(first_alert_time(rule.frequency, now)),
        };
        self.rules.write().await.push(rule.clone());

        info!(rule_id = %rule.id, user_id = owner, field = %rule.condition.field, "Alert rule added");
        Ok(rule)
    }

    /// Rules owned by `user_id`, in creation order.
    pub async fn list_for(&self, user_id: &str) -> Vec<AlertRule> {
        self.rules
            .read()
            .await
            .iter()
            .filter(|rule| rule.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Fire every due rule whose condition holds for `values`.
    pub async fn check_and_trigger(
        &self,
        values: &HashMap<String, f64>,
        now: DateTime<Utc>,
    ) -> Vec<TriggeredAlert> {
        let mut rules = self.rules.write().await;
        let mut triggered = Vec::new();

        for rule in rules.iter_mut() {
            let due = rule.next_alert_time.is_some_and(|at| at <= now);
            if !due {
                continue;
            }
            let Some(&observed) = values.get(&rule.condition.field) else {
                continue;
            };
            if !rule.condition.operator.holds(observed, rule.condition.value) {
                continue;
            }

            triggered.push(TriggeredAlert {
                rule_id: rule.id.clone(),
                user_id: rule.user_id.clone(),
                alert_message: rule.notification_message.clone(),
                condition: rule.condition.clone(),
                observed,
            });
            rule.next_alert_time = next_alert_time(rule.frequency, now);
        }

        if !triggered.is_empty() {
            info!(count = triggered.len(), "Alert rules triggered");
        }
        triggered
    }
}
