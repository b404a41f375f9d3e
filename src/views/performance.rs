//! API performance view: summary cards, distribution and trend series.

use serde::Serialize;
use utoipa::ToSchema;

use super::format::thousands;
use crate::application::live::LiveView;
use crate::application::metrics::{compute_aggregate, MetricsAggregate};
use crate::domain::MetricsSnapshot;

pub const DISTRIBUTION_LABELS: [&str; 2] = ["Successful Calls", "Failed Calls"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MetricCard {
    pub title: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartSeries {
    pub label: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceView {
    pub loading: bool,
    pub title: String,
    pub success_rate: String,
    pub cards: Vec<MetricCard>,
    pub distribution: ChartSeries,
    pub trend: ChartSeries,
    pub aggregate: MetricsAggregate,
}

pub fn avg_response_label(aggregate: &MetricsAggregate) -> String {
    aggregate
        .avg_response_time_ms
        .map(|ms| format!("{:.1}ms", ms))
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn performance_view(live: &LiveView<MetricsSnapshot>) -> PerformanceView {
    let snapshot = live.items.first().cloned().unwrap_or_default();
    let aggregate = compute_aggregate(&snapshot);

    let card = |title: &str, value: String| MetricCard {
        title: title.to_string(),
        value,
    };
    let cards = vec![
        card("Total Calls", thousands(aggregate.total)),
        card("Successful", thousands(aggregate.successful)),
        card("Failed", thousands(aggregate.failed)),
        card("Avg Response", avg_response_label(&aggregate)),
    ];

    let distribution = ChartSeries {
        label: "API Calls".to_string(),
        labels: DISTRIBUTION_LABELS.iter().map(|l| l.to_string()).collect(),
        values: vec![aggregate.successful as f64, aggregate.failed as f64],
    };
    let trend = ChartSeries {
        label: "Response Time (ms)".to_string(),
        labels: (1..=aggregate.recent_response_times.len())
            .map(|i| format!("Call {}", i))
            .collect(),
        values: aggregate.recent_response_times.clone(),
    };

    PerformanceView {
        loading: live.is_loading(),
        title: "API Performance Dashboard".to_string(),
        success_rate: format!("Success Rate: {}%", aggregate.success_rate_label()),
        cards,
        distribution,
        trend,
        aggregate,
    }
}
