//! Pure derivations over the login metrics document.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::MetricsSnapshot;

/// Number of trailing response times kept for the trend chart.
pub const RECENT_WINDOW: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricsAggregate {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub success_rate_pct: f64,
    /// Absent when there is no data, which is distinct from zero latency.
    pub avg_response_time_ms: Option<f64>,
    pub recent_response_times: Vec<f64>,
}

impl MetricsAggregate {
    /// Success rate with one decimal, e.g. `"80.0"`.
    pub fn success_rate_label(&self) -> String {
        format!("{:.1}", self.success_rate_pct)
    }
}

pub fn compute_aggregate(snapshot: &MetricsSnapshot) -> MetricsAggregate {
    let total = snapshot.total_calls;
    let failed = snapshot.failed_calls;
    let successful = total.saturating_sub(failed);

    let success_rate_pct = if total == 0 {
        0.0
    } else {
        successful as f64 / total as f64 * 100.0
    };

    let times = &snapshot.response_times;
    let avg_response_time_ms = if total == 0 || times.is_empty() {
        None
    } else {
        Some(times.iter().sum::<f64>() / times.len() as f64)
    };

    let start = times.len().saturating_sub(RECENT_WINDOW);

    MetricsAggregate {
        total,
        successful,
        failed,
        success_rate_pct,
        avg_response_time_ms,
        recent_response_times: times[start..].to_vec(),
    }
}

/// Nearest-rank percentile (`p` in 0..=100) of `values`.
pub fn percentile(values: &[f64], p: u8) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let p = f64::from(p.min(100));
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    let index = rank.clamp(1, sorted.len()) - 1;
    Some(sorted[index])
}
