use serde::{Deserialize, Serialize};

use crate::domain::document::{Document, FromDocument};

/// Raw counters of the login metrics document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_calls: u64,
    pub failed_calls: u64,
    /// Response times in milliseconds, in store order.
    pub response_times: Vec<f64>,
}

impl MetricsSnapshot {
    pub fn new(total_calls: u64, failed_calls: u64, response_times: Vec<f64>) -> Self {
        Self {
            total_calls,
            failed_calls,
            response_times,
        }
    }
}

impl FromDocument for MetricsSnapshot {
    fn from_document(doc: &Document) -> Self {
        let response_times = doc
            .field("responseTimes")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_f64())
                    .filter(|v| v.is_finite() && *v >= 0.0)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            total_calls: doc.u64_field("totalCalls").unwrap_or(0),
            failed_calls: doc.u64_field("failedCalls").unwrap_or(0),
            response_times,
        }
    }
}
