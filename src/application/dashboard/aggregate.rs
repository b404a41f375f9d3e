//! Last-writer-wins merge of the dashboard counters.
//!
//! Four independent sources feed [`DashboardStats`]; each update only
//! touches the fields its source owns, in whatever order updates arrive.

use serde::Serialize;

use crate::domain::{DashboardStats, Document};

#[derive(Debug, Clone, PartialEq)]
pub enum StatsUpdate {
    /// Documents of the `dashboardStats` collection.
    DashboardStats(Vec<Document>),
    /// Documents of the `apiMetrics` collection.
    ApiMetrics(Vec<Document>),
    UserCount(usize),
    ErrorCount(usize),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardAggregate {
    pub stats: DashboardStats,
    /// Bumped whenever a field changes
    pub revision: u64,
}

impl DashboardAggregate {
    /// Apply one update. Returns whether any field changed.
    pub fn apply(&mut self, update: StatsUpdate) -> bool {
        let before = self.stats;
        match update {
            StatsUpdate::DashboardStats(documents) => {
                for doc in &documents {
                    self.stats.merge_document(doc);
                }
            }
            StatsUpdate::ApiMetrics(documents) => {
                // One counter drives both cards.
                for doc in &documents {
                    let total_calls = doc.u64_field("totalCalls").unwrap_or(0);
                    self.stats.api_requests = total_calls;
                    self.stats.database_ops = total_calls;
                }
            }
            StatsUpdate::UserCount(count) => self.stats.total_users = count as u64,
            StatsUpdate::ErrorCount(count) => self.stats.active_errors = count as u64,
        }

        let changed = before != self.stats;
        if changed {
            self.revision += 1;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, value: serde_json::Value) -> Document {
        Document::new(id, value.as_object().cloned().unwrap())
    }

    #[test]
    fn sources_own_their_fields() {
        let mut agg = DashboardAggregate::default();
        assert!(agg.apply(StatsUpdate::DashboardStats(vec![doc(
            "global",
            json!({"totalUsers": 40, "databaseOps": 9, "activeErrors": 2})
        )])));
        assert!(agg.apply(StatsUpdate::ApiMetrics(vec![doc(
            "login-metrics",
            json!({"totalCalls": 12})
        )])));
        assert!(agg.apply(StatsUpdate::UserCount(3)));

        assert_eq!(
            agg.stats,
            DashboardStats {
                total_users: 3,
                database_ops: 12,
                api_requests: 12,
                active_errors: 2,
            }
        );
        assert_eq!(agg.revision, 3);
    }

    #[test]
    fn later_writer_wins() {
        let mut agg = DashboardAggregate::default();
        agg.apply(StatsUpdate::ErrorCount(4));
        agg.apply(StatsUpdate::DashboardStats(vec![doc(
            "global",
            json!({"activeErrors": 1})
        )]));
        assert_eq!(agg.stats.active_errors, 1);
        agg.apply(StatsUpdate::ErrorCount(5));
        assert_eq!(agg.stats.active_errors, 5);
    }

    #[test]
    fn unchanged_update_keeps_revision() {
        let mut agg = DashboardAggregate::default();
        assert!(!agg.apply(StatsUpdate::UserCount(0)));
        assert_eq!(agg.revision, 0);
    }
}
