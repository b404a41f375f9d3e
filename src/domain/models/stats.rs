use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::document::Document;

/// Ambient dashboard counters.
///
/// Fields are fed by independent sources and each one is last-writer-wins;
/// no invariant spans two fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: u64,
    pub database_ops: u64,
    pub api_requests: u64,
    pub active_errors: u64,
}

impl DashboardStats {
    /// Overlay the counters present in a `dashboardStats` document.
    /// Returns whether any field changed.
    pub fn merge_document(&mut self, doc: &Document) -> bool {
        let before = *self;
        if let Some(v) = doc.u64_field("totalUsers") {
            self.total_users = v;
        }
        if let Some(v) = doc.u64_field("databaseOps") {
            self.database_ops = v;
        }
        if let Some(v) = doc.u64_field("apiRequests") {
            self.api_requests = v;
        }
        if let Some(v) = doc.u64_field("activeErrors") {
            self.active_errors = v;
        }
        before != *self
    }

    pub fn stat_card_info(&self) -> StatCardInfo {
        StatCardInfo {
            total_users: self.total_users,
            active_errors: self.active_errors,
            api_requests: self.api_requests,
            database_ops: self.database_ops,
        }
    }
}

/// Projection of [`DashboardStats`] handed to the assistant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatCardInfo {
    pub total_users: u64,
    pub active_errors: u64,
    pub api_requests: u64,
    pub database_ops: u64,
}
