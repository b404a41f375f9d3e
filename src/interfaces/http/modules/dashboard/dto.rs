//! Dashboard query parameters

use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{DomainError, DomainResult};
use crate::views::{DashboardTab, ErrorFilter, SeverityFilter};

/// Tab selection and error filter, shared by the dashboard routes and the
/// live socket's control messages.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ViewQuery {
    /// Tab index: 0 performance, 1 database, 2 users, 3 errors
    pub tab: Option<usize>,
    /// Case-insensitive substring of the error message
    pub query: Option<String>,
    /// `all`, `critical` or `warning`
    pub severity: Option<String>,
}

impl ViewQuery {
    pub fn tab(&self) -> DomainResult<DashboardTab> {
        match self.tab {
            None => Ok(DashboardTab::default()),
            Some(index) => DashboardTab::from_index(index).ok_or_else(|| {
                DomainError::Validation(format!(
                    "tab must be between 0 and {}",
                    DashboardTab::ALL.len() - 1
                ))
            }),
        }
    }

    pub fn error_filter(&self) -> DomainResult<ErrorFilter> {
        let severity = match self.severity.as_deref() {
            None => SeverityFilter::All,
            Some(raw) => SeverityFilter::parse(raw).ok_or_else(|| {
                DomainError::Validation(format!("unknown severity '{}'", raw))
            })?,
        };
        Ok(ErrorFilter {
            query: self.query.clone().unwrap_or_default(),
            severity,
        })
    }

    /// Overlay the fields present in `update`.
    pub fn merge(&mut self, update: ViewQuery) {
        if update.tab.is_some() {
            self.tab = update.tab;
        }
        if update.query.is_some() {
            self.query = update.query;
        }
        if update.severity.is_some() {
            self.severity = update.severity;
        }
    }
}
