//! Errors view: search, severity filter and per-severity counts.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::live::LiveView;
use crate::domain::{ErrorRecord, Severity};

pub const EMPTY_MESSAGE: &str = "No errors found matching your criteria";
pub const LOADING_MESSAGE: &str = "Loading errors...";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SeverityFilter {
    #[default]
    All,
    Critical,
    Warning,
}

impl SeverityFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Some(Self::All),
            other => Severity::parse(other).map(Self::from),
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        match self {
            Self::All => None,
            Self::Critical => Some(Severity::Critical),
            Self::Warning => Some(Severity::Warning),
        }
    }

    /// Selecting the active severity again resets to all.
    pub fn toggle(self, clicked: Severity) -> Self {
        if self.severity() == Some(clicked) {
            Self::All
        } else {
            Self::from(clicked)
        }
    }

    pub fn matches(&self, severity: Severity) -> bool {
        self.severity().map_or(true, |s| s == severity)
    }
}

impl From<Severity> for SeverityFilter {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Critical => Self::Critical,
            Severity::Warning => Self::Warning,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorFilter {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub severity: SeverityFilter,
}

impl ErrorFilter {
    pub fn matches(&self, error: &ErrorRecord) -> bool {
        let query = self.query.to_lowercase();
        let matches_search = query.is_empty() || error.message.to_lowercase().contains(&query);
        matches_search && self.severity.matches(error.severity)
    }
}

pub fn filter_errors(errors: &[ErrorRecord], filter: &ErrorFilter) -> Vec<ErrorRecord> {
    errors.iter().filter(|e| filter.matches(e)).cloned().collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SeverityCounts {
    pub critical: usize,
    pub warning: usize,
}

impl SeverityCounts {
    pub fn of(errors: &[ErrorRecord]) -> Self {
        errors.iter().fold(Self::default(), |mut counts, e| {
            match e.severity {
                Severity::Critical => counts.critical += 1,
                Severity::Warning => counts.warning += 1,
            }
            counts
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorsView {
    pub loading: bool,
    pub loading_message: Option<String>,
    /// Errors in the unfiltered list
    pub total: usize,
    pub subtitle: String,
    pub counts: SeverityCounts,
    pub severity: SeverityFilter,
    pub query: String,
    pub heading: String,
    pub errors: Vec<ErrorRecord>,
    pub empty_message: Option<String>,
}

pub fn heading(shown: usize, severity: SeverityFilter) -> String {
    match severity.severity() {
        Some(s) => format!("Showing {} {} errors", shown, s),
        None => format!("Showing {} errors", shown),
    }
}

pub fn errors_view(live: &LiveView<ErrorRecord>, filter: &ErrorFilter) -> ErrorsView {
    let loading = live.is_loading();
    let shown = filter_errors(&live.items, filter);
    let empty_message = (!loading && shown.is_empty()).then(|| EMPTY_MESSAGE.to_string());

    ErrorsView {
        loading,
        loading_message: loading.then(|| LOADING_MESSAGE.to_string()),
        total: live.items.len(),
        subtitle: format!(
            "Monitoring {} total errors across the system",
            live.items.len()
        ),
        counts: SeverityCounts::of(&live.items),
        severity: filter.severity,
        query: filter.query.clone(),
        heading: heading(shown.len(), filter.severity),
        errors: shown,
        empty_message,
    }
}
