//! Dashboard view: tab strip, stat cards and the active tab's content.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::errors::{errors_view, ErrorFilter, ErrorsView};
use super::performance::{performance_view, PerformanceView};
use super::table::{record_table, RecordTable, TableView};
use crate::application::live::LiveView;
use crate::domain::{DashboardStats, ErrorRecord, MetricsSnapshot, StatCardInfo, UserRecord};

/// Tabs by index; the selection is not persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DashboardTab {
    #[default]
    Performance,
    Database,
    Users,
    Errors,
}

impl DashboardTab {
    pub const ALL: [DashboardTab; 4] = [
        DashboardTab::Performance,
        DashboardTab::Database,
        DashboardTab::Users,
        DashboardTab::Errors,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Performance => "Performance",
            Self::Database => "Database",
            Self::Users => "Users",
            Self::Errors => "Errors",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TabView {
    pub index: usize,
    pub title: String,
    pub active: bool,
}

/// A summary card; selecting it opens `tab`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatCardView {
    pub title: String,
    pub value: String,
    pub tab: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", content = "view", rename_all = "lowercase")]
pub enum TabContent {
    Performance(PerformanceView),
    Database(TableView),
    Users(TableView),
    Errors(ErrorsView),
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub active_tab: usize,
    pub tabs: Vec<TabView>,
    pub cards: Vec<StatCardView>,
    pub stat_card_info: StatCardInfo,
    pub content: TabContent,
}

/// Everything the dashboard renders from.
pub struct DashboardInputs<'a> {
    pub stats: DashboardStats,
    pub users: &'a LiveView<UserRecord>,
    pub errors: &'a LiveView<ErrorRecord>,
    pub metrics: &'a LiveView<MetricsSnapshot>,
    pub error_filter: &'a ErrorFilter,
}

pub fn stat_cards(stats: &DashboardStats) -> Vec<StatCardView> {
    let card = |title: &str, value: u64, tab: DashboardTab| StatCardView {
        title: title.to_string(),
        value: value.to_string(),
        tab: tab.index(),
    };
    vec![
        card("Total Users", stats.total_users, DashboardTab::Users),
        card("Active Errors", stats.active_errors, DashboardTab::Errors),
        card("API Requests", stats.api_requests, DashboardTab::Performance),
        card("Database Operations", stats.database_ops, DashboardTab::Database),
    ]
}

pub fn tab_content(tab: DashboardTab, inputs: &DashboardInputs<'_>) -> TabContent {
    match tab {
        DashboardTab::Performance => TabContent::Performance(performance_view(inputs.metrics)),
        DashboardTab::Database => {
            TabContent::Database(record_table(RecordTable::Database, inputs.users))
        }
        DashboardTab::Users => TabContent::Users(record_table(RecordTable::Users, inputs.users)),
        DashboardTab::Errors => {
            TabContent::Errors(errors_view(inputs.errors, inputs.error_filter))
        }
    }
}

pub fn dashboard_view(active: DashboardTab, inputs: &DashboardInputs<'_>) -> DashboardView {
    DashboardView {
        active_tab: active.index(),
        tabs: DashboardTab::ALL
            .iter()
            .map(|&tab| TabView {
                index: tab.index(),
                title: tab.title().to_string(),
                active: tab == active,
            })
            .collect(),
        cards: stat_cards(&inputs.stats),
        stat_card_info: inputs.stats.stat_card_info(),
        content: tab_content(active, inputs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::live::LiveStatus;

    fn ready<T>(items: Vec<T>) -> LiveView<T> {
        LiveView {
            status: LiveStatus::Ready,
            items,
            version: 1,
        }
    }

    #[test]
    fn tabs_by_index() {
        assert_eq!(DashboardTab::from_index(0), Some(DashboardTab::Performance));
        assert_eq!(DashboardTab::from_index(3), Some(DashboardTab::Errors));
        assert_eq!(DashboardTab::from_index(4), None);
        assert_eq!(DashboardTab::Users.index(), 2);
    }

    #[test]
    fn cards_link_to_tabs() {
        let stats = DashboardStats {
            total_users: 3,
            database_ops: 12,
            api_requests: 12,
            active_errors: 1,
        };
        let cards = stat_cards(&stats);
        let links: Vec<_> = cards.iter().map(|c| (c.title.as_str(), c.tab)).collect();
        assert_eq!(
            links,
            vec![
                ("Total Users", 2),
                ("Active Errors", 3),
                ("API Requests", 0),
                ("Database Operations", 1)
            ]
        );
        assert_eq!(cards[0].value, "3");
    }

    #[test]
    fn renders_active_tab_only() {
        let users = ready(vec![]);
        let errors = ready(vec![]);
        let metrics = ready(vec![MetricsSnapshot::default()]);
        let filter = ErrorFilter::default();
        let inputs = DashboardInputs {
            stats: DashboardStats::default(),
            users: &users,
            errors: &errors,
            metrics: &metrics,
            error_filter: &filter,
        };

        let view = dashboard_view(DashboardTab::Errors, &inputs);
        assert_eq!(view.active_tab, 3);
        assert!(view.tabs[3].active);
        assert!(!view.tabs[0].active);
        assert!(matches!(view.content, TabContent::Errors(_)));

        let view = dashboard_view(DashboardTab::default(), &inputs);
        assert!(matches!(view.content, TabContent::Performance(_)));
    }
}
