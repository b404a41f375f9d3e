//! View models
//!
//! Pure functions from the current live data to serialisable views. The
//! HTTP layer renders these as JSON; nothing here touches the store.

pub mod dashboard;
pub mod errors;
pub mod format;
pub mod performance;
pub mod settings;
pub mod table;

pub use dashboard::{
    dashboard_view, stat_cards, DashboardInputs, DashboardTab, DashboardView, StatCardView,
    TabContent, TabView,
};
pub use errors::{errors_view, filter_errors, ErrorFilter, ErrorsView, SeverityCounts, SeverityFilter};
pub use performance::{performance_view, ChartSeries, MetricCard, PerformanceView};
pub use settings::{alert_settings_view, AlertSettingsView, PercentileOption};
pub use table::{record_table, RecordTable, TableRow, TableView};
