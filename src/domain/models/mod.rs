pub mod alert;
pub mod error_record;
pub mod metrics;
pub mod stats;
pub mod user;

pub use alert::{
    AlertCondition, AlertFrequency, AlertRule, AlertSettings, ComparisonOperator, TriggeredAlert,
    ALLOWED_PERCENTILES,
};
pub use error_record::{ErrorRecord, Severity};
pub use metrics::MetricsSnapshot;
pub use stats::{DashboardStats, StatCardInfo};
pub use user::UserRecord;
