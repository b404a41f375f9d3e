pub mod aggregator;
pub mod recorder;

pub use aggregator::{compute_aggregate, percentile, MetricsAggregate, RECENT_WINDOW};
pub use recorder::{classify_failure, LoginMetricsRecorder, LoginOutcome, LOGIN_METRIC_NAME};
