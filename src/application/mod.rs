//! Application layer: live subscriptions, derivations and use-cases built
//! on the domain ports.

pub mod access;
pub mod alerts;
pub mod assistant;
pub mod dashboard;
pub mod identity;
pub mod live;
pub mod metrics;

pub use access::{AccessGuard, AccessState};
pub use identity::AuthService;
pub use live::{LiveCollection, LiveCollectionBinder, LiveStatus, LiveView};
pub use metrics::{compute_aggregate, LoginMetricsRecorder, MetricsAggregate};
