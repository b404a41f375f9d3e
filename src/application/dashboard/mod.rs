pub mod aggregate;
pub mod session;

pub use aggregate::{DashboardAggregate, StatsUpdate};
pub use session::DashboardSession;
