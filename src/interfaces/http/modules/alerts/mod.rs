//! Alerts module: latency alert settings and user-defined rules

pub mod handlers;

pub use handlers::*;
