//! # Admin Dashboard
//!
//! Live administrative dashboard over a managed document store: user
//! registry, login API performance, recorded login errors and alerting,
//! gated to admins.
//!
//! ## Architecture
//!
//! - **domain**: documents, records and the store / identity ports
//! - **application**: live subscriptions, metrics, access guard and use cases
//! - **views**: pure view models rendered from live data
//! - **infrastructure**: in-process store, JWT credentials, password hashing
//! - **interfaces**: REST + WebSocket API with Swagger documentation
//! - **server**: runtime bootstrap and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;
pub mod views;

pub use config::{default_config_path, AppConfig, PlatformConfig};
pub use interfaces::http::create_api_router;
pub use server::{init_tracing, ServerHandle, ServerOptions};
