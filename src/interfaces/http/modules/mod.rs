pub mod alerts;
pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod health;
pub mod metrics;
