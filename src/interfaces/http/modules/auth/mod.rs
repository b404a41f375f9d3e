//! Authentication module: login, logout, registration, current session

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
