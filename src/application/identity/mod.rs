//! Identity module: login, logout and registration use-cases

pub mod service;

pub use service::{is_valid_email, is_valid_password, AuthService, MIN_PASSWORD_LEN};
