//! Authentication DTOs
//!
//! Only presence is checked here; email format and password length are
//! enforced by the auth service so every caller gets the same rules.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::AccessState;
use crate::domain::Identity;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: Identity,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, max = 128, message = "password must be at most 128 characters"))]
    pub password: String,
    #[validate(length(max = 100, message = "display name must be at most 100 characters"))]
    pub display_name: Option<String>,
}

/// The caller's identity and whether the dashboard would admit them.
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentUser {
    pub user: Identity,
    #[schema(value_type = Object)]
    pub access: AccessState,
}
