//! HTTP REST API interfaces
//!
//! - `common`: response envelope, error mapping, validated JSON extractor
//! - `middleware`: admin/session guards and request metrics
//! - `modules`: handlers grouped by resource
//! - `router`: API router with Swagger documentation

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;

pub use common::{ApiError, ApiResponse, ApiResult};
pub use router::{create_api_router, ApiDoc};
pub use state::AppState;
