use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::assistant::StatContext;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Empty asks for the greeting
    #[serde(default)]
    #[validate(length(max = 2000, message = "message must be at most 2000 characters"))]
    pub message: String,
    /// Counters keyed by card name, e.g. `{"totalUsers": 12}`
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub stat_card_info: Option<StatContext>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatReply {
    pub reply: String,
}
