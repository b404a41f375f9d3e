use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::document::{Document, FromDocument};

/// Profile of a registered user as stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserRecord {
    pub uid: String,
    pub email: String,
    /// Account creation time in epoch milliseconds.
    pub creation_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl UserRecord {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(crate::domain::collections::ADMIN_ROLE)
    }
}

impl FromDocument for UserRecord {
    fn from_document(doc: &Document) -> Self {
        Self {
            uid: doc
                .str_field("uid")
                .map(String::from)
                .unwrap_or_else(|| doc.id.clone()),
            email: doc.str_field("email").unwrap_or_default().to_string(),
            creation_time: doc
                .timestamp_field("creation_time")
                .map(|t| t.timestamp_millis()),
            role: doc.str_field("role").map(String::from),
        }
    }
}
