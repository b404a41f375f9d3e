use thiserror::Error;

/// Errors surfaced by the dashboard core.
///
/// Every variant is scoped to the view or request that triggered it;
/// malformed document fields never reach this type because the
/// document mappers default them to placeholders.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Bad credentials, expired or revoked session.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Store or identity provider unreachable.
    #[error("Network error: {0}")]
    Network(String),

    /// The caller is not allowed to read or write the resource.
    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    /// Missing or malformed startup configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Whether the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Network(_))
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
