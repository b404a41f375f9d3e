use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::document::{Document, FromDocument};

/// Display format for error timestamps.
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Severity of a logged error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
}

impl Severity {
    pub const ALL: [Severity; 2] = [Severity::Critical, Severity::Warning];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "warning" => Some(Severity::Warning),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed login attempt, as shown by the errors view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRecord {
    pub id: String,
    pub message: String,
    /// Display-formatted timestamp, `"Unknown"` when absent.
    pub timestamp: String,
    pub severity: Severity,
}

impl FromDocument for ErrorRecord {
    fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            message: doc
                .str_field("errorMessage")
                .filter(|m| !m.is_empty())
                .unwrap_or("No message provided")
                .to_string(),
            timestamp: doc
                .timestamp_field("timestamp")
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            severity: doc
                .str_field("severity")
                .and_then(Severity::parse)
                .unwrap_or(Severity::Warning),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        Document::new("e1", value.as_object().cloned().unwrap())
    }

    #[test]
    fn maps_stored_fields() {
        let record = ErrorRecord::from_document(&doc(json!({
            "errorMessage": "Request timeout",
            "timestamp": "2024-03-01T10:20:30Z",
            "severity": "critical",
            "responseTime": 912
        })));
        assert_eq!(record.message, "Request timeout");
        assert_eq!(record.timestamp, "01/03/2024, 10:20:30");
        assert_eq!(record.severity, Severity::Critical);
    }

    #[test]
    fn malformed_fields_get_placeholders() {
        let record = ErrorRecord::from_document(&doc(json!({
            "timestamp": {"seconds": "nope"},
            "severity": "fatal"
        })));
        assert_eq!(record.message, "No message provided");
        assert_eq!(record.timestamp, "Unknown");
        assert_eq!(record.severity, Severity::Warning);
    }
}
