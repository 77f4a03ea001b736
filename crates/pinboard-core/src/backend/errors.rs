use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Categories of backend errors, one per backend concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    /// No session, expired session, or a rejected session operation
    Auth,
    /// Row operation rejected (insert, select, delete, change feed)
    Persistence,
    /// Object upload or removal failed
    Storage,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendErrorKind::Auth => write!(f, "auth"),
            BackendErrorKind::Persistence => write!(f, "persistence"),
            BackendErrorKind::Storage => write!(f, "storage"),
        }
    }
}

/// Structured error from the backend with kind and details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendError {
    /// Error category
    pub kind: BackendErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl BackendError {
    /// Creates a new backend error.
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an auth error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Auth, message)
    }

    /// Creates an error from a non-success HTTP response.
    ///
    /// Extracts a cleaner message from JSON error bodies when one is
    /// present (`{"message": ...}` or `{"error": {"message": ...}}`).
    pub fn http_status(kind: BackendErrorKind, status: u16, body: &str) -> Self {
        let message = format!("HTTP {}", status);
        let details = if body.is_empty() {
            None
        } else {
            if let Ok(json) = serde_json::from_str::<Value>(body)
                && let Some(msg) = extract_message(&json)
            {
                return Self {
                    kind,
                    message: format!("HTTP {}: {}", status, msg),
                    details: Some(body.to_string()),
                };
            }
            Some(body.to_string())
        };
        Self {
            kind,
            message,
            details,
        }
    }

    /// Returns true for errors that mean "no valid session".
    pub fn is_auth(&self) -> bool {
        self.kind == BackendErrorKind::Auth
    }
}

fn extract_message(json: &Value) -> Option<&str> {
    if let Some(msg) = json.get("message").and_then(|v| v.as_str()) {
        return Some(msg);
    }
    json.get("error")
        .and_then(|e| e.get("message"))
        .and_then(|v| v.as_str())
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BackendError {}
