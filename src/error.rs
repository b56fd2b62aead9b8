//! Error types for the agent framework
//!
//! Every error carries a technical message (its `Display`) for logs and a
//! separate, stable `user_message()` for display. UIs must only show the latter.

use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Stable error codes for client-side handling.
///
/// Format: `{CATEGORY}_{NUMBER}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidRequest,
    InvalidPersona,
    AgentNotFound,
    ModelProvider,
    ServiceTimeout,
    Internal,
    Configuration,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "VAL_3001",
            ErrorCode::InvalidPersona => "VAL_3003",
            ErrorCode::AgentNotFound => "BIZ_2012",
            ErrorCode::ModelProvider => "EXT_4001",
            ErrorCode::ServiceTimeout => "EXT_4005",
            ErrorCode::Internal => "SYS_5001",
            ErrorCode::Configuration => "SYS_5004",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse error classification used by callers that branch on failure type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Timeout,
    Provider,
    NotFound,
    Configuration,
}

#[derive(Error, Debug, Clone)]
pub enum AgentError {

    // =============================
    // Agent-level taxonomy
    // =============================

    #[error("Context validation failed: {}", .messages.join(", "))]
    Validation {
        messages: Vec<String>,
        code: ErrorCode,
    },

    #[error("{service} timed out after {timeout_seconds}s")]
    Timeout {
        service: String,
        timeout_seconds: u64,
    },

    #[error("{service} error: {message}")]
    Provider {
        service: String,
        message: String,
        retryable: bool,
    },

    #[error("{resource} '{id}' not found (available: {})", .available.join(", "))]
    NotFound {
        resource: String,
        id: String,
        available: Vec<String>,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unrecognized failure inside an agent. The execution contract rewraps
    /// this as `Provider` before it reaches a caller.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AgentError {
    pub fn validation<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Validation {
            messages: messages.into_iter().map(Into::into).collect(),
            code: ErrorCode::InvalidRequest,
        }
    }

    pub fn invalid_persona(persona: &str, valid: Vec<String>) -> Self {
        Self::Validation {
            messages: vec![format!(
                "'{}' is not a valid analysis style. Choose from: {}",
                persona,
                valid.join(", ")
            )],
            code: ErrorCode::InvalidPersona,
        }
    }

    pub fn timeout(service: impl Into<String>, timeout_seconds: u64) -> Self {
        Self::Timeout {
            service: service.into(),
            timeout_seconds,
        }
    }

    /// Model provider failure; retryable by default.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            service: "Gemini AI".to_string(),
            message: message.into(),
            retryable: true,
        }
    }

    pub fn agent_not_found(id: impl Into<String>, available: Vec<String>) -> Self {
        Self::NotFound {
            resource: "Agent".to_string(),
            id: id.into(),
            available,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AgentError::Validation { .. } => ErrorKind::Validation,
            AgentError::Timeout { .. } => ErrorKind::Timeout,
            AgentError::Provider { .. } | AgentError::Unknown(_) => ErrorKind::Provider,
            AgentError::NotFound { .. } => ErrorKind::NotFound,
            AgentError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AgentError::Validation { code, .. } => *code,
            AgentError::Timeout { .. } => ErrorCode::ServiceTimeout,
            AgentError::Provider { .. } => ErrorCode::ModelProvider,
            AgentError::NotFound { .. } => ErrorCode::AgentNotFound,
            AgentError::Configuration(_) => ErrorCode::Configuration,
            AgentError::Unknown(_) => ErrorCode::Internal,
        }
    }

    /// Display-safe message. Never includes provider internals.
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Validation { code: ErrorCode::InvalidPersona, messages } => {
                messages.join(" ")
            }
            AgentError::Validation { .. } => "Invalid input for this analysis.".to_string(),
            AgentError::Timeout { .. } => "The request took too long. Please try again.".to_string(),
            AgentError::Provider { .. } => {
                "Our AI service is temporarily unavailable. Please try again in a moment.".to_string()
            }
            AgentError::NotFound { id, available, .. } => format!(
                "Unknown analysis style '{}'. Available: {}",
                id,
                available.join(", ")
            ),
            AgentError::Configuration(_) => {
                "The application is misconfigured. Please contact support.".to_string()
            }
            AgentError::Unknown(_) => "Something went wrong. Please try again.".to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::Timeout { .. } => true,
            AgentError::Provider { retryable, .. } => *retryable,
            _ => false,
        }
    }

    /// JSON body for API responses.
    pub fn to_response(&self) -> Value {
        let mut body = json!({
            "error_code": self.code().as_str(),
            "message": self.to_string(),
            "user_message": self.user_message(),
            "retryable": self.is_retryable(),
        });

        let details = match self {
            AgentError::Validation { messages, .. } => Some(json!({ "errors": messages })),
            AgentError::Timeout { service, timeout_seconds } => Some(json!({
                "service": service,
                "timeout_seconds": timeout_seconds,
            })),
            AgentError::Provider { service, .. } => Some(json!({ "service": service })),
            AgentError::NotFound { resource, id, available } => Some(json!({
                "resource_type": resource,
                "resource_id": id,
                "available": available,
            })),
            _ => None,
        };

        if let Some(details) = details {
            body["details"] = details;
        }

        body
    }
}

// =============================
// External Library Conversions
// =============================

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs can carry credentials.
        let err = err.without_url();
        AgentError::Provider {
            service: "Gemini AI".to_string(),
            message: err.to_string(),
            retryable: err.is_timeout() || err.is_connect() || err.is_request(),
        }
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::Unknown(format!("Serialization error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_joins_messages() {
        let err = AgentError::validation(["Missing required field: ticker", "Missing required field: financial_data"]);
        assert_eq!(
            err.to_string(),
            "Context validation failed: Missing required field: ticker, Missing required field: financial_data"
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.code().as_str(), "VAL_3001");
        assert_eq!(err.user_message(), "Invalid input for this analysis.");
    }

    #[test]
    fn test_user_message_hides_technical_detail() {
        let err = AgentError::provider("HTTP 500: upstream stack trace");
        assert!(err.to_string().contains("upstream stack trace"));
        assert!(!err.user_message().contains("upstream"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_not_found_lists_available() {
        let err = AgentError::agent_not_found("pelosi", vec!["buffett".into(), "lynch".into()]);
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("buffett, lynch"));

        let body = err.to_response();
        assert_eq!(body["error_code"], "BIZ_2012");
        assert_eq!(body["details"]["available"][1], "lynch");
    }

    #[test]
    fn test_unknown_maps_to_provider_kind() {
        let err = AgentError::Unknown("boom".into());
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert_eq!(err.code(), ErrorCode::Internal);
    }
}
