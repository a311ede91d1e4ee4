//! Application error model with MCP error mapping
//!
//! Defines a typed error hierarchy using `thiserror` for internal error handling,
//! and maps each variant to the appropriate MCP `ErrorData` type for protocol
//! compliance.

use rmcp::model::ErrorData;
use serde_json::json;
use thiserror::Error;

/// Application error type
///
/// Covers all error cases the mail bridge MCP server may encounter. Each
/// variant maps to an appropriate MCP error code in [`ErrorData`].
#[derive(Debug, Error, PartialEq)]
pub enum AppError {
    /// Invalid user input (validation failed, malformed request)
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Mail application not reachable or launchable; fatal for the whole call
    #[error("mail application unavailable: {0}")]
    BridgeUnavailable(String),
    /// Resource not found (account, mailbox, message); per-item in batches
    #[error("not found: {0}")]
    NotFound(String),
    /// Target validation failed before any mutating bridge call was made
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    /// The bridge's mutating call itself raised an error
    #[error("operation failed: {0}")]
    OperationFailed(String),
    /// Bridge returned text that does not match the expected structured shape
    #[error("unparseable bridge reply: {0}")]
    ParseFailed(String),
    /// Internal error (unexpected failure, external crate error)
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Convenience constructor for `InvalidInput`
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// `NotFound` for an account without any inbox-like mailbox
    ///
    /// Names the account and its actually-available mailboxes so the caller
    /// can correct the request without another directory round trip.
    pub fn no_inbox(account: &str, available: &[String]) -> Self {
        Self::NotFound(format!(
            "no Inbox found for account '{}'; available mailboxes: {}",
            account,
            if available.is_empty() {
                "(none)".to_owned()
            } else {
                available.join(", ")
            }
        ))
    }

    /// Convert to MCP `ErrorData`
    ///
    /// Maps each `AppError` variant to the appropriate MCP error type and
    /// includes a structured `code` field for client error handling.
    ///
    /// # Mappings
    ///
    /// - `InvalidInput` → `invalid_params`
    /// - `BridgeUnavailable` → `internal_error`
    /// - `NotFound` → `resource_not_found`
    /// - `ValidationFailed` → `invalid_params`
    /// - `OperationFailed` → `internal_error`
    /// - `ParseFailed` → `internal_error`
    /// - `Internal` → `internal_error`
    pub fn to_error_data(&self) -> ErrorData {
        match self {
            Self::InvalidInput(msg) => {
                ErrorData::invalid_params(msg.clone(), Some(json!({ "code": "invalid_input" })))
            }
            Self::BridgeUnavailable(msg) => ErrorData::internal_error(
                msg.clone(),
                Some(json!({ "code": "bridge_unavailable" })),
            ),
            Self::NotFound(msg) => {
                ErrorData::resource_not_found(msg.clone(), Some(json!({ "code": "not_found" })))
            }
            Self::ValidationFailed(msg) => {
                ErrorData::invalid_params(msg.clone(), Some(json!({ "code": "validation_failed" })))
            }
            Self::OperationFailed(msg) => {
                ErrorData::internal_error(msg.clone(), Some(json!({ "code": "operation_failed" })))
            }
            Self::ParseFailed(msg) => {
                ErrorData::internal_error(msg.clone(), Some(json!({ "code": "parse_failed" })))
            }
            Self::Internal(msg) => {
                ErrorData::internal_error(msg.clone(), Some(json!({ "code": "internal" })))
            }
        }
    }
}

/// Type alias for fallible return values
///
/// Use this for all internal functions that can fail. Provides a consistent
/// error type throughout the codebase.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn no_inbox_names_account_and_mailboxes() {
        let err = AppError::no_inbox("Work", &["Sent".to_owned(), "Drafts".to_owned()]);
        let msg = err.to_string();
        assert!(msg.contains("Work"));
        assert!(msg.contains("Sent, Drafts"));
    }

    #[test]
    fn no_inbox_handles_empty_directory() {
        let msg = AppError::no_inbox("Empty", &[]).to_string();
        assert!(msg.contains("(none)"));
    }
}
