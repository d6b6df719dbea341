/// Unified error types for the service directory
use crate::directory::IdentifierKind;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Main error type for directory resolution
///
/// Cloneable so a failed directory refresh can be reported to every caller
/// that was waiting on it.
#[derive(Error, Debug, Clone)]
pub enum DirectoryError {
    /// Identifier string does not match the URN grammar
    #[error("Malformed identifier '{input}': {reason}")]
    MalformedIdentifier { input: String, reason: String },

    /// Identifier parsed but has the wrong shape for the operation
    #[error("Identifier {identifier} is a {actual} identifier, expected one of: {}", format_kinds(.expected))]
    InvalidIdentifierKind {
        identifier: String,
        expected: Vec<IdentifierKind>,
        actual: IdentifierKind,
    },

    /// Directory retrieval failed after all retry attempts
    #[error("Directory fetch failed after {attempts} attempt(s): {source}")]
    Fetch {
        attempts: u32,
        #[source]
        source: Arc<FetchError>,
    },

    /// Identifier absent from the directory after a full refresh
    #[error("Directory entry not found for {0}")]
    EntryNotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of a single directory fetch attempt
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("access token unavailable: {0}")]
    Token(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("directory returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid directory response: {0}")]
    Decode(String),
}

fn format_kinds(kinds: &[IdentifierKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error response body returned by the resolver endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl DirectoryError {
    /// Shorthand for building a malformed identifier error
    pub fn malformed(input: &str, reason: impl Into<String>) -> Self {
        DirectoryError::MalformedIdentifier {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Wrap the last attempt's failure of an exhausted fetch
    pub fn fetch(attempts: u32, source: FetchError) -> Self {
        DirectoryError::Fetch {
            attempts,
            source: Arc::new(source),
        }
    }

    /// Whether retrying the same call later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, DirectoryError::Fetch { .. })
    }
}

/// Convert DirectoryError to HTTP response
impl IntoResponse for DirectoryError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            DirectoryError::MalformedIdentifier { .. } => (
                StatusCode::BAD_REQUEST,
                "MalformedIdentifier",
                self.to_string(),
            ),
            DirectoryError::InvalidIdentifierKind { .. } => (
                StatusCode::BAD_REQUEST,
                "InvalidIdentifierKind",
                self.to_string(),
            ),
            DirectoryError::EntryNotFound(_) => (
                StatusCode::NOT_FOUND,
                "EntryNotFound",
                self.to_string(),
            ),
            DirectoryError::Fetch { .. } => (
                StatusCode::BAD_GATEWAY,
                "DirectoryUnavailable",
                self.to_string(),
            ),
            DirectoryError::Config(_) | DirectoryError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for directory operations
pub type DirectoryResult<T> = Result<T, DirectoryError>;
