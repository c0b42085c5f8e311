//! Error types for poke-aggregator
//!
//! This module provides the error taxonomy for the crate:
//! - [`FetchError`] for upstream catalog failures (absorbed per item, fatal for the listing)
//! - [`NotificationError`] for outbound mail failures
//! - [`Error`], the top-level error returned by pipeline and adapter operations
//! - HTTP status code mapping and structured [`ApiError`] bodies for the REST layer

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for poke-aggregator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for poke-aggregator
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "mail.host")
        key: Option<String>,
    },

    /// Request parameters rejected before any upstream call was made
    #[error("invalid {field}: {message}")]
    InvalidInput {
        /// Name of the offending parameter (e.g., "limit")
        field: String,
        /// Why the value was rejected
        message: String,
    },

    /// The catalog listing could not be fetched, so no result is possible
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(FetchError),

    /// A single item (or other resource) could not be found upstream
    #[error("not found: {0}")]
    NotFound(String),

    /// Spreadsheet generation failed
    #[error("export failed: {0}")]
    Export(String),

    /// Outbound mail could not be built or sent
    #[error("notification failed: {0}")]
    Notification(#[from] NotificationError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Failure of a single upstream fetch
///
/// Transport errors and malformed payloads collapse into this one type. Callers
/// treat every variant the same way; the variants exist for logging and for the
/// retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request never produced a response (timeout, refused connection, TLS)
    #[error("request to {url} failed: {reason}")]
    Transport {
        /// Requested URL
        url: String,
        /// Underlying client error text
        reason: String,
        /// Whether the failure looks transient (timeout or connect error)
        transient: bool,
    },

    /// The upstream answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code returned by the upstream
        status: u16,
    },

    /// The response body did not match the expected schema
    #[error("malformed payload from {url}: {reason}")]
    Decode {
        /// Requested URL
        url: String,
        /// Decoder error text
        reason: String,
    },
}

impl FetchError {
    /// Build a transport error from a reqwest error
    pub fn transport(url: impl Into<String>, err: &reqwest::Error) -> Self {
        FetchError::Transport {
            url: url.into(),
            reason: err.to_string(),
            transient: err.is_timeout() || err.is_connect(),
        }
    }

    /// Whether the upstream reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Status { status: 404, .. })
    }
}

impl From<tokio::sync::AcquireError> for FetchError {
    fn from(err: tokio::sync::AcquireError) -> Self {
        FetchError::Transport {
            url: "(not sent)".to_string(),
            reason: err.to_string(),
            transient: false,
        }
    }
}

/// Outbound mail errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    /// Sender or recipient address could not be parsed
    #[error("invalid address {address}: {reason}")]
    Address {
        /// The rejected address
        address: String,
        /// Parser error text
        reason: String,
    },

    /// The message could not be assembled
    #[error("failed to build message: {0}")]
    Build(String),

    /// The SMTP transport rejected or failed to deliver the message
    #[error("mail transport error: {0}")]
    Transport(String),
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "invalid_input",
///     "message": "invalid limit: must be at least 1",
///     "details": {
///       "field": "limit"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "invalid_input")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - caller or deployment must fix something
            Error::Config { .. } => 400,
            Error::InvalidInput { .. } => 400,
            Error::Notification(NotificationError::Address { .. }) => 400,

            // 404 Not Found
            Error::CatalogUnavailable(_) => 404,
            Error::NotFound(_) => 404,

            // 500 Internal Server Error
            Error::Export(_) => 500,
            Error::Notification(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidInput { .. } => "invalid_input",
            Error::CatalogUnavailable(_) => "catalog_unavailable",
            Error::NotFound(_) => "not_found",
            Error::Export(_) => "export_failed",
            Error::Notification(e) => match e {
                NotificationError::Address { .. } => "invalid_address",
                NotificationError::Build(_) => "message_build_failed",
                NotificationError::Transport(_) => "mail_transport_error",
            },
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::InvalidInput { field, .. } => Some(serde_json::json!({
                "field": field,
            })),
            Error::CatalogUnavailable(FetchError::Status { url, status }) => {
                Some(serde_json::json!({
                    "url": url,
                    "upstream_status": status,
                }))
            }
            Error::CatalogUnavailable(
                FetchError::Transport { url, .. } | FetchError::Decode { url, .. },
            ) => Some(serde_json::json!({
                "url": url,
            })),
            Error::Notification(NotificationError::Address { address, .. }) => {
                Some(serde_json::json!({
                    "address": address,
                }))
            }
            _ => None,
        };

        let mut api_error = ApiError::new(code, message);
        api_error.error.details = details;
        api_error
    }
}
