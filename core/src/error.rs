//! Error types for the field-service API client.
//!
//! # Design
//! Callers need to tell "the server rejected this" apart from "we could not
//! reach the server", so the two outcomes get separate variants. `Http`
//! carries the status and a best-effort parse of the error body; `Network`
//! carries only the underlying message. `Payload` covers caller-side
//! conversion of typed request/response values and is never produced by
//! the wrapper itself.

use serde_json::Value;
use thiserror::Error;

/// Placeholder stored as the error body when it is neither JSON nor UTF-8.
pub const UNPARSEABLE_ERROR_BODY: &str = "Unable to parse error response";

/// Prefix of every `ApiError::Network` message.
pub const NETWORK_ERROR_PREFIX: &str = "Network request failed: ";

/// Errors returned by `ApiClient` and `ApiService`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A non-2xx response was received.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        body: ErrorBody,
    },

    /// No usable response: DNS, connect, timeout, abort, malformed success body.
    #[error("Network request failed: {cause}")]
    Network { cause: String },

    /// A typed payload could not be converted to or from JSON.
    #[error("payload conversion failed: {0}")]
    Payload(String),
}

impl ApiError {
    pub(crate) fn network(cause: impl Into<String>) -> Self {
        ApiError::Network {
            cause: cause.into(),
        }
    }

    /// HTTP status of an `Http` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Parsed body of an `Http` error.
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            ApiError::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    /// True for 401 and 403: the credential was refused and the session
    /// layer should sign in again.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

/// Best-effort parse of a non-2xx response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    Json(Value),
    Text(String),
}

impl ErrorBody {
    /// Parse in order: JSON, then UTF-8 text, then the fixed placeholder.
    pub fn parse(bytes: &[u8]) -> Self {
        if let Ok(value) = serde_json::from_slice::<Value>(bytes) {
            return ErrorBody::Json(value);
        }
        match std::str::from_utf8(bytes) {
            Ok(text) => ErrorBody::Text(text.to_string()),
            Err(_) => ErrorBody::Text(UNPARSEABLE_ERROR_BODY.to_string()),
        }
    }

    /// The `message` field of a JSON error body, if the server sent one.
    pub fn message(&self) -> Option<&str> {
        match self {
            ErrorBody::Json(value) => value.get("message").and_then(Value::as_str),
            ErrorBody::Text(_) => None,
        }
    }
}
