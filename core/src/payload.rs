//! Values flowing into and out of a call: request bodies, per-call options
//! and the tagged success payload.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::multipart::MultipartForm;

/// Body of an outgoing request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Serialized to JSON text with `content-type: application/json`.
    Json(Value),
    /// Sent as-is; the transport sets the multipart content type.
    Multipart(MultipartForm),
}

impl RequestBody {
    /// Serialize a typed payload. No schema validation beyond what the
    /// type itself enforces.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(RequestBody::Json)
            .map_err(|e| ApiError::Payload(e.to_string()))
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<MultipartForm> for RequestBody {
    fn from(form: MultipartForm) -> Self {
        RequestBody::Multipart(form)
    }
}

/// Per-call overrides.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    /// Used instead of the client's shared token for this call only.
    pub bearer_token: Option<String>,
}

impl RequestOptions {
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_bearer_token(mut self, token: &str) -> Self {
        self.bearer_token = Some(token.to_string());
        self
    }
}

/// Successful result of a call.
///
/// The shape depends on what the server sent, so callers match on it
/// instead of guessing from the content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiPayload {
    /// 2xx with a JSON content type. May itself be `Value::Null`.
    Json(Value),
    /// 2xx with any other content type.
    Text(String),
    /// 204.
    NoContent,
}

impl ApiPayload {
    pub fn is_no_content(&self) -> bool {
        matches!(self, ApiPayload::NoContent)
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ApiPayload::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ApiPayload::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Deserialize a JSON payload into `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            ApiPayload::Json(value) => {
                serde_json::from_value(value).map_err(|e| ApiError::Payload(e.to_string()))
            }
            ApiPayload::Text(_) => Err(ApiError::Payload(
                "expected a JSON payload, got text".to_string(),
            )),
            ApiPayload::NoContent => Err(ApiError::Payload(
                "expected a JSON payload, got no content".to_string(),
            )),
        }
    }
}
