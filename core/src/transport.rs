//! The I/O seam between `ApiService` and the network.
//!
//! A transport executes one `HttpRequest` and returns whatever response the
//! server produced, 4xx/5xx included. It only fails when no usable response
//! arrived; classifying statuses is the client's job.

use thiserror::Error;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// No response was received: DNS, connect, TLS, timeout, malformed URL.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(error: TransportError) -> Self {
        ApiError::network(error.message)
    }
}

pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

#[cfg(feature = "ureq-transport")]
pub use self::ureq_transport::UreqTransport;

#[cfg(feature = "ureq-transport")]
mod ureq_transport {
    use log::trace;
    use ureq::{Agent, RequestBuilder};

    use super::{Transport, TransportError};
    use crate::http::{HttpMethod, HttpRequest, HttpResponse, WireRequest};

    /// Blocking transport over a shared ureq agent.
    ///
    /// Status codes are returned as data rather than errors, and no timeout
    /// is configured beyond ureq's defaults.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: Agent,
    }

    impl UreqTransport {
        pub fn new() -> Self {
            let agent = Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    fn with_headers<B>(
        mut builder: RequestBuilder<B>,
        headers: &[(String, String)],
    ) -> RequestBuilder<B> {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    impl Transport for UreqTransport {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            let WireRequest {
                method,
                url,
                headers,
                body,
            } = request.into_wire();
            trace!(
                "{method} {url} ({} body bytes)",
                body.as_ref().map_or(0, Vec::len)
            );

            let url = url.as_str();
            let result = match (method, body) {
                (HttpMethod::Get, None) => with_headers(self.agent.get(url), &headers).call(),
                (HttpMethod::Get, Some(bytes)) => with_headers(self.agent.get(url), &headers)
                    .force_send_body()
                    .send(&bytes[..]),
                (HttpMethod::Delete, None) => {
                    with_headers(self.agent.delete(url), &headers).call()
                }
                (HttpMethod::Delete, Some(bytes)) => with_headers(self.agent.delete(url), &headers)
                    .force_send_body()
                    .send(&bytes[..]),
                (HttpMethod::Post, Some(bytes)) => {
                    with_headers(self.agent.post(url), &headers).send(&bytes[..])
                }
                (HttpMethod::Post, None) => with_headers(self.agent.post(url), &headers).send_empty(),
                (HttpMethod::Put, Some(bytes)) => {
                    with_headers(self.agent.put(url), &headers).send(&bytes[..])
                }
                (HttpMethod::Put, None) => with_headers(self.agent.put(url), &headers).send_empty(),
                (HttpMethod::Patch, Some(bytes)) => {
                    with_headers(self.agent.patch(url), &headers).send(&bytes[..])
                }
                (HttpMethod::Patch, None) => {
                    with_headers(self.agent.patch(url), &headers).send_empty()
                }
            };
            let mut response = result.map_err(|e| TransportError::new(e.to_string()))?;

            let status = response.status();
            let headers: Vec<(String, String)> = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response
                .body_mut()
                .read_to_vec()
                .map_err(|e| TransportError::new(e.to_string()))?;

            Ok(HttpResponse {
                status: status.as_u16(),
                reason: status.canonical_reason().map(str::to_string),
                headers,
                body,
            })
        }
    }
}
