//! `ApiClient` paired with a `Transport`: one call, one round-trip.
//!
//! Every call either resolves to an `ApiPayload` or fails with an
//! `ApiError`; nothing is retried, cached or deduplicated. Calls block the
//! calling thread, and a service shared across threads has any number of
//! requests in flight with no ordering between their completions.

use log::{debug, warn};

use crate::client::ApiClient;
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::payload::{ApiPayload, RequestBody, RequestOptions};
use crate::transport::Transport;

pub struct ApiService<T> {
    client: ApiClient,
    transport: T,
}

impl<T: Transport> ApiService<T> {
    pub fn new(client: ApiClient, transport: T) -> Self {
        Self { client, transport }
    }

    /// Base URL from `FIELDOPS_API_URL`, or the local default.
    pub fn from_env(transport: T) -> Self {
        Self::new(ApiClient::from_config(&ApiConfig::from_env()), transport)
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn set_auth_token(&self, token: Option<String>) {
        self.client.set_auth_token(token);
    }

    pub fn get(&self, path: &str) -> Result<ApiPayload, ApiError> {
        self.get_with(path, &RequestOptions::default())
    }

    pub fn get_with(&self, path: &str, options: &RequestOptions) -> Result<ApiPayload, ApiError> {
        self.request(HttpMethod::Get, path, RequestBody::Empty, options)
    }

    pub fn post(&self, path: &str, body: impl Into<RequestBody>) -> Result<ApiPayload, ApiError> {
        self.post_with(path, body, &RequestOptions::default())
    }

    pub fn post_with(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
        options: &RequestOptions,
    ) -> Result<ApiPayload, ApiError> {
        self.request(HttpMethod::Post, path, body.into(), options)
    }

    pub fn put(&self, path: &str, body: impl Into<RequestBody>) -> Result<ApiPayload, ApiError> {
        self.put_with(path, body, &RequestOptions::default())
    }

    pub fn put_with(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
        options: &RequestOptions,
    ) -> Result<ApiPayload, ApiError> {
        self.request(HttpMethod::Put, path, body.into(), options)
    }

    pub fn patch(&self, path: &str, body: impl Into<RequestBody>) -> Result<ApiPayload, ApiError> {
        self.patch_with(path, body, &RequestOptions::default())
    }

    pub fn patch_with(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
        options: &RequestOptions,
    ) -> Result<ApiPayload, ApiError> {
        self.request(HttpMethod::Patch, path, body.into(), options)
    }

    pub fn delete(&self, path: &str) -> Result<ApiPayload, ApiError> {
        self.delete_with(path, &RequestOptions::default())
    }

    pub fn delete_with(&self, path: &str, options: &RequestOptions) -> Result<ApiPayload, ApiError> {
        self.request(HttpMethod::Delete, path, RequestBody::Empty, options)
    }

    pub fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: RequestBody,
        options: &RequestOptions,
    ) -> Result<ApiPayload, ApiError> {
        let request = self.client.build_request(method, path, body, options);
        debug!("{method} {}", request.url);

        let response = self.transport.execute(request).map_err(|e| {
            warn!("{method} {path}: {e}");
            ApiError::from(e)
        })?;

        let status = response.status;
        let result = self.client.parse_response(response);
        match &result {
            Ok(_) => debug!("{method} {path} -> {status}"),
            Err(e) => warn!("{method} {path}: {e}"),
        }
        result
    }
}
