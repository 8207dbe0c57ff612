//! Request builder and response classifier for the field-service backend.
//!
//! # Design
//! `ApiClient` holds the base URL and the shared bearer-token slot, and
//! never touches the network. `build_request` produces an `HttpRequest`
//! with the standard headers applied; `parse_response` turns whatever came
//! back into an `ApiPayload` or an `ApiError`. `ApiService` and the FFI
//! layer sit on top and do the I/O in between.
//!
//! The token is read once, while the request is built. A request built
//! before `set_auth_token` keeps the old token even if it is sent later;
//! callers that need a specific token for one call pass it through
//! `RequestOptions::bearer_token` instead.

use std::sync::{Arc, PoisonError, RwLock};

use log::debug;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::{ApiError, ErrorBody};
use crate::http::{find_header, HttpBody, HttpMethod, HttpRequest, HttpResponse};
use crate::payload::{ApiPayload, RequestBody, RequestOptions};

const JSON_MEDIA_TYPE: &str = "application/json";
const DEFAULT_STATUS_TEXT: &str = "An error occurred";

/// Stateless apart from the token slot, which clones share.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(&config.base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replace the bearer token. `None` clears it.
    pub fn set_auth_token(&self, token: Option<String>) {
        debug!(
            "auth token {}",
            if token.is_some() { "set" } else { "cleared" }
        );
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn auth_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: RequestBody,
        options: &RequestOptions,
    ) -> HttpRequest {
        let token = options.bearer_token.clone().or_else(|| self.auth_token());
        let is_json = matches!(body, RequestBody::Json(_));

        let mut headers = Vec::with_capacity(options.headers.len() + 3);
        if is_json && find_header(&options.headers, "content-type").is_none() {
            headers.push(("content-type".to_string(), JSON_MEDIA_TYPE.to_string()));
        }
        headers.push(("accept".to_string(), JSON_MEDIA_TYPE.to_string()));
        headers.extend(
            options
                .headers
                .iter()
                .filter(|(name, _)| {
                    !name.eq_ignore_ascii_case("accept")
                        && !name.eq_ignore_ascii_case("authorization")
                })
                .cloned(),
        );
        if let Some(token) = token {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }

        let body = match body {
            RequestBody::Empty => None,
            RequestBody::Json(value) => Some(HttpBody::Text(value.to_string())),
            RequestBody::Multipart(form) => Some(HttpBody::Multipart(form)),
        };

        HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers,
            body,
        }
    }

    pub fn parse_response(&self, response: HttpResponse) -> Result<ApiPayload, ApiError> {
        if !response.is_success() {
            let status_text = response
                .reason
                .as_deref()
                .filter(|reason| !reason.is_empty())
                .unwrap_or(DEFAULT_STATUS_TEXT);
            return Err(ApiError::Http {
                status: response.status,
                message: format!("HTTP error {}: {status_text}", response.status),
                body: ErrorBody::parse(&response.body),
            });
        }

        if response.status == 204 {
            return Ok(ApiPayload::NoContent);
        }

        let is_json = response
            .content_type()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains(JSON_MEDIA_TYPE));
        if is_json {
            serde_json::from_slice::<Value>(&response.body)
                .map(ApiPayload::Json)
                .map_err(|e| ApiError::network(e.to_string()))
        } else {
            Ok(ApiPayload::Text(
                String::from_utf8_lossy(&response.body).into_owned(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multipart::MultipartForm;
    use serde_json::json;

    fn client() -> ApiClient {
        ApiClient::new("https://api.example.com")
    }

    fn response(status: u16, content_type: Option<&str>, body: &[u8]) -> HttpResponse {
        HttpResponse {
            status,
            reason: None,
            headers: content_type
                .map(|ct| vec![("content-type".to_string(), ct.to_string())])
                .unwrap_or_default(),
            body: body.to_vec(),
        }
    }

    #[test]
    fn get_with_token_carries_bearer_and_accept() {
        let c = client();
        c.set_auth_token(Some("abc123".to_string()));
        let req = c.build_request(
            HttpMethod::Get,
            "/jobs/mine",
            RequestBody::Empty,
            &RequestOptions::default(),
        );
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://api.example.com/jobs/mine");
        assert_eq!(req.header("Authorization"), Some("Bearer abc123"));
        assert_eq!(req.header("Accept"), Some("application/json"));
        assert!(req.header("content-type").is_none());
        assert!(req.body.is_none());
    }

    #[test]
    fn cleared_token_omits_authorization() {
        let c = client();
        c.set_auth_token(Some("abc123".to_string()));
        c.set_auth_token(None);
        let req = c.build_request(
            HttpMethod::Get,
            "/jobs/mine",
            RequestBody::Empty,
            &RequestOptions::default(),
        );
        assert!(req.header("authorization").is_none());
    }

    #[test]
    fn clones_share_the_token() {
        let c = client();
        let other = c.clone();
        c.set_auth_token(Some("shared".to_string()));
        assert_eq!(other.auth_token().as_deref(), Some("shared"));
    }

    #[test]
    fn request_built_before_token_change_keeps_old_token() {
        let c = client();
        c.set_auth_token(Some("old".to_string()));
        let req = c.build_request(
            HttpMethod::Get,
            "/jobs/mine",
            RequestBody::Empty,
            &RequestOptions::default(),
        );
        c.set_auth_token(Some("new".to_string()));
        assert_eq!(req.header("authorization"), Some("Bearer old"));
    }

    #[test]
    fn per_call_token_overrides_shared_token() {
        let c = client();
        c.set_auth_token(Some("shared".to_string()));
        let options = RequestOptions::default().with_bearer_token("scoped");
        let req = c.build_request(HttpMethod::Get, "/jobs/mine", RequestBody::Empty, &options);
        assert_eq!(req.header("authorization"), Some("Bearer scoped"));
    }

    #[test]
    fn post_serializes_json_body_exactly() {
        let body = json!({"type": "cash", "amount": 1000, "tip": 200});
        let req = client().build_request(
            HttpMethod::Post,
            "/jobs/5/payments",
            body.into(),
            &RequestOptions::default(),
        );
        assert_eq!(req.url, "https://api.example.com/jobs/5/payments");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(
            req.body,
            Some(HttpBody::Text(r#"{"type":"cash","amount":1000,"tip":200}"#.to_string()))
        );
    }

    #[test]
    fn caller_content_type_is_kept() {
        let options =
            RequestOptions::default().with_header("Content-Type", "application/merge-patch+json");
        let req = client().build_request(
            HttpMethod::Patch,
            "/jobs/5",
            json!({"notes": "gate code 1234"}).into(),
            &options,
        );
        let content_types: Vec<_> = req
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .collect();
        assert_eq!(content_types.len(), 1);
        assert_eq!(req.header("content-type"), Some("application/merge-patch+json"));
    }

    #[test]
    fn caller_cannot_override_accept_or_authorization() {
        let c = client();
        c.set_auth_token(Some("abc123".to_string()));
        let options = RequestOptions::default()
            .with_header("Accept", "text/html")
            .with_header("Authorization", "Basic xyz")
            .with_header("X-Device", "tablet-7");
        let req = c.build_request(HttpMethod::Get, "/jobs/mine", RequestBody::Empty, &options);
        assert_eq!(
            req.headers,
            vec![
                ("accept".to_string(), "application/json".to_string()),
                ("X-Device".to_string(), "tablet-7".to_string()),
                ("authorization".to_string(), "Bearer abc123".to_string()),
            ]
        );
    }

    #[test]
    fn multipart_body_gets_no_content_type() {
        let form = MultipartForm::new().file("photo", "a.jpg", "image/jpeg", vec![0xff]);
        let req = client().build_request(
            HttpMethod::Post,
            "/jobs/5/photos",
            form.clone().into(),
            &RequestOptions::default(),
        );
        assert!(req.header("content-type").is_none());
        assert_eq!(req.body, Some(HttpBody::Multipart(form)));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let req = ApiClient::new("http://localhost:5000/").build_request(
            HttpMethod::Delete,
            "/jobs/5/payments/9",
            RequestBody::Empty,
            &RequestOptions::default(),
        );
        assert_eq!(req.url, "http://localhost:5000/jobs/5/payments/9");
    }

    #[test]
    fn status_204_is_no_content() {
        let payload = client().parse_response(response(204, None, b"")).unwrap();
        assert_eq!(payload, ApiPayload::NoContent);
    }

    #[test]
    fn json_success_is_parsed() {
        let payload = client()
            .parse_response(response(
                200,
                Some("application/json; charset=utf-8"),
                br#"[{"id":5,"status":"scheduled"}]"#,
            ))
            .unwrap();
        assert_eq!(payload, ApiPayload::Json(json!([{"id": 5, "status": "scheduled"}])));
    }

    #[test]
    fn json_null_is_not_no_content() {
        let payload = client()
            .parse_response(response(200, Some("application/json"), b"null"))
            .unwrap();
        assert_eq!(payload, ApiPayload::Json(Value::Null));
    }

    #[test]
    fn non_json_success_is_raw_text() {
        let payload = client()
            .parse_response(response(200, Some("text/plain"), b"ok"))
            .unwrap();
        assert_eq!(payload, ApiPayload::Text("ok".to_string()));

        let payload = client().parse_response(response(201, None, b"created")).unwrap();
        assert_eq!(payload, ApiPayload::Text("created".to_string()));
    }

    #[test]
    fn malformed_json_success_is_network_error() {
        let err = client()
            .parse_response(response(200, Some("application/json"), b"{not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Network { .. }));
        assert!(err.to_string().starts_with("Network request failed: "));
    }

    #[test]
    fn not_found_carries_status_and_json_body() {
        let mut resp = response(404, Some("application/json"), br#"{"message":"Job not found"}"#);
        resp.reason = Some("Not Found".to_string());
        let err = client().parse_response(resp).unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "HTTP error 404: Not Found");
        assert_eq!(err.body().and_then(ErrorBody::message), Some("Job not found"));
    }

    #[test]
    fn missing_status_text_uses_default_message() {
        let err = client()
            .parse_response(response(500, Some("text/plain"), b"boom"))
            .unwrap_err();
        assert_eq!(err.to_string(), "HTTP error 500: An error occurred");
        assert_eq!(err.body(), Some(&ErrorBody::Text("boom".to_string())));
    }

    #[test]
    fn error_body_is_parsed_regardless_of_content_type() {
        let err = client()
            .parse_response(response(422, Some("text/plain"), br#"{"message":"tip too large"}"#))
            .unwrap_err();
        assert_eq!(err.body().and_then(ErrorBody::message), Some("tip too large"));
    }
}
