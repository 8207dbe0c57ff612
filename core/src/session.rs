//! Sign-in state on top of `ApiService`.
//!
//! The session owns the lifecycle of the client's bearer token: it is set
//! on sign-in or restore, and cleared on sign-out or when the backend
//! refuses it.

use log::info;
use crate::error::ApiError;
use crate::service::ApiService;
use crate::transport::Transport;
use crate::payload::RequestBody;
use crate::types::{LoginRequest, LoginResponse};

pub const LOGIN_PATH: &str = "/auth/login";

pub struct Session<'a, T> {
    api: &'a ApiService<T>,
}

impl<'a, T: Transport> Session<'a, T> {
    pub fn new(api: &'a ApiService<T>) -> Self {
        Self { api }
    }

    /// Exchange credentials for a token and start using it.
    ///
    /// On failure the previous token, if any, is left in place.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = RequestBody::json(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let login: LoginResponse = self.api.post(LOGIN_PATH, body)?.decode()?;
        self.api.set_auth_token(Some(login.token.clone()));
        info!("signed in as technician {}", login.technician.id);
        Ok(login)
    }

    /// Resume with a token read back from device storage.
    pub fn restore(&self, token: &str) {
        self.api.set_auth_token(Some(token.to_string()));
    }

    pub fn sign_out(&self) {
        self.api.set_auth_token(None);
        info!("signed out");
    }

    pub fn is_signed_in(&self) -> bool {
        self.api.client().auth_token().is_some()
    }

    /// Clear the token when `error` says it was refused. Returns `true` if
    /// the caller has to sign in again.
    pub fn handle_failure(&self, error: &ApiError) -> bool {
        if error.is_auth_rejection() {
            info!("credential refused, clearing session");
            self.api.set_auth_token(None);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiClient;
    use crate::error::ErrorBody;
    use crate::http::{HttpBody, HttpRequest, HttpResponse};
    use crate::transport::TransportError;
    use std::sync::Mutex;

    struct LoginBackend {
        last_body: Mutex<Option<String>>,
    }

    impl Transport for LoginBackend {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            let Some(HttpBody::Text(body)) = request.body else {
                return Err(TransportError::new("expected a JSON body"));
            };
            let accepted = body.contains(r#""password":"secret""#);
            *self.last_body.lock().unwrap() = Some(body);
            let (status, body) = if accepted {
                (
                    200,
                    r#"{"token":"tok-1","technician":{"id":7,"name":"Dana Reyes","email":"dana@example.com"}}"#,
                )
            } else {
                (401, r#"{"message":"Invalid credentials"}"#)
            };
            Ok(HttpResponse {
                status,
                reason: None,
                headers: vec![("content-type".to_string(), "application/json".to_string())],
                body: body.as_bytes().to_vec(),
            })
        }
    }

    fn api() -> ApiService<LoginBackend> {
        ApiService::new(
            ApiClient::new("http://localhost:5000"),
            LoginBackend {
                last_body: Mutex::new(None),
            },
        )
    }

    #[test]
    fn sign_in_stores_token() {
        let api = api();
        let session = Session::new(&api);
        let login = session.sign_in("dana@example.com", "secret").unwrap();
        assert_eq!(login.token, "tok-1");
        assert_eq!(login.technician.name, "Dana Reyes");
        assert!(session.is_signed_in());
        assert_eq!(api.client().auth_token().as_deref(), Some("tok-1"));
        assert_eq!(
            api.transport().last_body.lock().unwrap().as_deref(),
            Some(r#"{"email":"dana@example.com","password":"secret"}"#)
        );
    }

    #[test]
    fn failed_sign_in_keeps_previous_token() {
        let api = api();
        let session = Session::new(&api);
        session.restore("stored");
        let err = session.sign_in("dana@example.com", "wrong").unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(api.client().auth_token().as_deref(), Some("stored"));
    }

    #[test]
    fn sign_out_clears_token() {
        let api = api();
        let session = Session::new(&api);
        session.restore("stored");
        session.sign_out();
        assert!(!session.is_signed_in());
    }

    #[test]
    fn auth_rejection_ends_session() {
        let api = api();
        let session = Session::new(&api);
        session.restore("stale");
        let rejected = ApiError::Http {
            status: 403,
            message: "HTTP error 403: Forbidden".to_string(),
            body: ErrorBody::Text(String::new()),
        };
        assert!(session.handle_failure(&rejected));
        assert!(!session.is_signed_in());
    }

    #[test]
    fn other_failures_keep_session() {
        let api = api();
        let session = Session::new(&api);
        session.restore("fine");
        assert!(!session.handle_failure(&ApiError::Network {
            cause: "timeout".to_string()
        }));
        assert!(session.is_signed_in());
    }
}
