//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The
//! client builds `HttpRequest` values and classifies `HttpResponse` values
//! without touching the network; a `Transport` (or an FFI host) performs
//! the actual round-trip. All fields are owned so values can cross thread
//! and FFI boundaries without lifetime concerns.

use std::fmt;

use crate::multipart::{new_boundary, MultipartForm};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body as handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpBody {
    /// Already-serialized text (JSON for everything the client builds).
    Text(String),
    /// A form the transport must encode, choosing the boundary itself.
    Multipart(MultipartForm),
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<HttpBody>,
}

impl HttpRequest {
    /// First value of `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Encode the body to bytes.
    ///
    /// A multipart form gets a fresh boundary, and its content type
    /// replaces any `content-type` the caller supplied.
    pub fn into_wire(self) -> WireRequest {
        let mut headers = self.headers;
        let body = match self.body {
            None => None,
            Some(HttpBody::Text(text)) => Some(text.into_bytes()),
            Some(HttpBody::Multipart(form)) => {
                let boundary = new_boundary();
                headers.retain(|(key, _)| !key.eq_ignore_ascii_case("content-type"));
                headers.push((
                    "content-type".to_string(),
                    MultipartForm::content_type(&boundary),
                ));
                Some(form.encode(&boundary))
            }
        };
        WireRequest {
            method: self.method,
            url: self.url,
            headers,
            body,
        }
    }
}

/// A request whose body is final bytes, as it goes out on the socket.
#[derive(Debug, Clone, PartialEq)]
pub struct WireRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

/// An HTTP response described as plain data.
///
/// `reason` is the status text, when the transport knows one.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
