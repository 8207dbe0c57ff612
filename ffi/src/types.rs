//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, pointer + length instead of `Vec`, and
//! tagged enums with explicit discriminants. Conversion functions live here
//! to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use fieldops_core::error::{ApiError, ErrorBody};
use fieldops_core::http::{HttpMethod, HttpRequest, WireRequest};
use fieldops_core::payload::ApiPayload;

/// Opaque handle to an `ApiClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiApiClient {
    pub(crate) inner: fieldops_core::ApiClient,
}

/// Copy `s` into a heap C string owned by the caller.
///
/// Interior NULs cannot be represented in a C string and are removed, so
/// text containing them reaches the host shortened.
pub(crate) fn c_string(s: String) -> *mut c_char {
    let bytes: Vec<u8> = s.into_bytes().into_iter().filter(|b| *b != 0).collect();
    CString::new(bytes).unwrap_or_default().into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Clone, Copy)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Patch = 3,
    Delete = 4,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Patch => FfiHttpMethod::Patch,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

impl From<FfiHttpMethod> for HttpMethod {
    fn from(m: FfiHttpMethod) -> Self {
        match m {
            FfiHttpMethod::Get => HttpMethod::Get,
            FfiHttpMethod::Post => HttpMethod::Post,
            FfiHttpMethod::Put => HttpMethod::Put,
            FfiHttpMethod::Patch => HttpMethod::Patch,
            FfiHttpMethod::Delete => HttpMethod::Delete,
        }
    }
}

/// A header owned by the library, inside an `FfiHttpRequest`.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A header borrowed from the caller, passed into `fieldops_build_request`.
#[repr(C)]
pub struct FfiHeaderRef {
    pub key: *const c_char,
    pub value: *const c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `fieldops_build_request`. The host executes the request with
/// its own networking stack and passes the response back through
/// `fieldops_parse_response`. `body` is null when there is no body.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut u8,
    pub body_len: usize,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    ///
    /// Multipart bodies are encoded here, since the host only sees bytes.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let WireRequest {
            method,
            url,
            headers,
            body,
        } = req.into_wire();

        let (body, body_len) = match body {
            Some(bytes) => {
                let len = bytes.len();
                (Box::into_raw(bytes.into_boxed_slice()) as *mut u8, len)
            }
            None => (std::ptr::null_mut(), 0),
        };

        let headers_len = headers.len() as u32;
        let headers = if headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: method.into(),
            url: c_string(url),
            headers,
            headers_len,
            body,
            body_len,
        }))
    }
}

/// One field of a multipart form, borrowed from the caller.
///
/// A null `filename` makes a plain text field, and `data` must then be
/// UTF-8. With a filename the part is a file; a null `content_type`
/// defaults to `application/octet-stream`. `data` may be null when
/// `data_len` is 0.
#[repr(C)]
pub struct FfiFormPart {
    pub name: *const c_char,
    pub filename: *const c_char,
    pub content_type: *const c_char,
    pub data: *const u8,
    pub data_len: usize,
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The host fills this in after executing a request. `reason` and
/// `content_type` may be null; `body` may be null when `body_len` is 0.
/// The FFI layer reads but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub reason: *const c_char,
    pub content_type: *const c_char,
    pub body: *const u8,
    pub body_len: usize,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiApiResult`.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Http = 1,
    Network = 2,
    Payload = 3,
    Panic = 4,
    NullArg = 5,
    InvalidArg = 6,
}

/// What `FfiApiResult::data` holds.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    NoContent = 1,
    Json = 2,
    Text = 3,
}

/// Result envelope for `fieldops_parse_response` and
/// `fieldops_transport_failure`.
///
/// On success `error_code` is `Ok` and `data_tag` says whether `data` is
/// JSON text, raw text, or absent (204). On an HTTP error `error_code` is
/// `Http`, `http_status` is set and `data` carries the parsed error body.
/// Every other failure has a null `data`.
#[repr(C)]
pub struct FfiApiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_char,
}

impl FfiApiResult {
    fn boxed(
        error_code: FfiErrorCode,
        error_message: Option<String>,
        http_status: u16,
        data_tag: FfiDataTag,
        data: Option<String>,
    ) -> *mut Self {
        Box::into_raw(Box::new(FfiApiResult {
            error_code,
            error_message: error_message.map_or(std::ptr::null_mut(), c_string),
            http_status,
            data_tag,
            data: data.map_or(std::ptr::null_mut(), c_string),
        }))
    }

    pub(crate) fn ok(payload: ApiPayload) -> *mut Self {
        let (tag, data) = match payload {
            ApiPayload::NoContent => (FfiDataTag::NoContent, None),
            ApiPayload::Json(value) => (FfiDataTag::Json, Some(value.to_string())),
            ApiPayload::Text(text) => (FfiDataTag::Text, Some(text)),
        };
        Self::boxed(FfiErrorCode::Ok, None, 0, tag, data)
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let msg = err.to_string();
        match err {
            ApiError::Http { status, body, .. } => {
                let (tag, data) = match body {
                    ErrorBody::Json(value) => (FfiDataTag::Json, value.to_string()),
                    ErrorBody::Text(text) => (FfiDataTag::Text, text),
                };
                Self::boxed(FfiErrorCode::Http, Some(msg), status, tag, Some(data))
            }
            ApiError::Network { .. } => {
                Self::boxed(FfiErrorCode::Network, Some(msg), 0, FfiDataTag::None, None)
            }
            ApiError::Payload(_) => {
                Self::boxed(FfiErrorCode::Payload, Some(msg), 0, FfiDataTag::None, None)
            }
        }
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::NullArg,
            Some(format!("null argument: {name}")),
            0,
            FfiDataTag::None,
            None,
        )
    }

    pub(crate) fn invalid_arg(msg: String) -> *mut Self {
        Self::boxed(FfiErrorCode::InvalidArg, Some(msg), 0, FfiDataTag::None, None)
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, Some(msg.to_string()), 0, FfiDataTag::None, None)
    }
}
