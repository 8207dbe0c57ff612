//! C-ABI wrapper around `fieldops-core`.
//!
//! # Overview
//! Exposes the sans-IO half of the API client through `extern "C"`
//! functions so a mobile host can build requests, execute them with its
//! own networking stack, and hand the responses back for classification.
//!
//! # Design
//! - Panics are caught with `catch_unwind` at every `extern "C"` entry and
//!   surface as a null pointer or a `Panic` result.
//! - `fieldops_build_request` / `fieldops_parse_response` mirror
//!   `ApiClient::build_request` / `ApiClient::parse_response` 1:1.
//! - A host whose request never produced a response reports it through
//!   `fieldops_transport_failure`, so both failure kinds reach the app in
//!   the same `FfiApiResult` envelope.
//! - Returned pointers belong to the host; release each one with its
//!   `fieldops_free_*` counterpart.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use fieldops_core::error::ApiError;
use fieldops_core::http::HttpResponse;
use fieldops_core::multipart::MultipartForm;
use fieldops_core::payload::{RequestBody, RequestOptions};
use fieldops_core::{ApiClient, ApiConfig, TransportError};
use log::error;

use types::*;

/// Borrow a caller C string. `None` for null or non-UTF-8 input.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn borrow_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new client bound to `base_url`.
///
/// Returns null if `base_url` is null or not UTF-8, or if an internal panic
/// occurs. The caller must free the returned pointer with
/// `fieldops_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn fieldops_client_new(base_url: *const c_char) -> *mut FfiApiClient {
    catch_unwind(|| match unsafe { borrow_str(base_url) } {
        Some(url) => Box::into_raw(Box::new(FfiApiClient {
            inner: ApiClient::new(url),
        })),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Create a client from `FIELDOPS_API_URL`, falling back to
/// `http://localhost:5000`.
#[unsafe(no_mangle)]
pub extern "C" fn fieldops_client_from_env() -> *mut FfiApiClient {
    catch_unwind(|| {
        Box::into_raw(Box::new(FfiApiClient {
            inner: ApiClient::from_config(&ApiConfig::from_env()),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `fieldops_client_new` or
/// `fieldops_client_from_env`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fieldops_client_free(client: *mut FfiApiClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

/// The client's base URL. Free with `fieldops_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn fieldops_client_base_url(client: *const FfiApiClient) -> *mut c_char {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        c_string(client.inner.base_url().to_string())
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Replace the bearer token; a null `token` clears it.
///
/// Requests built afterwards carry the new token. Returns false if `client`
/// is null or `token` is not UTF-8.
#[unsafe(no_mangle)]
pub extern "C" fn fieldops_client_set_auth_token(
    client: *const FfiApiClient,
    token: *const c_char,
) -> bool {
    catch_unwind(|| {
        if client.is_null() {
            return false;
        }
        let client = unsafe { &*client };
        if token.is_null() {
            client.inner.set_auth_token(None);
            return true;
        }
        match unsafe { borrow_str(token) } {
            Some(token) => {
                client.inner.set_auth_token(Some(token.to_string()));
                true
            }
            None => false,
        }
    })
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Build / parse
// ---------------------------------------------------------------------------

/// Copy caller headers into request options. `None` if the array is null
/// with a non-zero length, or any key or value is null or not UTF-8.
///
/// # Safety
/// `headers` must be null or point to `headers_len` valid `FfiHeaderRef`s.
unsafe fn collect_options(
    headers: *const FfiHeaderRef,
    headers_len: u32,
) -> Option<RequestOptions> {
    let mut options = RequestOptions::default();
    if headers_len == 0 {
        return Some(options);
    }
    if headers.is_null() {
        return None;
    }
    let refs = unsafe { std::slice::from_raw_parts(headers, headers_len as usize) };
    for header in refs {
        let key = unsafe { borrow_str(header.key) }?;
        let value = unsafe { borrow_str(header.value) }?;
        options.headers.push((key.to_string(), value.to_string()));
    }
    Some(options)
}

/// Assemble a form from caller parts. `None` on any unusable field.
///
/// # Safety
/// `parts` must be null or point to `parts_len` valid `FfiFormPart`s.
unsafe fn collect_form(parts: *const FfiFormPart, parts_len: u32) -> Option<MultipartForm> {
    let mut form = MultipartForm::new();
    if parts_len == 0 {
        return Some(form);
    }
    if parts.is_null() {
        return None;
    }
    let refs = unsafe { std::slice::from_raw_parts(parts, parts_len as usize) };
    for part in refs {
        let name = unsafe { borrow_str(part.name) }?;
        let data = if part.data_len == 0 {
            &[][..]
        } else if part.data.is_null() {
            return None;
        } else {
            unsafe { std::slice::from_raw_parts(part.data, part.data_len) }
        };
        form = if part.filename.is_null() {
            form.text(name, std::str::from_utf8(data).ok()?)
        } else {
            let filename = unsafe { borrow_str(part.filename) }?;
            let content_type = if part.content_type.is_null() {
                "application/octet-stream"
            } else {
                unsafe { borrow_str(part.content_type) }?
            };
            form.file(name, filename, content_type, data.to_vec())
        };
    }
    Some(form)
}

/// Build a request for `method` on `path`.
///
/// `body_json` may be null (no body); otherwise it must be valid JSON text
/// and is sent with `content-type: application/json` unless `headers`
/// already names a content type. `headers` may be null when `headers_len`
/// is 0.
///
/// Returns null if `client` or `path` is null, if `body_json` is not valid
/// JSON, or if any header is null or not UTF-8. The caller must free the
/// returned pointer with `fieldops_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn fieldops_build_request(
    client: *const FfiApiClient,
    method: FfiHttpMethod,
    path: *const c_char,
    body_json: *const c_char,
    headers: *const FfiHeaderRef,
    headers_len: u32,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(path) = (unsafe { borrow_str(path) }) else {
            return std::ptr::null_mut();
        };

        let body = if body_json.is_null() {
            RequestBody::Empty
        } else {
            let parsed = unsafe { borrow_str(body_json) }
                .and_then(|text| serde_json::from_str(text).ok());
            match parsed {
                Some(value) => RequestBody::Json(value),
                None => return std::ptr::null_mut(),
            }
        };

        let Some(options) = (unsafe { collect_options(headers, headers_len) }) else {
            return std::ptr::null_mut();
        };

        let req = client
            .inner
            .build_request(method.into(), path, body, &options);
        FfiHttpRequest::from_core(req)
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a `multipart/form-data` request, such as a job photo upload.
///
/// The returned request carries the encoded form as its body and a
/// matching `content-type` with a fresh boundary; any content type in
/// `headers` is replaced. `parts` may be null when `parts_len` is 0.
///
/// Returns null if `client` or `path` is null, or if any part or header is
/// unusable (see `FfiFormPart`). Free with `fieldops_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn fieldops_build_multipart_request(
    client: *const FfiApiClient,
    method: FfiHttpMethod,
    path: *const c_char,
    parts: *const FfiFormPart,
    parts_len: u32,
    headers: *const FfiHeaderRef,
    headers_len: u32,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(path) = (unsafe { borrow_str(path) }) else {
            return std::ptr::null_mut();
        };
        let Some(form) = (unsafe { collect_form(parts, parts_len) }) else {
            return std::ptr::null_mut();
        };
        let Some(options) = (unsafe { collect_options(headers, headers_len) }) else {
            return std::ptr::null_mut();
        };

        let req = client.inner.build_request(
            method.into(),
            path,
            RequestBody::Multipart(form),
            &options,
        );
        FfiHttpRequest::from_core(req)
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Convert an `FfiHttpResponse` to a core `HttpResponse`.
///
/// Returns the name of the offending field if a pointer is unusable.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> Result<HttpResponse, &'static str> {
    let reason = if resp.reason.is_null() {
        None
    } else {
        Some(unsafe { borrow_str(resp.reason) }.ok_or("reason")?.to_string())
    };
    let mut headers = Vec::new();
    if !resp.content_type.is_null() {
        let content_type = unsafe { borrow_str(resp.content_type) }.ok_or("content_type")?;
        headers.push(("content-type".to_string(), content_type.to_string()));
    }
    let body = if resp.body_len == 0 {
        Vec::new()
    } else if resp.body.is_null() {
        return Err("body");
    } else {
        unsafe { std::slice::from_raw_parts(resp.body, resp.body_len) }.to_vec()
    };
    Ok(HttpResponse {
        status: resp.status,
        reason,
        headers,
        body,
    })
}

/// Classify a response the host received.
///
/// `data` and `error_message` are C strings, so NUL bytes in a text or
/// JSON body are removed on the way out. Free the result with
/// `fieldops_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn fieldops_parse_response(
    client: *const FfiApiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiApiResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiApiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiApiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        let core_resp = match ffi_response_to_core(resp) {
            Ok(r) => r,
            Err(field) => return FfiApiResult::invalid_arg(format!("invalid response {field}")),
        };
        match client.inner.parse_response(core_resp) {
            Ok(payload) => FfiApiResult::ok(payload),
            Err(e) => FfiApiResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| {
        error!("panic in fieldops_parse_response");
        FfiApiResult::panic("panic in fieldops_parse_response")
    })
}

/// Report that a request produced no response (DNS, connect, timeout,
/// abort). `message` is the host's description and may be null.
///
/// Returns a `Network` result whose message starts with
/// `Network request failed: `. Free with `fieldops_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn fieldops_transport_failure(message: *const c_char) -> *mut FfiApiResult {
    catch_unwind(|| {
        let message = unsafe { borrow_str(message) }.unwrap_or("unknown error");
        FfiApiResult::from_error(ApiError::from(TransportError::new(message)))
    })
    .unwrap_or_else(|_| FfiApiResult::panic("panic in fieldops_transport_failure"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by `fieldops_build_request`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fieldops_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.url.is_null() {
            drop(unsafe { CString::from_raw(req.url) });
        }
        if !req.body.is_null() {
            drop(unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(req.body, req.body_len))
            });
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free an `FfiApiResult`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fieldops_free_result(result: *mut FfiApiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.data.is_null() {
            drop(unsafe { CString::from_raw(result.data) });
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fieldops_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
