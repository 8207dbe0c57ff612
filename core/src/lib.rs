//! API client core for the field-service backend.
//!
//! # Overview
//! `ApiClient` builds `HttpRequest` values and classifies `HttpResponse`
//! values without touching the network (host-does-IO pattern). `ApiService`
//! pairs it with a `Transport` for callers that want one blocking call per
//! request; the FFI crate exposes the sans-IO half to mobile hosts that do
//! their own networking.
//!
//! # Design
//! - Every request gets `accept: application/json`, a JSON content type when
//!   the body is JSON, and `authorization: Bearer <token>` when a token is set.
//! - Success payloads are a tagged `ApiPayload` (`Json`, `Text`, `NoContent`).
//! - Failures are `ApiError::Http` (the server answered with a non-2xx
//!   status) or `ApiError::Network` (no usable response).
//! - `Session` and `FieldServiceApi` are thin typed layers over the generic
//!   verbs.

pub mod client;
pub mod config;
pub mod error;
pub mod field_service;
pub mod http;
pub mod multipart;
pub mod payload;
pub mod service;
pub mod session;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use config::ApiConfig;
pub use error::{ApiError, ErrorBody};
pub use field_service::FieldServiceApi;
pub use http::{HttpBody, HttpMethod, HttpRequest, HttpResponse, WireRequest};
pub use multipart::MultipartForm;
pub use payload::{ApiPayload, RequestBody, RequestOptions};
pub use service::ApiService;
pub use session::Session;
#[cfg(feature = "ureq-transport")]
pub use transport::UreqTransport;
pub use transport::{Transport, TransportError};
pub use types::{
    Invoice, InvoiceLine, Job, JobStatus, LoginResponse, Payment, PaymentInput, PaymentMethod,
    Payout, PhotoReceipt, Technician,
};
