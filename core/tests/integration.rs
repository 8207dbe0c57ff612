//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `ApiService` with
//! the ureq transport over real HTTP. Validates header injection, payload
//! classification and error normalization with an actual server on the
//! other end.

use std::net::SocketAddr;

use fieldops_core::{
    ApiClient, ApiError, ApiPayload, ApiService, FieldServiceApi, JobStatus, MultipartForm,
    PaymentInput, PaymentMethod, RequestOptions, Session, UreqTransport,
};
use serde_json::json;

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn service(addr: SocketAddr) -> ApiService<UreqTransport> {
    ApiService::new(
        ApiClient::new(&format!("http://{addr}")),
        UreqTransport::new(),
    )
}

fn signed_in(addr: SocketAddr) -> ApiService<UreqTransport> {
    let api = service(addr);
    Session::new(&api)
        .sign_in("dana@example.com", mock_server::DEMO_PASSWORD)
        .unwrap();
    api
}

#[test]
fn health_resolves_to_text() {
    let api = service(start_server());
    assert_eq!(api.get("/health").unwrap(), ApiPayload::Text("ok".to_string()));
    assert_eq!(FieldServiceApi::new(&api).health().unwrap(), "ok");
}

#[test]
fn requests_without_token_are_rejected() {
    let api = service(start_server());
    let err = api.get("/jobs/mine").unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.to_string(), "HTTP error 401: Unauthorized");
    assert_eq!(err.body().and_then(|b| b.message()), Some("Unauthorized"));
    assert!(err.is_auth_rejection());
}

#[test]
fn sign_in_then_list_jobs() {
    let api = signed_in(start_server());
    let jobs = FieldServiceApi::new(&api).my_jobs().unwrap();
    let ids: Vec<u64> = jobs.iter().map(|j| j.id).collect();
    assert_eq!(ids, vec![5, 6]);
}

#[test]
fn missing_job_is_typed_http_error() {
    let api = signed_in(start_server());
    let err = api.get("/jobs/404").unwrap_err();
    match &err {
        ApiError::Http { status, body, .. } => {
            assert_eq!(*status, 404);
            assert_eq!(body.message(), Some("Job not found"));
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[test]
fn per_call_token_overrides_signed_out_client() {
    let addr = start_server();
    let api = signed_in(addr);
    let token = api.client().auth_token().unwrap();
    api.set_auth_token(None);

    assert_eq!(api.get("/jobs/mine").unwrap_err().status(), Some(401));
    let payload = api
        .get_with("/jobs/mine", &RequestOptions::default().with_bearer_token(&token))
        .unwrap();
    assert!(payload.as_json().unwrap().is_array());
}

#[test]
fn job_lifecycle() {
    let api = signed_in(start_server());
    let jobs = FieldServiceApi::new(&api);

    let job = jobs.update_job_status(5, JobStatus::InProgress).unwrap();
    assert_eq!(job.status, JobStatus::InProgress);
    assert_eq!(jobs.job(5).unwrap().status, JobStatus::InProgress);

    let payment = jobs
        .record_payment(
            5,
            &PaymentInput {
                method: PaymentMethod::Cash,
                amount: 1000,
                tip: 200,
            },
        )
        .unwrap();
    assert_eq!(payment.amount, 1000);
    assert_eq!(payment.tip, 200);

    let invoice = jobs.invoice(5).unwrap();
    assert_eq!(invoice.paid, 1000);
    assert_eq!(invoice.balance, invoice.total - 1000);

    jobs.void_payment(5, payment.id).unwrap();
    let err = jobs.void_payment(5, payment.id).unwrap_err();
    assert_eq!(err.status(), Some(404));

    let payouts = jobs.my_payouts().unwrap();
    assert_eq!(payouts.len(), 1);
}

#[test]
fn delete_resolves_to_no_content() {
    let api = signed_in(start_server());
    let payment = api
        .post(
            "/jobs/6/payments",
            json!({"type": "card", "amount": 18000, "tip": 0}),
        )
        .unwrap();
    let id = payment.as_json().unwrap()["id"].as_u64().unwrap();
    let payload = api.delete(&format!("/jobs/6/payments/{id}")).unwrap();
    assert_eq!(payload, ApiPayload::NoContent);
}

#[test]
fn photo_upload_goes_out_as_multipart() {
    let api = signed_in(start_server());
    let receipt = FieldServiceApi::new(&api)
        .upload_photo(5, "meter.jpg", "image/jpeg", vec![0xff, 0xd8, 0xff, 0xe0, 0x00])
        .unwrap();
    assert_eq!(receipt.job_id, 5);
    assert_eq!(receipt.filename, "meter.jpg");
    assert_eq!(receipt.bytes, 5);

    let err = api
        .post("/jobs/5/photos", MultipartForm::new().text("caption", "no file"))
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[test]
fn rejected_body_falls_back_to_text() {
    let api = signed_in(start_server());
    // Axum's own extractor rejection is plain text, not JSON.
    let err = api
        .patch("/jobs/5/status", json!({"status": "teleported"}))
        .unwrap_err();
    assert_eq!(err.status(), Some(422));
    assert!(matches!(
        err.body(),
        Some(fieldops_core::ErrorBody::Text(text)) if !text.is_empty()
    ));
}

#[test]
fn unreachable_server_is_network_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let api = service(addr);
    let err = api.get("/health").unwrap_err();
    assert!(matches!(err, ApiError::Network { .. }));
    assert!(err.to_string().starts_with("Network request failed: "));
}

#[test]
fn sign_out_then_rejection_clears_session() {
    let api = signed_in(start_server());
    let session = Session::new(&api);
    assert!(session.is_signed_in());

    session.restore("revoked-token");
    let err = api.get("/jobs/mine").unwrap_err();
    assert!(session.handle_failure(&err));
    assert!(!session.is_signed_in());
}
