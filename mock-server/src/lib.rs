use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Password accepted for every seeded technician.
pub const DEMO_PASSWORD: &str = "secret";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Scheduled,
    EnRoute,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,
    pub technician_id: u64,
    pub customer_name: String,
    pub address: String,
    pub description: String,
    pub status: JobStatus,
    pub quoted_amount: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Technician {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Payment {
    pub id: u64,
    pub job_id: u64,
    #[serde(rename = "type")]
    pub method: String,
    pub amount: i64,
    pub tip: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Payout {
    pub id: u64,
    pub technician_id: u64,
    pub amount: i64,
    pub tips: i64,
    pub period: String,
}

#[derive(Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: JobStatus,
}

#[derive(Deserialize)]
pub struct NewPayment {
    #[serde(rename = "type")]
    pub method: String,
    pub amount: i64,
    #[serde(default)]
    pub tip: i64,
}

#[derive(Default)]
pub struct Backend {
    technicians: Vec<Technician>,
    sessions: HashMap<String, u64>,
    jobs: HashMap<u64, Job>,
    payments: HashMap<u64, Payment>,
    payouts: Vec<Payout>,
    next_payment_id: u64,
}

impl Backend {
    /// Two technicians, a handful of jobs and one settled payout period.
    pub fn seeded() -> Self {
        let technicians = vec![
            Technician {
                id: 7,
                name: "Dana Reyes".to_string(),
                email: "dana@example.com".to_string(),
            },
            Technician {
                id: 8,
                name: "Sam Okafor".to_string(),
                email: "sam@example.com".to_string(),
            },
        ];
        let job = |id, technician_id, customer: &str, address: &str, description: &str, quoted| Job {
            id,
            technician_id,
            customer_name: customer.to_string(),
            address: address.to_string(),
            description: description.to_string(),
            status: JobStatus::Scheduled,
            quoted_amount: quoted,
        };
        let jobs = [
            job(5, 7, "Ines Park", "12 Alder St", "Replace water heater", 85_000),
            job(6, 7, "Marco Diaz", "4 Birch Ln", "Annual HVAC service", 18_000),
            job(9, 8, "Lee Chen", "77 Cedar Ave", "Rewire garage outlet", 32_000),
        ]
        .into_iter()
        .map(|j| (j.id, j))
        .collect();
        let payouts = vec![Payout {
            id: 1,
            technician_id: 7,
            amount: 120_000,
            tips: 4_500,
            period: "2026-09".to_string(),
        }];
        Self {
            technicians,
            jobs,
            payouts,
            next_payment_id: 1,
            ..Self::default()
        }
    }
}

pub type Db = Arc<RwLock<Backend>>;

/// JSON error body in the `{"message": ...}` shape the app expects.
pub struct Failure(StatusCode, &'static str);

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "message": self.1 }))).into_response()
    }
}

const UNAUTHORIZED: Failure = Failure(StatusCode::UNAUTHORIZED, "Unauthorized");
const JOB_NOT_FOUND: Failure = Failure(StatusCode::NOT_FOUND, "Job not found");

pub fn app() -> Router {
    app_with(Backend::seeded())
}

pub fn app_with(backend: Backend) -> Router {
    let db: Db = Arc::new(RwLock::new(backend));
    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/jobs/mine", get(my_jobs))
        .route("/jobs/{id}", get(get_job))
        .route("/jobs/{id}/status", patch(update_status))
        .route("/jobs/{id}/payments", post(create_payment))
        .route("/jobs/{id}/payments/{payment_id}", delete(void_payment))
        .route("/jobs/{id}/invoice", get(invoice))
        .route("/jobs/{id}/photos", post(upload_photo))
        .route("/payouts/mine", get(my_payouts))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Technician id behind the request's bearer token.
fn authorize(backend: &Backend, headers: &HeaderMap) -> Result<u64, Failure> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| backend.sessions.get(token).copied())
        .ok_or(UNAUTHORIZED)
}

/// The job, if it exists and belongs to `technician_id`.
fn owned_job(backend: &Backend, technician_id: u64, id: u64) -> Result<&Job, Failure> {
    backend
        .jobs
        .get(&id)
        .filter(|job| job.technician_id == technician_id)
        .ok_or(JOB_NOT_FOUND)
}

async fn health() -> &'static str {
    "ok"
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<Login>,
) -> Result<Json<serde_json::Value>, Failure> {
    let mut backend = db.write().await;
    let technician = backend
        .technicians
        .iter()
        .find(|t| t.email == input.email)
        .filter(|_| input.password == DEMO_PASSWORD)
        .cloned()
        .ok_or(Failure(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;
    let token = Uuid::new_v4().to_string();
    backend.sessions.insert(token.clone(), technician.id);
    info!("technician {} signed in", technician.id);
    Ok(Json(json!({ "token": token, "technician": technician })))
}

async fn my_jobs(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<Job>>, Failure> {
    let backend = db.read().await;
    let technician_id = authorize(&backend, &headers)?;
    let mut jobs: Vec<Job> = backend
        .jobs
        .values()
        .filter(|job| job.technician_id == technician_id)
        .cloned()
        .collect();
    jobs.sort_by_key(|job| job.id);
    Ok(Json(jobs))
}

async fn get_job(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Job>, Failure> {
    let backend = db.read().await;
    let technician_id = authorize(&backend, &headers)?;
    owned_job(&backend, technician_id, id).cloned().map(Json)
}

async fn update_status(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<StatusUpdate>,
) -> Result<Json<Job>, Failure> {
    let mut backend = db.write().await;
    let technician_id = authorize(&backend, &headers)?;
    owned_job(&backend, technician_id, id)?;
    let job = backend.jobs.get_mut(&id).ok_or(JOB_NOT_FOUND)?;
    job.status = input.status;
    debug!("job {id} -> {:?}", input.status);
    Ok(Json(job.clone()))
}

async fn create_payment(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<NewPayment>,
) -> Result<(StatusCode, Json<Payment>), Failure> {
    let mut backend = db.write().await;
    let technician_id = authorize(&backend, &headers)?;
    owned_job(&backend, technician_id, id)?;
    if input.amount <= 0 || input.tip < 0 {
        return Err(Failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Amount must be positive",
        ));
    }
    let payment = Payment {
        id: backend.next_payment_id,
        job_id: id,
        method: input.method,
        amount: input.amount,
        tip: input.tip,
    };
    backend.next_payment_id += 1;
    backend.payments.insert(payment.id, payment.clone());
    Ok((StatusCode::CREATED, Json(payment)))
}

async fn void_payment(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((id, payment_id)): Path<(u64, u64)>,
) -> Result<StatusCode, Failure> {
    let mut backend = db.write().await;
    let technician_id = authorize(&backend, &headers)?;
    owned_job(&backend, technician_id, id)?;
    match backend.payments.get(&payment_id) {
        Some(payment) if payment.job_id == id => {
            backend.payments.remove(&payment_id);
            Ok(StatusCode::NO_CONTENT)
        }
        _ => Err(Failure(StatusCode::NOT_FOUND, "Payment not found")),
    }
}

async fn invoice(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, Failure> {
    let backend = db.read().await;
    let technician_id = authorize(&backend, &headers)?;
    let job = owned_job(&backend, technician_id, id)?;
    let paid: i64 = backend
        .payments
        .values()
        .filter(|p| p.job_id == id)
        .map(|p| p.amount)
        .sum();
    Ok(Json(json!({
        "job_id": id,
        "lines": [{ "description": job.description, "amount": job.quoted_amount }],
        "total": job.quoted_amount,
        "paid": paid,
        "balance": job.quoted_amount - paid,
    })))
}

async fn upload_photo(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>), Failure> {
    let backend = db.read().await;
    let technician_id = authorize(&backend, &headers)?;
    owned_job(&backend, technician_id, id)?;
    drop(backend);

    while let Some(field) = multipart.next_field().await.map_err(|_| malformed())? {
        if field.name() != Some("photo") {
            continue;
        }
        let filename = field.file_name().unwrap_or("photo").to_string();
        let bytes = field.bytes().await.map_err(|_| malformed())?;
        debug!("job {id}: stored {filename} ({} bytes)", bytes.len());
        return Ok((
            StatusCode::CREATED,
            Json(json!({ "job_id": id, "filename": filename, "bytes": bytes.len() })),
        ));
    }
    Err(Failure(StatusCode::BAD_REQUEST, "Expected a photo field"))
}

fn malformed() -> Failure {
    Failure(StatusCode::BAD_REQUEST, "Malformed multipart body")
}

async fn my_payouts(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<Payout>>, Failure> {
    let backend = db.read().await;
    let technician_id = authorize(&backend, &headers)?;
    Ok(Json(
        backend
            .payouts
            .iter()
            .filter(|p| p.technician_id == technician_id)
            .cloned()
            .collect(),
    ))
}
