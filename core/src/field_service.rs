//! Typed field-service endpoints: job dispatch, payments, invoices,
//! photo uploads and technician payouts.

use crate::error::ApiError;
use crate::multipart::MultipartForm;
use crate::payload::{ApiPayload, RequestBody};
use crate::service::ApiService;
use crate::transport::Transport;
use crate::types::{
    Invoice, Job, JobStatus, JobStatusUpdate, Payment, PaymentInput, Payout, PhotoReceipt,
};

pub struct FieldServiceApi<'a, T> {
    api: &'a ApiService<T>,
}

impl<'a, T: Transport> FieldServiceApi<'a, T> {
    pub fn new(api: &'a ApiService<T>) -> Self {
        Self { api }
    }

    /// Jobs assigned to the signed-in technician.
    pub fn my_jobs(&self) -> Result<Vec<Job>, ApiError> {
        self.api.get("/jobs/mine")?.decode()
    }

    pub fn job(&self, id: u64) -> Result<Job, ApiError> {
        self.api.get(&format!("/jobs/{id}"))?.decode()
    }

    pub fn update_job_status(&self, id: u64, status: JobStatus) -> Result<Job, ApiError> {
        let body = RequestBody::json(&JobStatusUpdate { status })?;
        self.api.patch(&format!("/jobs/{id}/status"), body)?.decode()
    }

    pub fn record_payment(&self, job_id: u64, input: &PaymentInput) -> Result<Payment, ApiError> {
        let body = RequestBody::json(input)?;
        self.api
            .post(&format!("/jobs/{job_id}/payments"), body)?
            .decode()
    }

    pub fn void_payment(&self, job_id: u64, payment_id: u64) -> Result<(), ApiError> {
        match self
            .api
            .delete(&format!("/jobs/{job_id}/payments/{payment_id}"))?
        {
            ApiPayload::NoContent => Ok(()),
            other => Err(ApiError::Payload(format!(
                "expected no content, got {other:?}"
            ))),
        }
    }

    pub fn invoice(&self, job_id: u64) -> Result<Invoice, ApiError> {
        self.api.get(&format!("/jobs/{job_id}/invoice"))?.decode()
    }

    pub fn upload_photo(
        &self,
        job_id: u64,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<PhotoReceipt, ApiError> {
        let form = MultipartForm::new().file("photo", filename, content_type, data);
        self.api
            .post(&format!("/jobs/{job_id}/photos"), form)?
            .decode()
    }

    pub fn my_payouts(&self) -> Result<Vec<Payout>, ApiError> {
        self.api.get("/payouts/mine")?.decode()
    }

    /// Plain-text liveness probe.
    pub fn health(&self) -> Result<String, ApiError> {
        match self.api.get("/health")? {
            ApiPayload::Text(text) => Ok(text),
            other => Err(ApiError::Payload(format!("expected text, got {other:?}"))),
        }
    }
}
