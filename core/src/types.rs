//! Domain DTOs for the field-service API.
//!
//! # Design
//! These mirror the mock-server's schema but are defined independently so
//! the client does not depend on Axum. Integration tests catch drift between
//! the two. Money is integer cents throughout.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Scheduled,
    EnRoute,
    InProgress,
    Completed,
    Cancelled,
}

/// A dispatched job as seen by the assigned technician.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Job {
    pub id: u64,
    pub customer_name: String,
    pub address: String,
    pub description: String,
    pub status: JobStatus,
    pub quoted_amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobStatusUpdate {
    pub status: JobStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Check,
}

/// Payment collected on site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentInput {
    #[serde(rename = "type")]
    pub method: PaymentMethod,
    pub amount: i64,
    #[serde(default)]
    pub tip: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payment {
    pub id: u64,
    pub job_id: u64,
    #[serde(rename = "type")]
    pub method: PaymentMethod,
    pub amount: i64,
    pub tip: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvoiceLine {
    pub description: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Invoice {
    pub job_id: u64,
    pub lines: Vec<InvoiceLine>,
    pub total: i64,
    pub paid: i64,
    pub balance: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payout {
    pub id: u64,
    pub amount: i64,
    pub tips: i64,
    pub period: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhotoReceipt {
    pub job_id: u64,
    pub filename: String,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Technician {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub token: String,
    pub technician: Technician,
}
