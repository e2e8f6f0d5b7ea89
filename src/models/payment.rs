// src/models/payment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Stars,
    Ton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Expired,
}

/// A donation record embedded in the user row.
///
/// TON records additionally carry the wallet address, the correlation
/// comment used to bind an on-chain transfer to this record, and a
/// one-hour expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub kind: PaymentKind,
    pub amount: f64,
    pub currency: String,
    pub external_id: String,
    pub payload: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub wallet_address: Option<String>,
    pub comment: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}
