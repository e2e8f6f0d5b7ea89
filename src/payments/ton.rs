// src/payments/ton.rs

//! TON donations.
//!
//! No provider callback exists here: the user transfers to the project
//! wallet with a correlation comment `ALT3R_{user_id}_{ts}_{amount}`, and
//! a verifier polls recent incoming wallet transactions, matching amount
//! (±0.001 TON) and comment substring. Pending records expire after one
//! hour and expired records never match.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::AppError;
use crate::models::{PaymentKind, PaymentRecord, PaymentStatus};
use crate::store::ProfileStore;

pub const MIN_TON: f64 = 0.1;
pub const AMOUNT_TOLERANCE: f64 = 0.001;
pub const PENDING_TTL_HOURS: i64 = 1;

const NANOTON: f64 = 1_000_000_000.0;

/// An incoming transfer observed on the project wallet.
#[derive(Debug, Clone)]
pub struct TonTransfer {
    pub value_ton: f64,
    pub comment: String,
}

/// Read side of the chain. The toncenter client implements it; tests
/// substitute a canned list.
#[async_trait]
pub trait TonGateway: Send + Sync {
    async fn recent_transactions(&self) -> Result<Vec<TonTransfer>, AppError>;
}

pub fn donation_comment(user_id: i64, now: DateTime<Utc>, amount: f64) -> String {
    format!("ALT3R_{}_{}_{}", user_id, now.timestamp(), amount)
}

/// Pending record presented to the user together with the wallet address.
pub fn pending_record(
    amount: f64,
    wallet: &str,
    user_id: i64,
    now: DateTime<Utc>,
) -> PaymentRecord {
    let comment = donation_comment(user_id, now, amount);
    PaymentRecord {
        kind: PaymentKind::Ton,
        amount,
        currency: "TON".to_string(),
        external_id: String::new(),
        payload: comment.clone(),
        status: PaymentStatus::Pending,
        created_at: now,
        completed_at: None,
        wallet_address: Some(wallet.to_string()),
        comment: Some(comment),
        expires_at: Some(now + Duration::hours(PENDING_TTL_HOURS)),
    }
}

/// Whether an observed transfer settles a pending record.
pub fn transfer_matches(record: &PaymentRecord, transfer: &TonTransfer, now: DateTime<Utc>) -> bool {
    if record.status != PaymentStatus::Pending {
        return false;
    }
    if record.expires_at.is_some_and(|at| at < now) {
        return false;
    }
    if (transfer.value_ton - record.amount).abs() >= AMOUNT_TOLERANCE {
        return false;
    }
    match &record.comment {
        Some(comment) => transfer.comment.contains(comment.as_str()),
        None => false,
    }
}

/// One verifier pass: sweep expired records, then settle pending ones
/// against the wallet's recent transactions. Returns the user ids whose
/// donations completed, so the caller can thank them.
pub async fn verify_pending(
    store: &dyn ProfileStore,
    gateway: &dyn TonGateway,
) -> Result<Vec<i64>, AppError> {
    let now = Utc::now();
    let swept = store.expire_stale_payments(now).await?;
    if swept > 0 {
        tracing::info!("expired {} stale TON payment(s)", swept);
    }

    let pending = store.pending_ton_payments().await?;
    if pending.is_empty() {
        return Ok(Vec::new());
    }

    let transfers = gateway.recent_transactions().await?;
    let mut completed = Vec::new();
    for (user_id, record) in pending {
        if let Some(transfer) = transfers
            .iter()
            .find(|t| transfer_matches(&record, t, now))
        {
            let done = store
                .complete_payment(user_id, &record.payload, &transfer.comment, now)
                .await?;
            if done {
                tracing::info!(user_id, amount = record.amount, "TON donation confirmed");
                completed.push(user_id);
            }
        }
    }
    Ok(completed)
}

/// Toncenter HTTP client.
pub struct ToncenterGateway {
    http: reqwest::Client,
    base: &'static str,
    wallet: String,
    api_key: String,
}

impl ToncenterGateway {
    pub fn new(wallet: String, api_key: String, testnet: bool) -> Self {
        let base = if testnet {
            "https://testnet.toncenter.com/api/v2"
        } else {
            "https://toncenter.com/api/v2"
        };
        Self {
            http: reqwest::Client::new(),
            base,
            wallet,
            api_key,
        }
    }
}

#[async_trait]
impl TonGateway for ToncenterGateway {
    async fn recent_transactions(&self) -> Result<Vec<TonTransfer>, AppError> {
        let url = format!("{}/getTransactions", self.base);
        let response: serde_json::Value = self
            .http
            .get(&url)
            .query(&[
                ("address", self.wallet.as_str()),
                ("limit", "50"),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?
            .json()
            .await?;

        let mut out = Vec::new();
        let txs = response["result"].as_array().cloned().unwrap_or_default();
        for tx in txs {
            let in_msg = &tx["in_msg"];
            let value_nano: f64 = in_msg["value"]
                .as_str()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.0);
            if value_nano <= 0.0 {
                continue;
            }
            let comment = in_msg["message"].as_str().unwrap_or_default().to_string();
            out.push(TonTransfer {
                value_ton: value_nano / NANOTON,
                comment,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(amount: f64, user_id: i64, now: DateTime<Utc>) -> PaymentRecord {
        pending_record(amount, "WALLET", user_id, now)
    }

    #[test]
    fn matches_on_amount_and_comment_substring() {
        let now = Utc::now();
        let record = pending(1.0, 42, now);
        let comment = record.comment.clone().unwrap();

        let exact = TonTransfer {
            value_ton: 1.0,
            comment: format!("memo: {}", comment),
        };
        assert!(transfer_matches(&record, &exact, now));

        let close = TonTransfer {
            value_ton: 1.0005,
            comment: comment.clone(),
        };
        assert!(transfer_matches(&record, &close, now));

        let off = TonTransfer {
            value_ton: 1.01,
            comment: comment.clone(),
        };
        assert!(!transfer_matches(&record, &off, now));

        let wrong_comment = TonTransfer {
            value_ton: 1.0,
            comment: "ALT3R_999_0_1".to_string(),
        };
        assert!(!transfer_matches(&record, &wrong_comment, now));
    }

    #[test]
    fn expired_records_never_match() {
        let created = Utc::now() - Duration::hours(2);
        let record = pending(1.0, 42, created);
        let transfer = TonTransfer {
            value_ton: 1.0,
            comment: record.comment.clone().unwrap(),
        };
        assert!(!transfer_matches(&record, &transfer, Utc::now()));
    }

    #[test]
    fn comment_carries_user_and_amount() {
        let now = Utc::now();
        let comment = donation_comment(42, now, 2.5);
        assert!(comment.starts_with("ALT3R_42_"));
        assert!(comment.ends_with("_2.5"));
    }
}
