// src/payments/stars.rs

//! Telegram Stars invoices.
//!
//! The payload `stars_{amount}_{user_id}_{ts}` ties a pre-checkout query
//! and the eventual successful payment back to the pending record.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::error::AppError;
use crate::models::{PaymentKind, PaymentRecord, PaymentStatus};

pub const CURRENCY: &str = "XTR";
pub const MIN_STARS: i64 = 10;

static PAYLOAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^stars_(\d+)_(\d+)_(\d+)$").expect("stars payload regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarsPayload {
    pub amount: i64,
    pub user_id: i64,
    pub ts: i64,
}

pub fn invoice_payload(amount: i64, user_id: i64, now: DateTime<Utc>) -> String {
    format!("stars_{}_{}_{}", amount, user_id, now.timestamp())
}

pub fn parse_payload(payload: &str) -> Result<StarsPayload, AppError> {
    let caps = PAYLOAD_RE
        .captures(payload)
        .ok_or_else(|| AppError::Payment(format!("malformed stars payload: {}", payload)))?;
    let parse = |i: usize| -> Result<i64, AppError> {
        caps[i]
            .parse()
            .map_err(|_| AppError::Payment(format!("malformed stars payload: {}", payload)))
    };
    Ok(StarsPayload {
        amount: parse(1)?,
        user_id: parse(2)?,
        ts: parse(3)?,
    })
}

/// Pre-checkout gate: payload shape, currency and minimum amount.
pub fn validate_pre_checkout(
    currency: &str,
    total_amount: i64,
    payload: &str,
) -> Result<StarsPayload, AppError> {
    if currency != CURRENCY {
        return Err(AppError::Payment(format!(
            "unexpected currency {}, want {}",
            currency, CURRENCY
        )));
    }
    let parsed = parse_payload(payload)?;
    if parsed.amount < MIN_STARS {
        return Err(AppError::Payment(format!(
            "stars amount {} below minimum {}",
            parsed.amount, MIN_STARS
        )));
    }
    if parsed.amount != total_amount {
        return Err(AppError::Payment(format!(
            "amount mismatch: payload {}, invoice {}",
            parsed.amount, total_amount
        )));
    }
    Ok(parsed)
}

/// Pending record created alongside the invoice.
pub fn pending_record(amount: i64, payload: String, now: DateTime<Utc>) -> PaymentRecord {
    PaymentRecord {
        kind: PaymentKind::Stars,
        amount: amount as f64,
        currency: CURRENCY.to_string(),
        external_id: String::new(),
        payload,
        status: PaymentStatus::Pending,
        created_at: now,
        completed_at: None,
        wallet_address: None,
        comment: None,
        expires_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips() {
        let now = Utc::now();
        let payload = invoice_payload(100, 42, now);
        let parsed = parse_payload(&payload).unwrap();
        assert_eq!(parsed.amount, 100);
        assert_eq!(parsed.user_id, 42);
        assert_eq!(parsed.ts, now.timestamp());
    }

    #[test]
    fn pre_checkout_rejects_bad_currency_and_low_amounts() {
        let payload = invoice_payload(100, 42, Utc::now());
        assert!(validate_pre_checkout("XTR", 100, &payload).is_ok());
        assert!(validate_pre_checkout("USD", 100, &payload).is_err());

        let low = invoice_payload(5, 42, Utc::now());
        assert!(validate_pre_checkout("XTR", 5, &low).is_err());
        assert!(validate_pre_checkout("XTR", 999, &payload).is_err());
        assert!(validate_pre_checkout("XTR", 100, "donation_100").is_err());
    }
}
