// src/transport.rs

//! Platform-agnostic event and outbound-message surface.
//!
//! The core never talks to the messaging platform directly; a thin adapter
//! (see `telegram.rs`) translates platform updates into [`Event`]s and
//! implements [`Transport`] for outbound traffic.

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::MediaType;

/// An inbound platform event, already attributed to a user and chat.
#[derive(Debug, Clone)]
pub struct Event {
    pub user_id: i64,
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub kind: EventKind,
}

#[derive(Debug, Clone)]
pub enum EventKind {
    /// `/start`, `/help`, `/language`.
    Command(String),
    Text(String),
    /// Opaque media handle of the largest photo size.
    Photo(String),
    Video(String),
    Location { latitude: f64, longitude: f64 },
    /// Inline-keyboard callback token.
    Callback(String),
    PreCheckout {
        query_id: String,
        currency: String,
        total_amount: i64,
        payload: String,
    },
    SuccessfulPayment {
        currency: String,
        total_amount: i64,
        payload: String,
        charge_id: String,
    },
}

#[derive(Debug, Clone)]
pub struct Button {
    pub text: String,
    /// Callback token for inline keyboards.
    pub data: Option<String>,
    /// Reply-keyboard button requesting the user's geolocation.
    pub request_location: bool,
}

impl Button {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: Some(data.into()),
            request_location: false,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: None,
            request_location: false,
        }
    }

    pub fn location(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: None,
            request_location: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Keyboard {
    /// Inline keyboards carry callback tokens; reply keyboards carry the
    /// button text back as a plain message.
    pub inline: bool,
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn inline(rows: Vec<Vec<Button>>) -> Self {
        Self { inline: true, rows }
    }

    pub fn reply(rows: Vec<Vec<Button>>) -> Self {
        Self {
            inline: false,
            rows,
        }
    }
}

/// Outbound channel to the messaging platform. Sends have a bounded
/// timeout; failures are non-fatal for the caller's state machine.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), AppError>;

    async fn send_media(
        &self,
        chat_id: i64,
        media_type: MediaType,
        media_id: &str,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), AppError>;

    async fn send_invoice(
        &self,
        chat_id: i64,
        title: &str,
        description: &str,
        payload: &str,
        currency: &str,
        amount: i64,
    ) -> Result<(), AppError>;

    async fn answer_pre_checkout(
        &self,
        query_id: &str,
        ok: bool,
        error_message: Option<&str>,
    ) -> Result<(), AppError>;
}
