// src/telegram.rs

//! Thin Bot API adapter.
//!
//! Long-polls `getUpdates` and translates updates into [`Event`]s; the
//! [`Transport`] impl covers the outbound surface the core needs. The core
//! itself never sees Bot API JSON.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::time::timeout;

use crate::error::AppError;
use crate::models::MediaType;
use crate::transport::{Event, EventKind, Keyboard, Transport};

/// Bounded outbound send; failures are non-fatal to callers.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);
/// Long-poll hold, seconds.
const POLL_TIMEOUT_SECS: u64 = 30;

pub struct TelegramApi {
    http: reqwest::Client,
    base: String,
}

impl TelegramApi {
    pub fn new(token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: format!("https://api.telegram.org/bot{}", token),
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, AppError> {
        let url = format!("{}/{}", self.base, method);
        let send = self.http.post(&url).json(&params).send();
        let response = timeout(SEND_TIMEOUT, send)
            .await
            .map_err(|_| AppError::Transport(format!("{} timed out", method)))??;
        let body: Value = response.json().await?;
        if body["ok"].as_bool() != Some(true) {
            return Err(AppError::Transport(format!(
                "{} failed: {}",
                method,
                body["description"].as_str().unwrap_or("unknown")
            )));
        }
        Ok(body["result"].clone())
    }

    /// One long-poll iteration. Advances `offset` past every update seen,
    /// including ones that do not translate to an [`Event`].
    pub async fn poll_updates(&self, offset: &mut i64) -> Result<Vec<Event>, AppError> {
        let url = format!("{}/getUpdates", self.base);
        let params = json!({
            "offset": *offset,
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["message", "callback_query", "pre_checkout_query"],
        });
        let send = self
            .http
            .post(&url)
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .json(&params)
            .send();
        let response = send.await?;
        let body: Value = response.json().await?;
        if body["ok"].as_bool() != Some(true) {
            return Err(AppError::Transport("getUpdates failed".to_string()));
        }

        let mut events = Vec::new();
        for update in body["result"].as_array().cloned().unwrap_or_default() {
            if let Some(update_id) = update["update_id"].as_i64() {
                *offset = (*offset).max(update_id + 1);
            }
            match translate_update(&update) {
                Some(event) => {
                    // Stop the client-side spinner on callbacks.
                    if let Some(id) = update["callback_query"]["id"].as_str() {
                        let _ = self
                            .call("answerCallbackQuery", json!({ "callback_query_id": id }))
                            .await;
                    }
                    events.push(event);
                }
                None => {
                    tracing::debug!("dropping untranslatable update");
                }
            }
        }
        Ok(events)
    }
}

fn sender(value: &Value) -> Option<(i64, Option<String>, Option<String>)> {
    let from = &value["from"];
    let user_id = from["id"].as_i64()?;
    Some((
        user_id,
        from["username"].as_str().map(str::to_string),
        from["first_name"].as_str().map(str::to_string),
    ))
}

fn translate_update(update: &Value) -> Option<Event> {
    if let Some(message) = update.get("message").filter(|m| !m.is_null()) {
        let (user_id, username, first_name) = sender(message)?;
        let chat_id = message["chat"]["id"].as_i64().unwrap_or(user_id);
        let kind = translate_message(message)?;
        return Some(Event {
            user_id,
            chat_id,
            username,
            first_name,
            kind,
        });
    }

    if let Some(cb) = update.get("callback_query").filter(|c| !c.is_null()) {
        let (user_id, username, first_name) = sender(cb)?;
        let chat_id = cb["message"]["chat"]["id"].as_i64().unwrap_or(user_id);
        let data = cb["data"].as_str()?.to_string();
        return Some(Event {
            user_id,
            chat_id,
            username,
            first_name,
            kind: EventKind::Callback(data),
        });
    }

    if let Some(pcq) = update.get("pre_checkout_query").filter(|c| !c.is_null()) {
        let (user_id, username, first_name) = sender(pcq)?;
        return Some(Event {
            user_id,
            chat_id: user_id,
            username,
            first_name,
            kind: EventKind::PreCheckout {
                query_id: pcq["id"].as_str()?.to_string(),
                currency: pcq["currency"].as_str().unwrap_or_default().to_string(),
                total_amount: pcq["total_amount"].as_i64().unwrap_or(0),
                payload: pcq["invoice_payload"].as_str().unwrap_or_default().to_string(),
            },
        });
    }

    None
}

fn translate_message(message: &Value) -> Option<EventKind> {
    if let Some(payment) = message.get("successful_payment").filter(|p| !p.is_null()) {
        return Some(EventKind::SuccessfulPayment {
            currency: payment["currency"].as_str().unwrap_or_default().to_string(),
            total_amount: payment["total_amount"].as_i64().unwrap_or(0),
            payload: payment["invoice_payload"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            charge_id: payment["telegram_payment_charge_id"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
        });
    }

    if let Some(location) = message.get("location").filter(|l| !l.is_null()) {
        return Some(EventKind::Location {
            latitude: location["latitude"].as_f64()?,
            longitude: location["longitude"].as_f64()?,
        });
    }

    if let Some(photos) = message["photo"].as_array().filter(|p| !p.is_empty()) {
        // Sizes come smallest-first; keep the largest.
        let file_id = photos.last()?["file_id"].as_str()?.to_string();
        return Some(EventKind::Photo(file_id));
    }

    if let Some(video) = message.get("video").filter(|v| !v.is_null()) {
        return Some(EventKind::Video(video["file_id"].as_str()?.to_string()));
    }

    if let Some(text) = message["text"].as_str() {
        if let Some(command) = text.strip_prefix('/') {
            let name = command.split_whitespace().next().unwrap_or_default();
            return Some(EventKind::Command(format!("/{}", name)));
        }
        return Some(EventKind::Text(text.to_string()));
    }

    None
}

fn reply_markup(keyboard: &Keyboard) -> Value {
    if keyboard.inline {
        let rows: Vec<Vec<Value>> = keyboard
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| {
                        json!({
                            "text": b.text,
                            "callback_data": b.data.clone().unwrap_or_default(),
                        })
                    })
                    .collect()
            })
            .collect();
        json!({ "inline_keyboard": rows })
    } else {
        let rows: Vec<Vec<Value>> = keyboard
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| json!({ "text": b.text, "request_location": b.request_location }))
                    .collect()
            })
            .collect();
        json!({
            "keyboard": rows,
            "resize_keyboard": true,
            "one_time_keyboard": true,
        })
    }
}

#[async_trait]
impl Transport for TelegramApi {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), AppError> {
        let mut params = json!({ "chat_id": chat_id, "text": text });
        if let Some(kb) = &keyboard {
            params["reply_markup"] = reply_markup(kb);
        }
        self.call("sendMessage", params).await?;
        Ok(())
    }

    async fn send_media(
        &self,
        chat_id: i64,
        media_type: MediaType,
        media_id: &str,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), AppError> {
        let (method, field) = match media_type {
            MediaType::Photo => ("sendPhoto", "photo"),
            MediaType::Video => ("sendVideo", "video"),
        };
        let mut params = json!({
            "chat_id": chat_id,
            field: media_id,
            "caption": caption,
        });
        if let Some(kb) = &keyboard {
            params["reply_markup"] = reply_markup(kb);
        }
        self.call(method, params).await?;
        Ok(())
    }

    async fn send_invoice(
        &self,
        chat_id: i64,
        title: &str,
        description: &str,
        payload: &str,
        currency: &str,
        amount: i64,
    ) -> Result<(), AppError> {
        let params = json!({
            "chat_id": chat_id,
            "title": title,
            "description": description,
            "payload": payload,
            "currency": currency,
            "prices": [{ "label": title, "amount": amount }],
        });
        self.call("sendInvoice", params).await?;
        Ok(())
    }

    async fn answer_pre_checkout(
        &self,
        query_id: &str,
        ok: bool,
        error_message: Option<&str>,
    ) -> Result<(), AppError> {
        let mut params = json!({ "pre_checkout_query_id": query_id, "ok": ok });
        if let Some(message) = error_message {
            params["error_message"] = json!(message);
        }
        self.call("answerPreCheckoutQuery", params).await?;
        Ok(())
    }
}
