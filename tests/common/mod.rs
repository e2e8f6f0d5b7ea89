// tests/common/mod.rs

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use alt3r::config::Config;
use alt3r::error::AppError;
use alt3r::handlers;
use alt3r::models::{MediaType, User};
use alt3r::session::Sessions;
use alt3r::state::AppState;
use alt3r::store::{MemoryStore, ProfileStore};
use alt3r::transport::{Event, EventKind, Keyboard, Transport};
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct Sent {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

#[derive(Debug, Clone)]
pub struct SentInvoice {
    pub chat_id: i64,
    pub payload: String,
    pub currency: String,
    pub amount: i64,
}

/// In-memory transport that records everything it is asked to send.
/// Chats added to `failing_chats` refuse delivery, for testing the
/// at-least-once notification path.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<Sent>>,
    pub invoices: Mutex<Vec<SentInvoice>>,
    pub pre_checkout_answers: Mutex<Vec<(String, bool)>>,
    pub failing_chats: Mutex<HashSet<i64>>,
}

impl RecordingTransport {
    pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.chat_id == chat_id)
            .map(|s| s.text.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
        self.invoices.lock().unwrap().clear();
        self.pre_checkout_answers.lock().unwrap().clear();
    }

    pub fn fail_chat(&self, chat_id: i64) {
        self.failing_chats.lock().unwrap().insert(chat_id);
    }

    pub fn unfail_chat(&self, chat_id: i64) {
        self.failing_chats.lock().unwrap().remove(&chat_id);
    }

    fn deliver(&self, chat_id: i64, text: &str, keyboard: Option<Keyboard>) -> Result<(), AppError> {
        if self.failing_chats.lock().unwrap().contains(&chat_id) {
            return Err(AppError::Transport(format!("chat {} unreachable", chat_id)));
        }
        self.sent.lock().unwrap().push(Sent {
            chat_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), AppError> {
        self.deliver(chat_id, text, keyboard)
    }

    async fn send_media(
        &self,
        chat_id: i64,
        _media_type: MediaType,
        _media_id: &str,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), AppError> {
        self.deliver(chat_id, caption, keyboard)
    }

    async fn send_invoice(
        &self,
        chat_id: i64,
        _title: &str,
        _description: &str,
        payload: &str,
        currency: &str,
        amount: i64,
    ) -> Result<(), AppError> {
        self.invoices.lock().unwrap().push(SentInvoice {
            chat_id,
            payload: payload.to_string(),
            currency: currency.to_string(),
            amount,
        });
        Ok(())
    }

    async fn answer_pre_checkout(
        &self,
        query_id: &str,
        ok: bool,
        _error_message: Option<&str>,
    ) -> Result<(), AppError> {
        self.pre_checkout_answers
            .lock()
            .unwrap()
            .push((query_id.to_string(), ok));
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        telegram_bot_token: "test-token".to_string(),
        database_url: "postgres://unused".to_string(),
        ton_wallet: "UQTestWallet".to_string(),
        ton_api_key: String::new(),
        ton_testnet: true,
        rust_log: "error".to_string(),
        port: 0,
    }
}

pub fn test_state() -> (AppState, Arc<MemoryStore>, Arc<RecordingTransport>) {
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(RecordingTransport::default());
    let state = AppState {
        store: store.clone(),
        transport: transport.clone(),
        sessions: Sessions::new(),
        config: test_config(),
    };
    (state, store, transport)
}

pub fn event(user_id: i64, kind: EventKind) -> Event {
    Event {
        user_id,
        chat_id: user_id,
        username: Some(format!("user{}", user_id)),
        first_name: Some(format!("User{}", user_id)),
        kind,
    }
}

pub async fn send(state: &AppState, user_id: i64, kind: EventKind) {
    handlers::handle_event(state, event(user_id, kind))
        .await
        .unwrap();
}

/// Like [`send`], but tolerates delivery failures. For scenarios where the
/// recipient's chat is deliberately unreachable.
pub async fn send_lossy(state: &AppState, user_id: i64, kind: EventKind) {
    let _ = handlers::handle_event(state, event(user_id, kind)).await;
}

/// Walks a user through the whole guided registration. Button labels are
/// the Russian reply-keyboard captions.
pub async fn register(
    state: &AppState,
    user_id: i64,
    gender_label: &str,
    interest_label: &str,
    city: &str,
) -> User {
    send(state, user_id, EventKind::Command("/start".to_string())).await;
    send(state, user_id, EventKind::Callback("lang_ru".to_string())).await;
    send(state, user_id, EventKind::Text("25".to_string())).await;
    send(state, user_id, EventKind::Text(gender_label.to_string())).await;
    send(state, user_id, EventKind::Text(interest_label.to_string())).await;
    send(state, user_id, EventKind::Text(city.to_string())).await;
    send(state, user_id, EventKind::Text(format!("Имя{}", user_id))).await;
    send(state, user_id, EventKind::Text("немного о себе".to_string())).await;
    send(state, user_id, EventKind::Photo(format!("photo_{}", user_id))).await;
    send(state, user_id, EventKind::Text("Готово".to_string())).await;
    send(state, user_id, EventKind::Callback("confirm_yes".to_string())).await;

    state.store.get(user_id).await.unwrap().unwrap()
}
