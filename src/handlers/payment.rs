// src/handlers/payment.rs

//! Donation flow: Stars invoices and TON transfer requests.

use chrono::Utc;

use crate::error::AppError;
use crate::handlers::menu;
use crate::i18n::tr;
use crate::models::{PaymentKind, User};
use crate::payments::{stars, ton};
use crate::session::SessionState;
use crate::state::AppState;
use crate::transport::{Button, EventKind, Keyboard};

const STARS_PRESETS: [i64; 3] = [50, 100, 500];
const TON_PRESETS: [&str; 3] = ["0.5", "1", "5"];

pub async fn open_donate(state: &AppState, user: &User) -> Result<(), AppError> {
    let lang = user.language;
    let keyboard = Keyboard::inline(vec![vec![
        Button::callback(tr(lang, "btn_pay_stars"), "payment_method_stars"),
        Button::callback(tr(lang, "btn_pay_ton"), "payment_method_ton"),
    ]]);
    state
        .transport
        .send_message(user.user_id, tr(lang, "donate_intro"), Some(keyboard))
        .await
}

pub async fn on_method_chosen(
    state: &AppState,
    user: &User,
    token: &str,
) -> Result<(), AppError> {
    let lang = user.language;
    match token {
        "payment_method_stars" => {
            let mut row: Vec<Button> = STARS_PRESETS
                .iter()
                .map(|n| Button::callback(format!("{} ⭐", n), format!("stars_{}", n)))
                .collect();
            row.push(Button::callback(tr(lang, "btn_custom_amount"), "stars_custom"));
            state
                .transport
                .send_message(
                    user.user_id,
                    tr(lang, "choose_stars_amount"),
                    Some(Keyboard::inline(vec![row])),
                )
                .await
        }
        "payment_method_ton" => {
            let mut row: Vec<Button> = TON_PRESETS
                .iter()
                .map(|n| Button::callback(format!("{} TON", n), format!("ton_{}", n)))
                .collect();
            row.push(Button::callback(tr(lang, "btn_custom_amount"), "ton_custom"));
            state
                .transport
                .send_message(
                    user.user_id,
                    tr(lang, "choose_ton_amount"),
                    Some(Keyboard::inline(vec![row])),
                )
                .await
        }
        other => Err(AppError::Protocol(format!(
            "unknown payment method {}",
            other
        ))),
    }
}

/// `stars_50`, `ton_0.5`, or the `_custom` variants that open a free-form
/// amount prompt.
pub async fn on_amount_token(state: &AppState, user: &User, token: &str) -> Result<(), AppError> {
    let lang = user.language;
    if token == "stars_custom" {
        state
            .sessions
            .set(
                user.user_id,
                SessionState::AwaitingCustomAmount(PaymentKind::Stars),
            )
            .await;
        return state
            .transport
            .send_message(user.user_id, tr(lang, "stars_custom_prompt"), None)
            .await;
    }
    if token == "ton_custom" {
        state
            .sessions
            .set(
                user.user_id,
                SessionState::AwaitingCustomAmount(PaymentKind::Ton),
            )
            .await;
        return state
            .transport
            .send_message(user.user_id, tr(lang, "ton_custom_prompt"), None)
            .await;
    }
    if let Some(amount) = token.strip_prefix("stars_").and_then(|v| v.parse().ok()) {
        return send_stars_invoice(state, user, amount).await;
    }
    if let Some(amount) = token.strip_prefix("ton_").and_then(|v| v.parse().ok()) {
        return send_ton_request(state, user, amount).await;
    }
    Err(AppError::Protocol(format!("unknown amount token {}", token)))
}

pub async fn on_custom_amount(
    state: &AppState,
    user: &User,
    kind: PaymentKind,
    event: &EventKind,
) -> Result<(), AppError> {
    let lang = user.language;
    let EventKind::Text(text) = event else {
        return state
            .transport
            .send_message(user.user_id, tr(lang, "invalid_amount"), None)
            .await;
    };
    let text = text.trim().replace(',', ".");
    match kind {
        PaymentKind::Stars => match text.parse::<i64>() {
            Ok(amount) if amount >= stars::MIN_STARS => {
                state.sessions.clear(user.user_id).await;
                send_stars_invoice(state, user, amount).await
            }
            _ => {
                state
                    .transport
                    .send_message(user.user_id, tr(lang, "invalid_amount"), None)
                    .await
            }
        },
        PaymentKind::Ton => match text.parse::<f64>() {
            Ok(amount) if amount >= ton::MIN_TON => {
                state.sessions.clear(user.user_id).await;
                send_ton_request(state, user, amount).await
            }
            _ => {
                state
                    .transport
                    .send_message(user.user_id, tr(lang, "invalid_amount"), None)
                    .await
            }
        },
    }
}

async fn send_stars_invoice(state: &AppState, user: &User, amount: i64) -> Result<(), AppError> {
    let lang = user.language;
    if amount < stars::MIN_STARS {
        return state
            .transport
            .send_message(user.user_id, tr(lang, "invalid_amount"), None)
            .await;
    }
    let now = Utc::now();
    let payload = stars::invoice_payload(amount, user.user_id, now);
    state
        .store
        .add_payment(user.user_id, stars::pending_record(amount, payload.clone(), now))
        .await?;
    state
        .transport
        .send_invoice(
            user.user_id,
            tr(lang, "invoice_title"),
            tr(lang, "invoice_description"),
            &payload,
            stars::CURRENCY,
            amount,
        )
        .await
}

async fn send_ton_request(state: &AppState, user: &User, amount: f64) -> Result<(), AppError> {
    let lang = user.language;
    if amount < ton::MIN_TON {
        return state
            .transport
            .send_message(user.user_id, tr(lang, "invalid_amount"), None)
            .await;
    }
    if state.config.ton_wallet.is_empty() {
        tracing::warn!("TON donation requested but TON_WALLET is not configured");
        return state
            .transport
            .send_message(user.user_id, tr(lang, "payment_failed"), None)
            .await;
    }
    let record = ton::pending_record(amount, &state.config.ton_wallet, user.user_id, Utc::now());
    let text = format!(
        "{}\n\n{} TON\n{}\n\n{}",
        tr(lang, "ton_instructions"),
        record.amount,
        state.config.ton_wallet,
        record.comment.as_deref().unwrap_or_default(),
    );
    state.store.add_payment(user.user_id, record).await?;
    state
        .transport
        .send_message(user.user_id, &text, None)
        .await
}

/// Pre-checkout must be answered within 10 seconds or the payment fails on
/// the client; validation is pure and fast.
pub async fn on_pre_checkout(
    state: &AppState,
    user: &User,
    query_id: &str,
    currency: &str,
    total_amount: i64,
    payload: &str,
) -> Result<(), AppError> {
    match stars::validate_pre_checkout(currency, total_amount, payload) {
        Ok(_) => state.transport.answer_pre_checkout(query_id, true, None).await,
        Err(err) => {
            tracing::warn!(user_id = user.user_id, "pre-checkout rejected: {}", err);
            state
                .transport
                .answer_pre_checkout(
                    query_id,
                    false,
                    Some(tr(user.language, "payment_failed")),
                )
                .await
        }
    }
}

pub async fn on_successful_payment(
    state: &AppState,
    user: &User,
    payload: &str,
    charge_id: &str,
) -> Result<(), AppError> {
    let completed = state
        .store
        .complete_payment(user.user_id, payload, charge_id, Utc::now())
        .await?;
    if !completed {
        // Funds arrived but no pending record matched; keep a trace for
        // manual reconciliation instead of failing the user.
        tracing::error!(
            user_id = user.user_id,
            payload,
            charge_id,
            "successful payment without a pending record"
        );
    }
    state
        .transport
        .send_message(user.user_id, tr(user.language, "payment_thanks"), None)
        .await?;
    menu::show_main_menu(state, user).await
}
