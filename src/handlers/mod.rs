// src/handlers/mod.rs

//! Inbound event dispatch.
//!
//! Every event first ensures the user exists, refreshes `last_active` and
//! flushes pending like notifications (pull-on-activity). It is then routed
//! to the onboarding flow, an awaiting-input session, or the menu/browse
//! callback surface.

pub mod browse;
pub mod menu;
pub mod onboarding;
pub mod payment;

use std::time::Duration;

use crate::dispatcher;
use crate::error::AppError;
use crate::i18n::tr;
use crate::models::User;
use crate::session::SessionState;
use crate::state::AppState;
use crate::store::UserPatch;
use crate::transport::{Event, EventKind};

/// Entry point used by the event loop: transient store failures are
/// retried once with a short backoff; a persistent failure surfaces to the
/// user as a generic "try again later" without advancing any state.
pub async fn handle_event_with_retry(state: &AppState, event: Event) {
    match handle_event(state, event.clone()).await {
        Ok(()) => {}
        Err(AppError::Store(first)) => {
            tracing::warn!("store error, retrying once: {}", first);
            tokio::time::sleep(Duration::from_millis(300)).await;
            if let Err(err) = handle_event(state, event.clone()).await {
                tracing::error!("event failed after retry: {}", err);
                let lang = state
                    .store
                    .get(event.user_id)
                    .await
                    .ok()
                    .flatten()
                    .map(|u| u.language)
                    .unwrap_or_default();
                let _ = state
                    .transport
                    .send_message(event.chat_id, tr(lang, "try_again_later"), None)
                    .await;
            }
        }
        Err(AppError::Protocol(err)) => {
            tracing::warn!("dropping malformed event: {}", err);
        }
        Err(err) => {
            tracing::error!("event handling failed: {}", err);
        }
    }
}

pub async fn handle_event(state: &AppState, event: Event) -> Result<(), AppError> {
    // Users are created on first interaction.
    let user = state
        .store
        .upsert(
            event.user_id,
            UserPatch {
                username: event.username.clone(),
                first_name: event.first_name.clone(),
                ..Default::default()
            },
        )
        .await?;
    state.store.touch_last_active(user.user_id).await?;

    // Pull-on-activity: announce likes received while the user was away.
    if !matches!(
        event.kind,
        EventKind::PreCheckout { .. } | EventKind::SuccessfulPayment { .. }
    ) {
        dispatcher::flush_pending(state.store.as_ref(), state.transport.as_ref(), &user).await?;
    }

    match &event.kind {
        EventKind::Command(cmd) => on_command(state, &user, cmd).await,
        EventKind::PreCheckout {
            query_id,
            currency,
            total_amount,
            payload,
        } => payment::on_pre_checkout(state, &user, query_id, currency, *total_amount, payload).await,
        EventKind::SuccessfulPayment {
            payload, charge_id, ..
        } => payment::on_successful_payment(state, &user, payload, charge_id).await,
        _ => match state.sessions.get(user.user_id).await {
            SessionState::Onboarding(flow) => {
                onboarding::on_event(state, &user, flow, &event.kind).await
            }
            SessionState::AwaitingBio => menu::on_bio_text(state, &user, &event.kind).await,
            SessionState::AwaitingPhoto => menu::on_new_photo(state, &user, &event.kind).await,
            SessionState::AwaitingFeedback => {
                menu::on_feedback_text(state, &user, &event.kind).await
            }
            SessionState::AwaitingCustomAmount(kind) => {
                payment::on_custom_amount(state, &user, kind, &event.kind).await
            }
            SessionState::PickingTraits(picked) => {
                menu::on_trait_event(state, &user, picked, &event.kind).await
            }
            SessionState::Browsing(cursor) => {
                route_free_event(state, &user, Some(cursor), &event.kind).await
            }
            SessionState::Idle => route_free_event(state, &user, None, &event.kind).await,
        },
    }
}

async fn on_command(state: &AppState, user: &User, cmd: &str) -> Result<(), AppError> {
    match cmd {
        "/start" => onboarding::start(state, user).await,
        "/help" => {
            state
                .transport
                .send_message(user.user_id, tr(user.language, "help"), None)
                .await
        }
        "/language" => menu::show_language_picker(state, user).await,
        other => {
            tracing::debug!(user_id = user.user_id, "unknown command {}", other);
            state
                .transport
                .send_message(user.user_id, tr(user.language, "help"), None)
                .await
        }
    }
}

/// Events outside any modal session: callback tokens, or stray input.
async fn route_free_event(
    state: &AppState,
    user: &User,
    cursor: Option<crate::session::BrowseCursor>,
    kind: &EventKind,
) -> Result<(), AppError> {
    let EventKind::Callback(token) = kind else {
        // Stray text/media: nudge incomplete profiles into onboarding,
        // show the menu to everyone else.
        if user.profile_complete {
            return menu::show_main_menu(state, user).await;
        }
        return onboarding::start(state, user).await;
    };

    if token == "lang_picker" {
        return menu::show_language_picker(state, user).await;
    }
    if let Some(lang) = token.strip_prefix("lang_") {
        return menu::on_language_chosen(state, user, lang).await;
    }
    if let Some(item) = token.strip_prefix("menu_") {
        return menu::on_menu(state, user, item).await;
    }
    if token == "back_to_menu" {
        state.sessions.clear(user.user_id).await;
        return menu::show_main_menu(state, user).await;
    }
    if let Some(id) = parse_target(token, "like_") {
        return browse::on_like(state, user, cursor, id).await;
    }
    if let Some(id) = parse_target(token, "pass_") {
        return browse::on_pass(state, user, cursor, id).await;
    }
    if let Some(id) = parse_target(token, "report_") {
        return browse::on_report(state, user, cursor, id).await;
    }
    if token == "payment_method_stars" || token == "payment_method_ton" {
        return payment::on_method_chosen(state, user, token).await;
    }
    if token.starts_with("stars_") || token.starts_with("ton_") {
        return payment::on_amount_token(state, user, token).await;
    }
    if token.starts_with("confirm_") || token.starts_with("trait") {
        // Stale button after its flow ended; nothing to do.
        return Ok(());
    }

    Err(AppError::Protocol(format!("unknown callback token {}", token)))
}

fn parse_target(token: &str, prefix: &str) -> Option<i64> {
    token.strip_prefix(prefix)?.parse().ok()
}
