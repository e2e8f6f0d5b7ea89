// src/handlers/browse.rs

//! Browsing and the like/pass/report surface.
//!
//! A browse session is a cursor over a ranked candidate batch. Acting on a
//! card records the decision in the ledgers and advances; exhausting the
//! queue refetches a fresh batch (already-decided targets drop out via the
//! selector's exclude set).

use crate::dispatcher;
use crate::error::AppError;
use crate::handlers::menu;
use crate::i18n::tr;
use crate::models::User;
use crate::selector;
use crate::session::{BrowseCursor, SessionState};
use crate::state::AppState;
use crate::transport::{Button, Keyboard};

pub async fn start(state: &AppState, viewer: &User, neuro: bool) -> Result<(), AppError> {
    let seeking = neuro.then(|| viewer.seeking_traits.clone());
    let batch = selector::select_candidates(
        state.store.as_ref(),
        viewer,
        selector::DEFAULT_BATCH,
        seeking.as_ref(),
    )
    .await?;

    if batch.is_empty() {
        state
            .transport
            .send_message(viewer.user_id, tr(viewer.language, "no_candidates"), None)
            .await?;
        return menu::show_main_menu(state, viewer).await;
    }

    let cursor = BrowseCursor {
        queue: batch.iter().map(|c| c.user_id).collect(),
        index: 0,
        neuro,
    };
    state
        .sessions
        .set(viewer.user_id, SessionState::Browsing(cursor.clone()))
        .await;
    show_current(state, viewer, &cursor).await
}

fn card_keyboard(viewer: &User, target_id: i64) -> Keyboard {
    let lang = viewer.language;
    Keyboard::inline(vec![
        vec![
            Button::callback(tr(lang, "btn_like"), format!("like_{}", target_id)),
            Button::callback(tr(lang, "btn_pass"), format!("pass_{}", target_id)),
        ],
        vec![
            Button::callback(tr(lang, "btn_report"), format!("report_{}", target_id)),
            Button::callback(tr(lang, "btn_back"), "back_to_menu"),
        ],
    ])
}

/// Sends the card under the cursor. A candidate deleted between batch and
/// display is skipped silently.
async fn show_current(
    state: &AppState,
    viewer: &User,
    cursor: &BrowseCursor,
) -> Result<(), AppError> {
    let mut cursor = cursor.clone();
    while let Some(target_id) = cursor.current() {
        match state.store.get(target_id).await? {
            Some(target) if target.profile_complete => {
                state
                    .sessions
                    .set(viewer.user_id, SessionState::Browsing(cursor.clone()))
                    .await;
                return menu::send_card(
                    state,
                    viewer.user_id,
                    &target,
                    Some(card_keyboard(viewer, target_id)),
                )
                .await;
            }
            _ => cursor.advance(),
        }
    }
    refetch(state, viewer, cursor.neuro).await
}

/// Queue exhausted: pull a fresh batch, or fall back to the menu when the
/// pool is dry.
async fn refetch(state: &AppState, viewer: &User, neuro: bool) -> Result<(), AppError> {
    // Re-read the viewer so the exclude set reflects this session's likes.
    let viewer = state
        .store
        .get(viewer.user_id)
        .await?
        .unwrap_or_else(|| viewer.clone());
    state.sessions.clear(viewer.user_id).await;
    // Boxed: re-entering `start` closes an async call cycle.
    Box::pin(start(state, &viewer, neuro)).await
}

async fn advance(
    state: &AppState,
    viewer: &User,
    cursor: Option<BrowseCursor>,
) -> Result<(), AppError> {
    match cursor {
        Some(mut cursor) => {
            cursor.advance();
            if cursor.exhausted() {
                refetch(state, viewer, cursor.neuro).await
            } else {
                show_current(state, viewer, &cursor).await
            }
        }
        // Acted from outside a browse session (the likes list).
        None => menu::show_main_menu(state, viewer).await,
    }
}

pub async fn on_like(
    state: &AppState,
    viewer: &User,
    cursor: Option<BrowseCursor>,
    target_id: i64,
) -> Result<(), AppError> {
    if target_id == viewer.user_id {
        return Err(AppError::Protocol("self-like".to_string()));
    }
    let outcome = state.store.record_like(viewer.user_id, target_id).await?;

    if outcome.newly_recorded && outcome.is_match {
        // Fresh rows: the ledgers just changed on both sides.
        let a = state.store.get(viewer.user_id).await?;
        let b = state.store.get(target_id).await?;
        if let (Some(a), Some(b)) = (a, b) {
            dispatcher::announce_match(state.transport.as_ref(), &a, &b).await;
            // The match announcement supersedes any queued "new like".
            state
                .store
                .consume_unnotified(target_id, viewer.user_id)
                .await?;
        }
    } else if outcome.newly_recorded {
        state
            .transport
            .send_message(viewer.user_id, tr(viewer.language, "like_sent"), None)
            .await?;
        if let Some(target) = state.store.get(target_id).await? {
            dispatcher::notify_new_like(
                state.store.as_ref(),
                state.transport.as_ref(),
                &target,
                viewer.user_id,
            )
            .await;
        }
    } else {
        // Repeat tap on a stale button.
        state
            .transport
            .send_message(viewer.user_id, tr(viewer.language, "like_sent"), None)
            .await?;
    }

    advance(state, viewer, cursor).await
}

pub async fn on_pass(
    state: &AppState,
    viewer: &User,
    cursor: Option<BrowseCursor>,
    target_id: i64,
) -> Result<(), AppError> {
    state.store.record_pass(viewer.user_id, target_id).await?;
    state
        .transport
        .send_message(viewer.user_id, tr(viewer.language, "skipped"), None)
        .await?;
    advance(state, viewer, cursor).await
}

/// Reports land in the feedback queue for operators; the reported card is
/// also passed so it never comes back.
pub async fn on_report(
    state: &AppState,
    viewer: &User,
    cursor: Option<BrowseCursor>,
    target_id: i64,
) -> Result<(), AppError> {
    state
        .store
        .add_feedback(viewer.user_id, &format!("report: {}", target_id))
        .await?;
    state.store.record_pass(viewer.user_id, target_id).await?;
    state
        .transport
        .send_message(viewer.user_id, tr(viewer.language, "report_thanks"), None)
        .await?;
    advance(state, viewer, cursor).await
}
