// src/handlers/onboarding.rs

//! Drives the registration state machine from inbound events.
//!
//! The machine itself (`registration::Onboarding`) is pure; this handler
//! feeds it events, sends its replies, and applies its effects: language
//! is persisted the moment it is chosen, the rest of the draft only at
//! the CONFIRM gate.

use crate::error::AppError;
use crate::handlers::menu;
use crate::models::User;
use crate::registration::{Effect, Input, Onboarding, ProfileDraft, Reply};
use crate::session::SessionState;
use crate::state::AppState;
use crate::store::UserPatch;
use crate::transport::EventKind;

/// `/start`: complete profiles jump straight to the main menu; everyone
/// else enters (or resumes) the guided flow.
pub async fn start(state: &AppState, user: &User) -> Result<(), AppError> {
    if user.profile_complete {
        state.sessions.clear(user.user_id).await;
        return menu::show_main_menu(state, user).await;
    }

    let has_any_field = user.age.is_some() || user.gender.is_some() || user.name.is_some();
    let (flow, replies) = if has_any_field {
        Onboarding::resume_from(user)
    } else {
        Onboarding::start()
    };
    state
        .sessions
        .set(user.user_id, SessionState::Onboarding(flow))
        .await;
    send_replies(state, user.user_id, replies).await
}

pub async fn on_event(
    state: &AppState,
    user: &User,
    mut flow: Onboarding,
    kind: &EventKind,
) -> Result<(), AppError> {
    let outcome = flow.handle(to_input(kind));
    send_replies(state, user.user_id, outcome.replies).await?;

    match outcome.effect {
        Effect::None => {
            state
                .sessions
                .set(user.user_id, SessionState::Onboarding(flow))
                .await;
            Ok(())
        }
        Effect::PersistLanguage(lang) => {
            state
                .store
                .upsert(
                    user.user_id,
                    UserPatch {
                        language: Some(lang),
                        ..Default::default()
                    },
                )
                .await?;
            state
                .sessions
                .set(user.user_id, SessionState::Onboarding(flow))
                .await;
            Ok(())
        }
        Effect::Commit(draft) => {
            let committed = commit(state, user, draft).await?;
            state.sessions.clear(user.user_id).await;
            menu::show_main_menu(state, &committed).await
        }
    }
}

async fn commit(state: &AppState, user: &User, draft: ProfileDraft) -> Result<User, AppError> {
    let complete = draft.age.is_some()
        && draft.gender.is_some()
        && draft.interest.is_some()
        && draft.city.as_deref().is_some_and(|c| !c.is_empty())
        && draft.name.as_deref().is_some_and(|n| !n.is_empty())
        && draft.bio.as_deref().is_some_and(|b| !b.is_empty())
        && !draft.photos.is_empty();

    let patch = UserPatch {
        age: draft.age,
        gender: draft.gender,
        interest: draft.interest,
        city: draft.city,
        bio: draft.bio,
        name: draft.name,
        coordinates: Some(draft.coordinates),
        photos: Some(draft.photos),
        profile_complete: Some(complete),
        ..Default::default()
    };
    state.store.upsert(user.user_id, patch).await
}

fn to_input(kind: &EventKind) -> Input<'_> {
    match kind {
        EventKind::Text(text) => Input::Text(text),
        EventKind::Callback(token) => Input::Callback(token),
        EventKind::Photo(media_id) => Input::Photo(media_id),
        EventKind::Location {
            latitude,
            longitude,
        } => Input::Location {
            latitude: *latitude,
            longitude: *longitude,
        },
        _ => Input::Unsupported,
    }
}

async fn send_replies(
    state: &AppState,
    chat_id: i64,
    replies: Vec<Reply>,
) -> Result<(), AppError> {
    for reply in replies {
        state
            .transport
            .send_message(chat_id, &reply.text, reply.keyboard)
            .await?;
    }
    Ok(())
}
