// src/handlers/menu.rs

//! Main menu and its single-field edit surfaces.

use std::collections::BTreeSet;

use crate::error::AppError;
use crate::handlers::{browse, payment};
use crate::i18n::tr;
use crate::models::{Lang, MediaType, NdTrait, User};
use crate::session::SessionState;
use crate::state::AppState;
use crate::store::UserPatch;
use crate::transport::{Button, Keyboard};

pub async fn show_main_menu(state: &AppState, user: &User) -> Result<(), AppError> {
    let lang = user.language;
    let keyboard = Keyboard::inline(vec![
        vec![
            Button::callback(tr(lang, "btn_menu_profile"), "menu_profile"),
            Button::callback(tr(lang, "btn_menu_browse"), "menu_browse"),
        ],
        vec![
            Button::callback(tr(lang, "btn_menu_neurosearch"), "menu_neurosearch"),
            Button::callback(tr(lang, "btn_menu_likes"), "menu_likes"),
        ],
        vec![
            Button::callback(tr(lang, "btn_menu_change_photo"), "menu_change_photo"),
            Button::callback(tr(lang, "btn_menu_change_bio"), "menu_change_bio"),
        ],
        vec![
            Button::callback(tr(lang, "btn_menu_settings"), "menu_settings"),
            Button::callback(tr(lang, "btn_menu_feedback"), "menu_feedback"),
        ],
    ]);
    state
        .transport
        .send_message(user.user_id, tr(lang, "main_menu"), Some(keyboard))
        .await
}

pub async fn show_language_picker(state: &AppState, user: &User) -> Result<(), AppError> {
    let keyboard = Keyboard::inline(vec![vec![
        Button::callback("Русский", "lang_ru"),
        Button::callback("English", "lang_en"),
    ]]);
    state
        .transport
        .send_message(
            user.user_id,
            tr(user.language, "choose_language"),
            Some(keyboard),
        )
        .await
}

pub async fn on_language_chosen(
    state: &AppState,
    user: &User,
    code: &str,
) -> Result<(), AppError> {
    let Some(lang) = Lang::from_code(code) else {
        return Err(AppError::Protocol(format!("unknown language {}", code)));
    };
    let user = state
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
        .transport
        .send_message(user.user_id, tr(lang, "language_set"), None)
        .await?;
    if user.profile_complete {
        show_main_menu(state, &user).await
    } else {
        Ok(())
    }
}

/// Profile card shown while browsing and in "my profile".
pub fn render_card(user: &User) -> String {
    let mut lines = Vec::new();
    let mut headline = user.display_name();
    if let Some(age) = user.age {
        headline.push_str(&format!(", {}", age));
    }
    if let Some(city) = &user.city {
        headline.push_str(&format!(", {}", city));
    }
    lines.push(headline);
    if let Some(bio) = &user.bio {
        lines.push(bio.clone());
    }
    if !user.nd_traits.is_empty() {
        let traits: Vec<&str> = user
            .nd_traits
            .iter()
            .map(|t| trait_label(user.language, *t))
            .collect();
        lines.push(traits.join(", "));
    }
    lines.join("\n")
}

fn trait_label(lang: Lang, t: NdTrait) -> &'static str {
    match t {
        NdTrait::Adhd => tr(lang, "trait_adhd"),
        NdTrait::Autism => tr(lang, "trait_autism"),
        NdTrait::Anxiety => tr(lang, "trait_anxiety"),
        NdTrait::Depression => tr(lang, "trait_depression"),
        NdTrait::Bipolar => tr(lang, "trait_bipolar"),
        NdTrait::Ocd => tr(lang, "trait_ocd"),
        NdTrait::Ptsd => tr(lang, "trait_ptsd"),
        NdTrait::Sensory => tr(lang, "trait_sensory"),
        NdTrait::Dyslexia => tr(lang, "trait_dyslexia"),
        NdTrait::HighlySensitive => tr(lang, "trait_highly_sensitive"),
        NdTrait::Introvert => tr(lang, "trait_introvert"),
        NdTrait::Empath => tr(lang, "trait_empath"),
        NdTrait::Creative => tr(lang, "trait_creative"),
        NdTrait::None => tr(lang, "trait_none"),
    }
}

/// Sends a user's card, with their primary media when present.
pub async fn send_card(
    state: &AppState,
    chat_id: i64,
    subject: &User,
    keyboard: Option<Keyboard>,
) -> Result<(), AppError> {
    let caption = render_card(subject);
    match subject.photos.first().or(subject.media_id.as_ref()) {
        Some(media_id) => {
            state
                .transport
                .send_media(chat_id, subject.media_type, media_id, &caption, keyboard)
                .await
        }
        None => {
            state
                .transport
                .send_message(chat_id, &caption, keyboard)
                .await
        }
    }
}

pub async fn on_menu(state: &AppState, user: &User, item: &str) -> Result<(), AppError> {
    if !user.profile_complete {
        return state
            .transport
            .send_message(user.user_id, tr(user.language, "profile_incomplete"), None)
            .await;
    }
    let lang = user.language;
    match item {
        "profile" => {
            send_card(state, user.user_id, user, None).await?;
            show_main_menu(state, user).await
        }
        "browse" => browse::start(state, user, false).await,
        "neurosearch" => {
            if user.seeking_traits.is_empty() {
                start_trait_picker(state, user).await
            } else {
                browse::start(state, user, true).await
            }
        }
        "change_photo" => {
            state
                .sessions
                .set(user.user_id, SessionState::AwaitingPhoto)
                .await;
            state
                .transport
                .send_message(user.user_id, tr(lang, "photo_prompt"), None)
                .await
        }
        "change_bio" => {
            state
                .sessions
                .set(user.user_id, SessionState::AwaitingBio)
                .await;
            state
                .transport
                .send_message(user.user_id, tr(lang, "bio_prompt"), None)
                .await
        }
        "likes" => show_likes(state, user).await,
        "settings" => {
            let keyboard = Keyboard::inline(vec![
                vec![Button::callback(tr(lang, "btn_change_language"), "lang_picker")],
                vec![Button::callback(tr(lang, "btn_donate"), "menu_donate")],
            ]);
            state
                .transport
                .send_message(user.user_id, tr(lang, "settings_header"), Some(keyboard))
                .await
        }
        "donate" => payment::open_donate(state, user).await,
        "feedback" => {
            state
                .sessions
                .set(user.user_id, SessionState::AwaitingFeedback)
                .await;
            state
                .transport
                .send_message(user.user_id, tr(lang, "feedback_prompt"), None)
                .await
        }
        other => Err(AppError::Protocol(format!("unknown menu item {}", other))),
    }
}

/// "Who liked me": names with like-back buttons.
async fn show_likes(state: &AppState, user: &User) -> Result<(), AppError> {
    let lang = user.language;
    let pending: Vec<i64> = user
        .received_likes
        .iter()
        .filter(|id| !user.sent_likes.contains(id) && !user.declined_likes.contains(id))
        .copied()
        .take(10)
        .collect();
    if pending.is_empty() {
        state
            .transport
            .send_message(user.user_id, tr(lang, "likes_none"), None)
            .await?;
        return show_main_menu(state, user).await;
    }

    let mut rows = Vec::new();
    for liker_id in pending {
        if let Some(liker) = state.store.get(liker_id).await? {
            rows.push(vec![
                Button::callback(liker.display_name(), format!("like_{}", liker_id)),
                Button::callback(tr(lang, "btn_pass"), format!("pass_{}", liker_id)),
            ]);
        }
    }
    rows.push(vec![Button::callback(tr(lang, "btn_back"), "back_to_menu")]);
    state
        .transport
        .send_message(
            user.user_id,
            tr(lang, "likes_header"),
            Some(Keyboard::inline(rows)),
        )
        .await
}

pub async fn on_bio_text(
    state: &AppState,
    user: &User,
    kind: &crate::transport::EventKind,
) -> Result<(), AppError> {
    let lang = user.language;
    let crate::transport::EventKind::Text(text) = kind else {
        return state
            .transport
            .send_message(user.user_id, tr(lang, "need_text"), None)
            .await;
    };
    let text = text.trim();
    if text.is_empty() {
        return state
            .transport
            .send_message(user.user_id, tr(lang, "need_text"), None)
            .await;
    }
    let user = state
        .store
        .upsert(
            user.user_id,
            UserPatch {
                bio: Some(text.to_string()),
                ..Default::default()
            },
        )
        .await?;
    state.sessions.clear(user.user_id).await;
    state
        .transport
        .send_message(user.user_id, tr(lang, "bio_saved"), None)
        .await?;
    show_main_menu(state, &user).await
}

pub async fn on_new_photo(
    state: &AppState,
    user: &User,
    kind: &crate::transport::EventKind,
) -> Result<(), AppError> {
    let lang = user.language;
    let media_id = match kind {
        crate::transport::EventKind::Photo(id) => id.clone(),
        _ => {
            return state
                .transport
                .send_message(user.user_id, tr(lang, "need_photo"), None)
                .await;
        }
    };
    // The new photo becomes the primary one; older photos shift down.
    let mut photos = user.photos.clone();
    photos.insert(0, media_id);
    photos.truncate(3);
    let user = state
        .store
        .upsert(
            user.user_id,
            UserPatch {
                photos: Some(photos),
                media_type: Some(MediaType::Photo),
                ..Default::default()
            },
        )
        .await?;
    state.sessions.clear(user.user_id).await;
    state
        .transport
        .send_message(user.user_id, tr(lang, "photo_saved"), None)
        .await?;
    show_main_menu(state, &user).await
}

pub async fn on_feedback_text(
    state: &AppState,
    user: &User,
    kind: &crate::transport::EventKind,
) -> Result<(), AppError> {
    let lang = user.language;
    let crate::transport::EventKind::Text(text) = kind else {
        return state
            .transport
            .send_message(user.user_id, tr(lang, "need_text"), None)
            .await;
    };
    state.store.add_feedback(user.user_id, text.trim()).await?;
    state.sessions.clear(user.user_id).await;
    state
        .transport
        .send_message(user.user_id, tr(lang, "feedback_thanks"), None)
        .await?;
    show_main_menu(state, user).await
}

fn trait_picker_keyboard(lang: Lang, picked: &BTreeSet<NdTrait>) -> Keyboard {
    let mut rows = Vec::new();
    for pair in NdTrait::ALL.chunks(2) {
        let row = pair
            .iter()
            .map(|t| {
                let label = if picked.contains(t) {
                    format!("✅ {}", trait_label(lang, *t))
                } else {
                    trait_label(lang, *t).to_string()
                };
                Button::callback(label, format!("trait_{}", t.as_str()))
            })
            .collect();
        rows.push(row);
    }
    rows.push(vec![Button::callback(
        tr(lang, "btn_traits_done"),
        "traits_done",
    )]);
    Keyboard::inline(rows)
}

pub async fn start_trait_picker(state: &AppState, user: &User) -> Result<(), AppError> {
    let picked = user.seeking_traits.clone();
    state
        .sessions
        .set(user.user_id, SessionState::PickingTraits(picked.clone()))
        .await;
    state
        .transport
        .send_message(
            user.user_id,
            tr(user.language, "traits_prompt"),
            Some(trait_picker_keyboard(user.language, &picked)),
        )
        .await
}

/// Toggle callbacks while the trait picker is open; "done" persists the
/// selection and goes straight into a neurosearch browse.
pub async fn on_trait_event(
    state: &AppState,
    user: &User,
    mut picked: BTreeSet<NdTrait>,
    kind: &crate::transport::EventKind,
) -> Result<(), AppError> {
    let lang = user.language;
    let crate::transport::EventKind::Callback(token) = kind else {
        return Ok(());
    };
    if token == "traits_done" {
        let user = state
            .store
            .upsert(
                user.user_id,
                UserPatch {
                    seeking_traits: Some(picked),
                    ..Default::default()
                },
            )
            .await?;
        state.sessions.clear(user.user_id).await;
        state
            .transport
            .send_message(user.user_id, tr(lang, "traits_saved"), None)
            .await?;
        return browse::start(state, &user, true).await;
    }
    if token == "back_to_menu" {
        state.sessions.clear(user.user_id).await;
        return show_main_menu(state, user).await;
    }
    let Some(t) = token.strip_prefix("trait_").and_then(NdTrait::parse) else {
        return Err(AppError::Protocol(format!("unknown trait token {}", token)));
    };
    if !picked.remove(&t) {
        picked.insert(t);
    }
    state
        .sessions
        .set(user.user_id, SessionState::PickingTraits(picked.clone()))
        .await;
    state
        .transport
        .send_message(
            user.user_id,
            tr(lang, "traits_prompt"),
            Some(trait_picker_keyboard(lang, &picked)),
        )
        .await
}
