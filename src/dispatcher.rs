// src/dispatcher.rs

//! Notification delivery.
//!
//! Push: fired from the like path (match announcements to both parties,
//! best-effort "new like" otherwise). Pull: on any activity the user's
//! unnotified set is drained and announced in one coalesced message.
//! Delivery is at-least-once: a failed send puts the drained likers back.

use crate::error::AppError;
use crate::i18n::tr;
use crate::models::User;
use crate::store::ProfileStore;
use crate::transport::Transport;

/// Private-chat convention: the chat id equals the user id.
fn chat_of(user: &User) -> i64 {
    user.user_id
}

/// Contact line for a match announcement.
fn contact_line(user: &User) -> String {
    match &user.username {
        Some(username) => format!("{} — @{}", user.display_name(), username),
        None => user.display_name(),
    }
}

/// Drains and announces pending likes for a user who just became active.
///
/// Coalesced: a single "new like" line, or the count when several queued
/// up. No liker is announced twice unless the send itself failed.
pub async fn flush_pending(
    store: &dyn ProfileStore,
    transport: &dyn Transport,
    user: &User,
) -> Result<(), AppError> {
    let drained = store.drain_unnotified(user.user_id).await?;
    if drained.is_empty() {
        return Ok(());
    }

    let lang = user.language;
    let text = if drained.len() == 1 {
        tr(lang, "new_like").to_string()
    } else {
        format!("{} {}", tr(lang, "new_likes_count"), drained.len())
    };

    if let Err(err) = transport.send_message(chat_of(user), &text, None).await {
        tracing::warn!(
            user_id = user.user_id,
            "failed to deliver like notifications, restoring: {}",
            err
        );
        store.restore_unnotified(user.user_id, drained).await?;
    }
    Ok(())
}

/// Best-effort "new like" push to the liked user. On success the liker is
/// consumed from the unnotified set so the pull path will not repeat it;
/// on failure it stays there and is retried on the recipient's next
/// activity.
pub async fn notify_new_like(
    store: &dyn ProfileStore,
    transport: &dyn Transport,
    liked: &User,
    liker_id: i64,
) {
    let text = tr(liked.language, "new_like");
    match transport.send_message(chat_of(liked), text, None).await {
        Ok(()) => {
            if let Err(err) = store.consume_unnotified(liked.user_id, liker_id).await {
                tracing::error!("failed to consume unnotified like: {}", err);
            }
        }
        Err(err) => {
            tracing::debug!(
                user_id = liked.user_id,
                "recipient unreachable, like stays queued: {}",
                err
            );
        }
    }
}

/// Announces a fresh mutual match to both parties. Failures are logged;
/// the match itself is already durable in the ledgers.
pub async fn announce_match(transport: &dyn Transport, a: &User, b: &User) {
    for (recipient, other) in [(a, b), (b, a)] {
        let text = format!(
            "{}\n{}",
            tr(recipient.language, "its_a_match"),
            contact_line(other)
        );
        if let Err(err) = transport.send_message(chat_of(recipient), &text, None).await {
            tracing::warn!(
                user_id = recipient.user_id,
                "failed to deliver match announcement: {}",
                err
            );
        }
    }
}
