// src/session.rs

//! Per-viewer ephemeral state.
//!
//! The registration scratchpad and browse cursor live here, in memory,
//! keyed by user id. A process restart loses ongoing registrations;
//! committed profiles survive in the store.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::models::{NdTrait, PaymentKind};
use crate::registration::Onboarding;

/// Cursor over a candidate batch. The queue holds user ids; acted-on
/// targets land in the ledger and are filtered out of the next batch.
#[derive(Debug, Clone, Default)]
pub struct BrowseCursor {
    pub queue: Vec<i64>,
    pub index: usize,
    /// Neurosearch mode: candidates were filtered by seeking traits.
    pub neuro: bool,
}

impl BrowseCursor {
    pub fn current(&self) -> Option<i64> {
        self.queue.get(self.index).copied()
    }

    pub fn advance(&mut self) {
        self.index += 1;
    }

    pub fn exhausted(&self) -> bool {
        self.index >= self.queue.len()
    }
}

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Onboarding(Onboarding),
    Browsing(BrowseCursor),
    AwaitingBio,
    AwaitingPhoto,
    AwaitingFeedback,
    AwaitingCustomAmount(PaymentKind),
    PickingTraits(BTreeSet<NdTrait>),
}

/// Session map shared across handler invocations.
#[derive(Clone, Default)]
pub struct Sessions {
    inner: Arc<Mutex<HashMap<i64, SessionState>>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: i64) -> SessionState {
        self.inner
            .lock()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn set(&self, user_id: i64, state: SessionState) {
        self.inner.lock().await.insert(user_id, state);
    }

    pub async fn clear(&self, user_id: i64) {
        self.inner.lock().await.remove(&user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_default_to_idle() {
        let sessions = Sessions::new();
        assert!(matches!(sessions.get(42).await, SessionState::Idle));

        sessions.set(42, SessionState::AwaitingBio).await;
        assert!(matches!(sessions.get(42).await, SessionState::AwaitingBio));

        sessions.clear(42).await;
        assert!(matches!(sessions.get(42).await, SessionState::Idle));
    }

    #[test]
    fn cursor_walks_the_queue() {
        let mut cursor = BrowseCursor {
            queue: vec![5, 6],
            index: 0,
            neuro: false,
        };
        assert_eq!(cursor.current(), Some(5));
        cursor.advance();
        assert_eq!(cursor.current(), Some(6));
        cursor.advance();
        assert!(cursor.exhausted());
        assert_eq!(cursor.current(), None);
    }
}
