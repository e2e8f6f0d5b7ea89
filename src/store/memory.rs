// src/store/memory.rs

//! In-memory store with the same semantics as the Postgres backend.
//!
//! One mutex over the whole map gives serializability for free; it backs
//! the integration tests and local runs without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::ledger::{self, LikeOutcome};
use crate::models::{Feedback, PaymentKind, PaymentRecord, PaymentStatus, User};
use crate::store::{CandidateFilter, ProfileStore, StoreStats, UserPatch};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<i64, User>>,
    feedback: Mutex<Vec<Feedback>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get(&self, user_id: i64) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().await.get(&user_id).cloned())
    }

    async fn upsert(&self, user_id: i64, patch: UserPatch) -> Result<User, AppError> {
        let mut users = self.users.lock().await;
        let user = users
            .entry(user_id)
            .or_insert_with(|| User::new(user_id, None, None));
        patch.apply(user);
        Ok(user.clone())
    }

    async fn touch_last_active(&self, user_id: i64) -> Result<(), AppError> {
        if let Some(user) = self.users.lock().await.get_mut(&user_id) {
            user.last_active = Utc::now();
        }
        Ok(())
    }

    async fn list_candidates(&self, filter: CandidateFilter) -> Result<Vec<User>, AppError> {
        let users = self.users.lock().await;
        let mut out: Vec<User> = users
            .values()
            .filter(|c| c.user_id != filter.viewer_id)
            .filter(|c| c.profile_complete)
            .filter(|c| c.gender.is_some_and(|g| filter.genders.contains(&g)))
            .filter(|c| !filter.exclude.contains(&c.user_id))
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            b.last_active
                .cmp(&a.last_active)
                .then(a.user_id.cmp(&b.user_id))
        });
        out.truncate(filter.limit.max(0) as usize);
        Ok(out)
    }

    async fn record_like(&self, liker_id: i64, liked_id: i64) -> Result<LikeOutcome, AppError> {
        if liker_id == liked_id {
            return Err(AppError::Validation("cannot like yourself".to_string()));
        }
        let mut users = self.users.lock().await;
        // Take both users out of the map to mutate them together under
        // the single lock; this is the one-transaction equivalent.
        let mut liker = users
            .remove(&liker_id)
            .ok_or_else(|| AppError::Store(format!("user {} not found", liker_id)))?;
        let Some(liked) = users.get_mut(&liked_id) else {
            users.insert(liker_id, liker);
            return Err(AppError::Store(format!("user {} not found", liked_id)));
        };
        let outcome = ledger::apply_like(&mut liker, liked);
        liker.updated_at = Utc::now();
        liked.updated_at = liker.updated_at;
        users.insert(liker_id, liker);
        Ok(outcome)
    }

    async fn record_pass(&self, viewer_id: i64, target_id: i64) -> Result<(), AppError> {
        let mut users = self.users.lock().await;
        let viewer = users
            .get_mut(&viewer_id)
            .ok_or_else(|| AppError::Store(format!("user {} not found", viewer_id)))?;
        ledger::apply_pass(viewer, target_id);
        viewer.updated_at = Utc::now();
        Ok(())
    }

    async fn drain_unnotified(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        let mut users = self.users.lock().await;
        match users.get_mut(&user_id) {
            Some(user) => Ok(ledger::take_unnotified(user)),
            None => Ok(Vec::new()),
        }
    }

    async fn restore_unnotified(&self, user_id: i64, likers: Vec<i64>) -> Result<(), AppError> {
        let mut users = self.users.lock().await;
        if let Some(user) = users.get_mut(&user_id) {
            for liker in likers {
                if user.received_likes.contains(&liker) {
                    user.unnotified_likes.insert(liker);
                }
            }
        }
        Ok(())
    }

    async fn consume_unnotified(&self, user_id: i64, liker_id: i64) -> Result<(), AppError> {
        let mut users = self.users.lock().await;
        if let Some(user) = users.get_mut(&user_id) {
            user.unnotified_likes.remove(&liker_id);
        }
        Ok(())
    }

    async fn is_mutual(&self, a: i64, b: i64) -> Result<bool, AppError> {
        let users = self.users.lock().await;
        match (users.get(&a), users.get(&b)) {
            (Some(a), Some(b)) => Ok(ledger::is_mutual(a, b)),
            _ => Ok(false),
        }
    }

    async fn add_feedback(&self, user_id: i64, message: &str) -> Result<Feedback, AppError> {
        let mut feedback = self.feedback.lock().await;
        let entry = Feedback {
            id: feedback.len() as i64 + 1,
            user_id,
            message: message.to_string(),
            created_at: Utc::now(),
            resolved: false,
        };
        feedback.push(entry.clone());
        Ok(entry)
    }

    async fn add_payment(&self, user_id: i64, record: PaymentRecord) -> Result<(), AppError> {
        let mut users = self.users.lock().await;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::Store(format!("user {} not found", user_id)))?;
        user.payments.push(record);
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn complete_payment(
        &self,
        user_id: i64,
        payload: &str,
        external_id: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut users = self.users.lock().await;
        let Some(user) = users.get_mut(&user_id) else {
            return Ok(false);
        };
        for record in user.payments.iter_mut() {
            if record.payload == payload && record.status == PaymentStatus::Pending {
                record.status = PaymentStatus::Completed;
                record.completed_at = Some(completed_at);
                record.external_id = external_id.to_string();
                user.updated_at = Utc::now();
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn pending_ton_payments(&self) -> Result<Vec<(i64, PaymentRecord)>, AppError> {
        let users = self.users.lock().await;
        let mut out = Vec::new();
        for user in users.values() {
            for record in &user.payments {
                if record.kind == PaymentKind::Ton && record.status == PaymentStatus::Pending {
                    out.push((user.user_id, record.clone()));
                }
            }
        }
        Ok(out)
    }

    async fn expire_stale_payments(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut users = self.users.lock().await;
        let mut swept = 0;
        for user in users.values_mut() {
            for record in user.payments.iter_mut() {
                if record.status == PaymentStatus::Pending
                    && record.expires_at.is_some_and(|at| at < now)
                {
                    record.status = PaymentStatus::Expired;
                    swept += 1;
                }
            }
        }
        Ok(swept)
    }

    async fn stats(&self) -> Result<StoreStats, AppError> {
        let users = self.users.lock().await;
        let cutoff = Utc::now() - Duration::hours(24);
        Ok(StoreStats {
            total_users: users.len() as i64,
            active_today: users.values().filter(|u| u.last_active >= cutoff).count() as i64,
            total_feedback: self.feedback.lock().await.len() as i64,
        })
    }
}
