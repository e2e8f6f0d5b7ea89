// src/store/mod.rs

//! Profile store abstraction.
//!
//! Ledger mutations live behind this boundary because they are
//! transactional: `record_like` touches two user rows and must commit or
//! roll back as a unit, with row locks taken in ascending `user_id` order.

pub mod memory;
pub mod postgres;

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::ledger::LikeOutcome;
use crate::models::{Feedback, Gender, Interest, Lang, MediaType, NdTrait, PaymentRecord, User};

pub use memory::MemoryStore;
pub use postgres::PgProfileStore;

/// Field-granular profile update. `None` leaves the field untouched;
/// last writer wins per field.
#[derive(Debug, Default, Clone)]
pub struct UserPatch {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub language: Option<Lang>,
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub interest: Option<Interest>,
    pub city: Option<String>,
    pub bio: Option<String>,
    pub photos: Option<Vec<String>>,
    pub photo_id: Option<String>,
    pub media_type: Option<MediaType>,
    pub media_id: Option<String>,
    /// `Some(None)` clears stored coordinates.
    pub coordinates: Option<Option<(f64, f64)>>,
    pub nd_traits: Option<BTreeSet<NdTrait>>,
    pub nd_symptoms: Option<BTreeSet<String>>,
    pub seeking_traits: Option<BTreeSet<NdTrait>>,
    pub profile_complete: Option<bool>,
}

impl UserPatch {
    /// Merges the patch into `user` and bumps `updated_at`.
    pub fn apply(self, user: &mut User) {
        if let Some(v) = self.username {
            user.username = Some(v);
        }
        if let Some(v) = self.first_name {
            user.first_name = Some(v);
        }
        if let Some(v) = self.language {
            user.language = v;
        }
        if let Some(v) = self.name {
            user.name = Some(v);
        }
        if let Some(v) = self.age {
            user.age = Some(v);
        }
        if let Some(v) = self.gender {
            user.gender = Some(v);
        }
        if let Some(v) = self.interest {
            user.interest = Some(v);
        }
        if let Some(v) = self.city {
            user.city = Some(v);
        }
        if let Some(v) = self.bio {
            user.bio = Some(v);
        }
        if let Some(v) = self.photos {
            user.photos = v;
            user.photos.truncate(3);
            user.photo_id = user.photos.first().cloned();
        }
        if let Some(v) = self.photo_id {
            user.photo_id = Some(v);
        }
        if let Some(v) = self.media_type {
            user.media_type = v;
        }
        if let Some(v) = self.media_id {
            user.media_id = Some(v);
        }
        if let Some(coords) = self.coordinates {
            user.latitude = coords.map(|c| c.0);
            user.longitude = coords.map(|c| c.1);
        }
        if let Some(v) = self.nd_traits {
            user.nd_traits = v;
        }
        if let Some(v) = self.nd_symptoms {
            user.nd_symptoms = v;
        }
        if let Some(v) = self.seeking_traits {
            user.seeking_traits = v;
        }
        if let Some(v) = self.profile_complete {
            user.profile_complete = v;
        }
        user.updated_at = Utc::now();
    }
}

/// Hard filter for a candidate batch. Ranking happens in the selector.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    pub viewer_id: i64,
    /// Accepted candidate genders, from the viewer's interest.
    pub genders: Vec<Gender>,
    /// Already-decided targets: `sent_likes ∪ declined_likes`.
    pub exclude: Vec<i64>,
    pub limit: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub total_users: i64,
    pub active_today: i64,
    pub total_feedback: i64,
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, user_id: i64) -> Result<Option<User>, AppError>;

    /// Creates the user on first contact, then merges the patch.
    async fn upsert(&self, user_id: i64, patch: UserPatch) -> Result<User, AppError>;

    async fn touch_last_active(&self, user_id: i64) -> Result<(), AppError>;

    /// Bounded, filtered batch. Not reserved: overlapping batches are fine.
    async fn list_candidates(&self, filter: CandidateFilter) -> Result<Vec<User>, AppError>;

    /// Records a directed like atomically across both users' ledgers.
    async fn record_like(&self, liker_id: i64, liked_id: i64) -> Result<LikeOutcome, AppError>;

    async fn record_pass(&self, viewer_id: i64, target_id: i64) -> Result<(), AppError>;

    /// Returns and atomically clears the unnotified set.
    async fn drain_unnotified(&self, user_id: i64) -> Result<Vec<i64>, AppError>;

    /// Puts drained likers back after a failed delivery, keeping
    /// `unnotified ⊆ received` (likers no longer in `received_likes` are
    /// dropped).
    async fn restore_unnotified(&self, user_id: i64, likers: Vec<i64>) -> Result<(), AppError>;

    /// Removes a single liker from the unnotified set once a push
    /// notification for it was delivered.
    async fn consume_unnotified(&self, user_id: i64, liker_id: i64) -> Result<(), AppError>;

    async fn is_mutual(&self, a: i64, b: i64) -> Result<bool, AppError>;

    async fn add_feedback(&self, user_id: i64, message: &str) -> Result<Feedback, AppError>;

    async fn add_payment(&self, user_id: i64, record: PaymentRecord) -> Result<(), AppError>;

    /// Marks the pending payment carrying `payload` completed. Returns
    /// false when no pending record matches.
    async fn complete_payment(
        &self,
        user_id: i64,
        payload: &str,
        external_id: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    /// All pending TON records across users, for the chain verifier.
    async fn pending_ton_payments(&self) -> Result<Vec<(i64, PaymentRecord)>, AppError>;

    /// Marks pending TON records past their expiry as expired. Returns the
    /// number swept.
    async fn expire_stale_payments(&self, now: DateTime<Utc>) -> Result<u64, AppError>;

    async fn stats(&self) -> Result<StoreStats, AppError>;
}
