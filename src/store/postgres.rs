// src/store/postgres.rs

//! Durable profile store on Postgres.
//!
//! Array-valued fields (photos, trait sets, ledgers, payments) are
//! serialized JSON in TEXT columns. Two-row transactions lock rows with
//! `SELECT ... FOR UPDATE` in ascending `user_id` order so concurrent
//! likes between the same pair cannot deadlock.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::error::AppError;
use crate::ledger::{self, LikeOutcome};
use crate::models::{
    Feedback, Gender, Interest, Lang, MediaType, NdTrait, PaymentKind, PaymentRecord,
    PaymentStatus, User,
};
use crate::store::{CandidateFilter, ProfileStore, StoreStats, UserPatch};

const USER_COLUMNS: &str = "user_id, username, first_name, language, name, age, gender, interest, \
     city, bio, photos, photo_id, media_type, media_id, latitude, longitude, \
     nd_traits, nd_symptoms, seeking_traits, \
     sent_likes, received_likes, unnotified_likes, declined_likes, \
     total_rating, rating_count, payments, profile_complete, \
     created_at, updated_at, last_active";

#[derive(FromRow)]
struct UserRow {
    user_id: i64,
    username: Option<String>,
    first_name: Option<String>,
    language: String,
    name: Option<String>,
    age: Option<i32>,
    gender: Option<String>,
    interest: Option<String>,
    city: Option<String>,
    bio: Option<String>,
    photos: String,
    photo_id: Option<String>,
    media_type: String,
    media_id: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    nd_traits: String,
    nd_symptoms: String,
    seeking_traits: String,
    sent_likes: String,
    received_likes: String,
    unnotified_likes: String,
    declined_likes: String,
    total_rating: f64,
    rating_count: i32,
    payments: String,
    profile_complete: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

fn parse_set<T: serde::de::DeserializeOwned + Ord>(raw: &str) -> Result<BTreeSet<T>, AppError> {
    Ok(serde_json::from_str(raw)?)
}

impl UserRow {
    fn into_user(self) -> Result<User, AppError> {
        Ok(User {
            user_id: self.user_id,
            username: self.username,
            first_name: self.first_name,
            language: Lang::from_code(&self.language).unwrap_or_default(),
            name: self.name,
            age: self.age,
            gender: self.gender.as_deref().and_then(Gender::parse),
            interest: self.interest.as_deref().and_then(Interest::parse),
            city: self.city,
            bio: self.bio,
            photos: serde_json::from_str(&self.photos)?,
            photo_id: self.photo_id,
            media_type: MediaType::parse(&self.media_type).unwrap_or_default(),
            media_id: self.media_id,
            latitude: self.latitude,
            longitude: self.longitude,
            nd_traits: parse_set::<NdTrait>(&self.nd_traits)?,
            nd_symptoms: parse_set::<String>(&self.nd_symptoms)?,
            seeking_traits: parse_set::<NdTrait>(&self.seeking_traits)?,
            sent_likes: parse_set::<i64>(&self.sent_likes)?,
            received_likes: parse_set::<i64>(&self.received_likes)?,
            unnotified_likes: parse_set::<i64>(&self.unnotified_likes)?,
            declined_likes: parse_set::<i64>(&self.declined_likes)?,
            total_rating: self.total_rating,
            rating_count: self.rating_count,
            payments: serde_json::from_str(&self.payments)?,
            profile_complete: self.profile_complete,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_active: self.last_active,
        })
    }
}

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_for_update(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
    ) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE user_id = $1 FOR UPDATE",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    /// Inserts an empty row for the user if absent, then locks it.
    async fn fetch_or_create_for_update(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
    ) -> Result<User, AppError> {
        if let Some(user) = Self::fetch_for_update(tx, user_id).await? {
            return Ok(user);
        }
        let blank = User::new(user_id, None, None);
        Self::insert(tx, &blank).await?;
        Self::fetch_for_update(tx, user_id)
            .await?
            .ok_or_else(|| AppError::Store(format!("user {} vanished after insert", user_id)))
    }

    async fn insert(tx: &mut Transaction<'_, Postgres>, user: &User) -> Result<(), AppError> {
        let sql = format!(
            "INSERT INTO users ({}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
              $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30) \
             ON CONFLICT (user_id) DO NOTHING",
            USER_COLUMNS
        );
        bind_user(sqlx::query(&sql), user)?
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn update(tx: &mut Transaction<'_, Postgres>, user: &User) -> Result<(), AppError> {
        let sql = "UPDATE users SET \
             username = $2, first_name = $3, language = $4, name = $5, age = $6, \
             gender = $7, interest = $8, city = $9, bio = $10, photos = $11, \
             photo_id = $12, media_type = $13, media_id = $14, latitude = $15, \
             longitude = $16, nd_traits = $17, nd_symptoms = $18, seeking_traits = $19, \
             sent_likes = $20, received_likes = $21, unnotified_likes = $22, \
             declined_likes = $23, total_rating = $24, rating_count = $25, \
             payments = $26, profile_complete = $27, created_at = $28, \
             updated_at = $29, last_active = $30 \
             WHERE user_id = $1";
        bind_user(sqlx::query(sql), user)?.execute(&mut **tx).await?;
        Ok(())
    }
}

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments>;

/// Binds all 30 user columns in `USER_COLUMNS` order ($1 = user_id).
fn bind_user<'q>(query: PgQuery<'q>, user: &User) -> Result<PgQuery<'q>, AppError> {
    Ok(query
        .bind(user.user_id)
        .bind(user.username.clone())
        .bind(user.first_name.clone())
        .bind(user.language.code())
        .bind(user.name.clone())
        .bind(user.age)
        .bind(user.gender.map(|g| g.as_str()))
        .bind(user.interest.map(|i| i.as_str()))
        .bind(user.city.clone())
        .bind(user.bio.clone())
        .bind(serde_json::to_string(&user.photos)?)
        .bind(user.photo_id.clone())
        .bind(user.media_type.as_str())
        .bind(user.media_id.clone())
        .bind(user.latitude)
        .bind(user.longitude)
        .bind(serde_json::to_string(&user.nd_traits)?)
        .bind(serde_json::to_string(&user.nd_symptoms)?)
        .bind(serde_json::to_string(&user.seeking_traits)?)
        .bind(serde_json::to_string(&user.sent_likes)?)
        .bind(serde_json::to_string(&user.received_likes)?)
        .bind(serde_json::to_string(&user.unnotified_likes)?)
        .bind(serde_json::to_string(&user.declined_likes)?)
        .bind(user.total_rating)
        .bind(user.rating_count)
        .bind(serde_json::to_string(&user.payments)?)
        .bind(user.profile_complete)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.last_active))
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get(&self, user_id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE user_id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn upsert(&self, user_id: i64, patch: UserPatch) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut user = Self::fetch_or_create_for_update(&mut tx, user_id).await?;
        patch.apply(&mut user);
        Self::update(&mut tx, &user).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn touch_last_active(&self, user_id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_active = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_candidates(&self, filter: CandidateFilter) -> Result<Vec<User>, AppError> {
        let genders: Vec<String> = filter
            .genders
            .iter()
            .map(|g| g.as_str().to_string())
            .collect();
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users \
             WHERE profile_complete = TRUE \
               AND user_id <> $1 \
               AND gender = ANY($2) \
               AND NOT (user_id = ANY($3)) \
             ORDER BY last_active DESC, user_id ASC \
             LIMIT $4",
            USER_COLUMNS
        ))
        .bind(filter.viewer_id)
        .bind(genders)
        .bind(filter.exclude)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn record_like(&self, liker_id: i64, liked_id: i64) -> Result<LikeOutcome, AppError> {
        if liker_id == liked_id {
            return Err(AppError::Validation("cannot like yourself".to_string()));
        }
        let mut tx = self.pool.begin().await?;

        // Lock order: lower user_id first.
        let (first, second) = if liker_id < liked_id {
            (liker_id, liked_id)
        } else {
            (liked_id, liker_id)
        };
        let mut first_user = Self::fetch_for_update(&mut tx, first)
            .await?
            .ok_or_else(|| AppError::Store(format!("user {} not found", first)))?;
        let mut second_user = Self::fetch_for_update(&mut tx, second)
            .await?
            .ok_or_else(|| AppError::Store(format!("user {} not found", second)))?;

        let (liker, liked) = if first == liker_id {
            (&mut first_user, &mut second_user)
        } else {
            (&mut second_user, &mut first_user)
        };
        let outcome = ledger::apply_like(liker, liked);
        let now = Utc::now();
        liker.updated_at = now;
        liked.updated_at = now;

        Self::update(&mut tx, &first_user).await?;
        Self::update(&mut tx, &second_user).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    async fn record_pass(&self, viewer_id: i64, target_id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let mut viewer = Self::fetch_for_update(&mut tx, viewer_id)
            .await?
            .ok_or_else(|| AppError::Store(format!("user {} not found", viewer_id)))?;
        ledger::apply_pass(&mut viewer, target_id);
        viewer.updated_at = Utc::now();
        Self::update(&mut tx, &viewer).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn drain_unnotified(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        let mut tx = self.pool.begin().await?;
        let Some(mut user) = Self::fetch_for_update(&mut tx, user_id).await? else {
            return Ok(Vec::new());
        };
        let drained = ledger::take_unnotified(&mut user);
        if !drained.is_empty() {
            Self::update(&mut tx, &user).await?;
        }
        tx.commit().await?;
        Ok(drained)
    }

    async fn restore_unnotified(&self, user_id: i64, likers: Vec<i64>) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        if let Some(mut user) = Self::fetch_for_update(&mut tx, user_id).await? {
            for liker in likers {
                if user.received_likes.contains(&liker) {
                    user.unnotified_likes.insert(liker);
                }
            }
            Self::update(&mut tx, &user).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn consume_unnotified(&self, user_id: i64, liker_id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        if let Some(mut user) = Self::fetch_for_update(&mut tx, user_id).await? {
            if user.unnotified_likes.remove(&liker_id) {
                Self::update(&mut tx, &user).await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn is_mutual(&self, a: i64, b: i64) -> Result<bool, AppError> {
        let (Some(a), Some(b)) = (self.get(a).await?, self.get(b).await?) else {
            return Ok(false);
        };
        Ok(ledger::is_mutual(&a, &b))
    }

    async fn add_feedback(&self, user_id: i64, message: &str) -> Result<Feedback, AppError> {
        let created_at = Utc::now();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO feedback (user_id, message, created_at, resolved) \
             VALUES ($1, $2, $3, FALSE) RETURNING id",
        )
        .bind(user_id)
        .bind(message)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(Feedback {
            id,
            user_id,
            message: message.to_string(),
            created_at,
            resolved: false,
        })
    }

    async fn add_payment(&self, user_id: i64, record: PaymentRecord) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let mut user = Self::fetch_for_update(&mut tx, user_id)
            .await?
            .ok_or_else(|| AppError::Store(format!("user {} not found", user_id)))?;
        user.payments.push(record);
        user.updated_at = Utc::now();
        Self::update(&mut tx, &user).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn complete_payment(
        &self,
        user_id: i64,
        payload: &str,
        external_id: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;
        let Some(mut user) = Self::fetch_for_update(&mut tx, user_id).await? else {
            return Ok(false);
        };
        let mut matched = false;
        for record in user.payments.iter_mut() {
            if record.payload == payload && record.status == PaymentStatus::Pending {
                record.status = PaymentStatus::Completed;
                record.completed_at = Some(completed_at);
                record.external_id = external_id.to_string();
                matched = true;
                break;
            }
        }
        if matched {
            user.updated_at = Utc::now();
            Self::update(&mut tx, &user).await?;
        }
        tx.commit().await?;
        Ok(matched)
    }

    async fn pending_ton_payments(&self) -> Result<Vec<(i64, PaymentRecord)>, AppError> {
        // Coarse SQL prefilter; exact matching happens on the parsed records.
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT user_id, payments FROM users WHERE payments LIKE '%\"pending\"%'",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::new();
        for (user_id, raw) in rows {
            let records: Vec<PaymentRecord> = serde_json::from_str(&raw)?;
            for record in records {
                if record.kind == PaymentKind::Ton && record.status == PaymentStatus::Pending {
                    out.push((user_id, record));
                }
            }
        }
        Ok(out)
    }

    async fn expire_stale_payments(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let pending = self.pending_ton_payments().await?;
        let mut swept = 0;
        for (user_id, record) in pending {
            if record.expires_at.is_some_and(|at| at < now) {
                let mut tx = self.pool.begin().await?;
                if let Some(mut user) = Self::fetch_for_update(&mut tx, user_id).await? {
                    for stored in user.payments.iter_mut() {
                        if stored.payload == record.payload
                            && stored.status == PaymentStatus::Pending
                        {
                            stored.status = PaymentStatus::Expired;
                            swept += 1;
                        }
                    }
                    user.updated_at = Utc::now();
                    Self::update(&mut tx, &user).await?;
                }
                tx.commit().await?;
            }
        }
        Ok(swept)
    }

    async fn stats(&self) -> Result<StoreStats, AppError> {
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        let cutoff = Utc::now() - Duration::hours(24);
        let active_today: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE last_active >= $1")
                .bind(cutoff)
                .fetch_one(&self.pool)
                .await?;
        let total_feedback: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback")
            .fetch_one(&self.pool)
            .await?;
        Ok(StoreStats {
            total_users,
            active_today,
            total_feedback,
        })
    }
}
