// src/models/user.rs

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::payment::PaymentRecord;

/// Interface language. Russian is the default for the target audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lang {
    #[default]
    Ru,
    En,
}

impl Lang {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ru" => Some(Lang::Ru),
            "en" => Some(Lang::En),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Lang::Ru => "ru",
            Lang::En => "en",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }
}

/// Which gender(s) the user wants to see while browsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interest {
    Male,
    Female,
    Both,
}

impl Interest {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interest::Male => "male",
            Interest::Female => "female",
            Interest::Both => "both",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Interest::Male),
            "female" => Some(Interest::Female),
            "both" => Some(Interest::Both),
            _ => None,
        }
    }

    /// Candidate genders this interest accepts.
    pub fn accepted_genders(&self) -> &'static [Gender] {
        match self {
            Interest::Male => &[Gender::Male],
            Interest::Female => &[Gender::Female],
            Interest::Both => &[Gender::Male, Gender::Female],
        }
    }
}

/// Primary profile media kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    #[default]
    Photo,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Photo => "photo",
            MediaType::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "photo" => Some(MediaType::Photo),
            "video" => Some(MediaType::Video),
            _ => None,
        }
    }
}

/// Fixed neurodivergent trait vocabulary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NdTrait {
    Adhd,
    Autism,
    Anxiety,
    Depression,
    Bipolar,
    Ocd,
    Ptsd,
    Sensory,
    Dyslexia,
    HighlySensitive,
    Introvert,
    Empath,
    Creative,
    None,
}

impl NdTrait {
    pub const ALL: [NdTrait; 14] = [
        NdTrait::Adhd,
        NdTrait::Autism,
        NdTrait::Anxiety,
        NdTrait::Depression,
        NdTrait::Bipolar,
        NdTrait::Ocd,
        NdTrait::Ptsd,
        NdTrait::Sensory,
        NdTrait::Dyslexia,
        NdTrait::HighlySensitive,
        NdTrait::Introvert,
        NdTrait::Empath,
        NdTrait::Creative,
        NdTrait::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NdTrait::Adhd => "adhd",
            NdTrait::Autism => "autism",
            NdTrait::Anxiety => "anxiety",
            NdTrait::Depression => "depression",
            NdTrait::Bipolar => "bipolar",
            NdTrait::Ocd => "ocd",
            NdTrait::Ptsd => "ptsd",
            NdTrait::Sensory => "sensory",
            NdTrait::Dyslexia => "dyslexia",
            NdTrait::HighlySensitive => "highly_sensitive",
            NdTrait::Introvert => "introvert",
            NdTrait::Empath => "empath",
            NdTrait::Creative => "creative",
            NdTrait::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        NdTrait::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

/// A registered user with profile fields and interaction ledgers.
///
/// The ledgers are denormalized edge sets of the directed like graph: for any
/// pair (A, B), `B ∈ A.sent_likes` iff `A ∈ B.received_likes`, maintained
/// transactionally by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub language: Lang,

    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub interest: Option<Interest>,
    pub city: Option<String>,
    pub bio: Option<String>,

    /// Up to 3 opaque media handles, in display order.
    pub photos: Vec<String>,
    pub photo_id: Option<String>,
    pub media_type: MediaType,
    pub media_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub nd_traits: BTreeSet<NdTrait>,
    pub nd_symptoms: BTreeSet<String>,
    pub seeking_traits: BTreeSet<NdTrait>,

    pub sent_likes: BTreeSet<i64>,
    pub received_likes: BTreeSet<i64>,
    /// Received likes not yet announced to this user. Always a subset of
    /// `received_likes`.
    pub unnotified_likes: BTreeSet<i64>,
    pub declined_likes: BTreeSet<i64>,

    pub total_rating: f64,
    pub rating_count: i32,

    pub payments: Vec<PaymentRecord>,

    pub profile_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl User {
    pub fn new(user_id: i64, username: Option<String>, first_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            username,
            first_name,
            language: Lang::Ru,
            name: None,
            age: None,
            gender: None,
            interest: None,
            city: None,
            bio: None,
            photos: Vec::new(),
            photo_id: None,
            media_type: MediaType::Photo,
            media_id: None,
            latitude: None,
            longitude: None,
            nd_traits: BTreeSet::new(),
            nd_symptoms: BTreeSet::new(),
            seeking_traits: BTreeSet::new(),
            sent_likes: BTreeSet::new(),
            received_likes: BTreeSet::new(),
            unnotified_likes: BTreeSet::new(),
            declined_likes: BTreeSet::new(),
            total_rating: 0.0,
            rating_count: 0,
            payments: Vec::new(),
            profile_complete: false,
            created_at: now,
            updated_at: now,
            last_active: now,
        }
    }

    /// A profile is complete when every required field is filled and at
    /// least one photo was uploaded.
    pub fn is_profile_complete(&self) -> bool {
        self.name.as_deref().is_some_and(|s| !s.is_empty())
            && self.age.is_some()
            && self.gender.is_some()
            && self.interest.is_some()
            && self.city.as_deref().is_some_and(|s| !s.is_empty())
            && self.bio.as_deref().is_some_and(|s| !s.is_empty())
            && !self.photos.is_empty()
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// Display name: profile name, platform first name, or the numeric id.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.first_name.clone())
            .unwrap_or_else(|| self.user_id.to_string())
    }
}
