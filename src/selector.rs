// src/selector.rs

//! Candidate selection and ranking.
//!
//! The store applies the hard filters (complete profile, compatible gender,
//! not the viewer, not already decided); this module ranks the batch by
//! geographic proximity bucket, recency of activity, then user id for a
//! deterministic order.

use std::collections::BTreeSet;

use crate::distance;
use crate::error::AppError;
use crate::gazetteer;
use crate::models::{NdTrait, User};
use crate::store::{CandidateFilter, ProfileStore};

pub const DEFAULT_BATCH: usize = 10;

/// How many rows to pull per store call so proximity ranking sees more
/// than one screenful before truncation.
const OVERFETCH: usize = 5;

/// Coordinates stored on the user, or resolved from their canonical city.
fn resolved_coordinates(user: &User) -> Option<(f64, f64)> {
    user.coordinates()
        .or_else(|| user.city.as_deref().and_then(gazetteer::coordinates))
}

/// Proximity bucket between a viewer and a candidate.
pub fn bucket_between(viewer: &User, candidate: &User) -> u8 {
    let same_city = match (viewer.city.as_deref(), candidate.city.as_deref()) {
        (Some(a), Some(b)) => !a.is_empty() && a == b,
        _ => false,
    };
    let d = distance::distance_km(
        resolved_coordinates(viewer),
        resolved_coordinates(candidate),
    );
    distance::priority_bucket(same_city, d)
}

/// Produces an ordered candidate batch for the viewer.
///
/// When `seeking` is non-empty, candidates must declare at least one of the
/// wanted traits (the neurosearch surface). The result is a pure function
/// of store state; nothing is reserved.
pub async fn select_candidates(
    store: &dyn ProfileStore,
    viewer: &User,
    batch: usize,
    seeking: Option<&BTreeSet<NdTrait>>,
) -> Result<Vec<User>, AppError> {
    let Some(interest) = viewer.interest else {
        return Ok(Vec::new());
    };

    let exclude: Vec<i64> = viewer
        .sent_likes
        .iter()
        .chain(viewer.declined_likes.iter())
        .copied()
        .collect();

    let filter = CandidateFilter {
        viewer_id: viewer.user_id,
        genders: interest.accepted_genders().to_vec(),
        exclude,
        limit: (batch * OVERFETCH) as i64,
    };
    let mut candidates = store.list_candidates(filter).await?;

    if let Some(seeking) = seeking {
        if !seeking.is_empty() {
            candidates.retain(|c| c.nd_traits.intersection(seeking).next().is_some());
        }
    }

    let mut ranked: Vec<(u8, User)> = candidates
        .into_iter()
        .map(|c| (bucket_between(viewer, &c), c))
        .collect();
    ranked.sort_by(|(bucket_a, a), (bucket_b, b)| {
        bucket_a
            .cmp(bucket_b)
            .then(b.last_active.cmp(&a.last_active))
            .then(a.user_id.cmp(&b.user_id))
    });

    let mut out: Vec<User> = ranked.into_iter().map(|(_, c)| c).collect();
    out.truncate(batch);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Interest};
    use crate::store::{MemoryStore, UserPatch};

    async fn seed(
        store: &MemoryStore,
        id: i64,
        gender: Gender,
        interest: Interest,
        city: Option<&str>,
    ) -> User {
        let patch = UserPatch {
            name: Some(format!("u{}", id)),
            age: Some(25),
            gender: Some(gender),
            interest: Some(interest),
            city: city.map(gazetteer::normalize),
            bio: Some("bio".to_string()),
            photos: Some(vec!["p".to_string()]),
            coordinates: Some(city.and_then(gazetteer::coordinates)),
            profile_complete: Some(true),
            ..Default::default()
        };
        store.upsert(id, patch).await.unwrap()
    }

    #[tokio::test]
    async fn orders_by_bucket_then_recency_then_id() {
        let store = MemoryStore::new();
        let viewer = seed(&store, 1, Gender::Male, Interest::Female, Some("мск")).await;
        // Two in Moscow with different activity, one in Petersburg, one
        // with an unknown city.
        seed(&store, 10, Gender::Female, Interest::Male, Some("мск")).await;
        seed(&store, 11, Gender::Female, Interest::Male, Some("мск")).await;
        seed(&store, 12, Gender::Female, Interest::Male, Some("спб")).await;
        seed(&store, 13, Gender::Female, Interest::Male, Some("середина нигде")).await;

        // 11 becomes the most recently active Moscow candidate.
        store.touch_last_active(10).await.unwrap();
        store.touch_last_active(11).await.unwrap();

        let got = select_candidates(&store, &viewer, 10, None).await.unwrap();
        let ids: Vec<i64> = got.iter().map(|u| u.user_id).collect();
        assert_eq!(ids, vec![11, 10, 12, 13]);

        // Deterministic given fixed store state.
        let again = select_candidates(&store, &viewer, 10, None).await.unwrap();
        assert_eq!(ids, again.iter().map(|u| u.user_id).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn filters_incompatible_and_already_decided() {
        let store = MemoryStore::new();
        let mut viewer = seed(&store, 1, Gender::Male, Interest::Female, Some("мск")).await;
        seed(&store, 2, Gender::Female, Interest::Male, Some("мск")).await;
        seed(&store, 3, Gender::Male, Interest::Female, Some("мск")).await;
        seed(&store, 4, Gender::Female, Interest::Male, Some("мск")).await;

        store.record_like(1, 4).await.unwrap();
        viewer = store.get(1).await.unwrap().unwrap();

        let got = select_candidates(&store, &viewer, 10, None).await.unwrap();
        let ids: Vec<i64> = got.iter().map(|u| u.user_id).collect();
        // 3 is the wrong gender, 4 already liked.
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn seeking_traits_restrict_the_batch() {
        let store = MemoryStore::new();
        let mut viewer = seed(&store, 1, Gender::Male, Interest::Female, Some("мск")).await;
        seed(&store, 2, Gender::Female, Interest::Male, Some("мск")).await;
        let mut with_traits = seed(&store, 3, Gender::Female, Interest::Male, Some("мск")).await;
        with_traits.nd_traits.insert(NdTrait::Adhd);
        store
            .upsert(
                3,
                UserPatch {
                    nd_traits: Some(with_traits.nd_traits.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        viewer.seeking_traits.insert(NdTrait::Adhd);
        let seeking = viewer.seeking_traits.clone();
        let got = select_candidates(&store, &viewer, 10, Some(&seeking))
            .await
            .unwrap();
        let ids: Vec<i64> = got.iter().map(|u| u.user_id).collect();
        assert_eq!(ids, vec![3]);
    }
}
