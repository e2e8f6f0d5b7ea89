// src/ledger.rs

//! Interaction ledger mutations.
//!
//! The directed like graph is kept as denormalized edge sets on each user
//! (`sent_likes` / `received_likes`). Both store backends lock the affected
//! rows and then apply these pure functions, so the symmetry invariant
//! `B ∈ A.sent_likes ⇔ A ∈ B.received_likes` holds under one transaction
//! regardless of backend.

use crate::models::User;

/// Result of recording a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    /// False when the edge already existed (repeated like is a no-op).
    /// Match announcements fire only on a new edge.
    pub newly_recorded: bool,
    /// True when the liked user had already liked back.
    pub is_match: bool,
}

/// Records a directed like from `liker` to `liked`.
///
/// A previous pass on the target is forgotten (the user changed their
/// mind). Idempotent: a repeated like leaves both ledgers untouched and
/// reports `is_match` consistent with current state.
pub fn apply_like(liker: &mut User, liked: &mut User) -> LikeOutcome {
    debug_assert_ne!(liker.user_id, liked.user_id);

    liker.declined_likes.remove(&liked.user_id);

    // Mutuality is tested against the pre-existing reverse edge.
    let is_match = liked.sent_likes.contains(&liker.user_id);

    let newly_recorded = liker.sent_likes.insert(liked.user_id);
    if newly_recorded {
        liked.received_likes.insert(liker.user_id);
        liked.unnotified_likes.insert(liker.user_id);
    }

    LikeOutcome {
        newly_recorded,
        is_match,
    }
}

/// Records a pass. Idempotent; never touches the target's ledgers. A target
/// the viewer already liked is not declinable (keeps `sent ∩ declined = ∅`).
pub fn apply_pass(viewer: &mut User, target_id: i64) {
    if !viewer.sent_likes.contains(&target_id) {
        viewer.declined_likes.insert(target_id);
    }
}

/// Takes the current unnotified set, clearing it.
pub fn take_unnotified(user: &mut User) -> Vec<i64> {
    std::mem::take(&mut user.unnotified_likes).into_iter().collect()
}

/// True when both directed edges exist.
pub fn is_mutual(a: &User, b: &User) -> bool {
    a.sent_likes.contains(&b.user_id) && b.sent_likes.contains(&a.user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64) -> User {
        User::new(id, None, None)
    }

    #[test]
    fn like_records_both_edges() {
        let mut a = user(1);
        let mut b = user(2);

        let out = apply_like(&mut a, &mut b);
        assert!(out.newly_recorded);
        assert!(!out.is_match);
        assert!(a.sent_likes.contains(&2));
        assert!(b.received_likes.contains(&1));
        assert!(b.unnotified_likes.contains(&1));
    }

    #[test]
    fn mutual_like_is_a_match() {
        let mut a = user(1);
        let mut b = user(2);

        apply_like(&mut a, &mut b);
        let out = apply_like(&mut b, &mut a);
        assert!(out.is_match);
        assert!(is_mutual(&a, &b));
    }

    #[test]
    fn repeated_like_is_a_noop_and_still_reports_match() {
        let mut a = user(1);
        let mut b = user(2);

        apply_like(&mut a, &mut b);
        apply_like(&mut b, &mut a);

        let before_a = a.clone();
        let before_b = b.clone();
        let out = apply_like(&mut a, &mut b);
        assert!(!out.newly_recorded);
        assert!(out.is_match);
        assert_eq!(a.sent_likes, before_a.sent_likes);
        assert_eq!(b.received_likes, before_b.received_likes);
        assert_eq!(b.unnotified_likes, before_b.unnotified_likes);
    }

    #[test]
    fn like_after_pass_undeclines() {
        let mut a = user(1);
        let mut b = user(2);

        apply_pass(&mut a, 2);
        assert!(a.declined_likes.contains(&2));

        let out = apply_like(&mut a, &mut b);
        assert!(out.newly_recorded);
        assert!(!a.declined_likes.contains(&2));
        assert!(a.sent_likes.contains(&2));
    }

    #[test]
    fn pass_is_idempotent_and_never_shadows_a_like() {
        let mut a = user(1);
        let mut b = user(2);

        apply_pass(&mut a, 2);
        apply_pass(&mut a, 2);
        assert_eq!(a.declined_likes.len(), 1);

        apply_like(&mut a, &mut b);
        apply_pass(&mut a, 2);
        assert!(!a.declined_likes.contains(&2));
    }

    #[test]
    fn unnotified_stays_subset_of_received() {
        let mut a = user(1);
        let mut b = user(2);

        apply_like(&mut a, &mut b);
        assert!(b.unnotified_likes.is_subset(&b.received_likes));

        let drained = take_unnotified(&mut b);
        assert_eq!(drained, vec![1]);
        assert!(b.unnotified_likes.is_empty());
        assert!(b.received_likes.contains(&1));
    }
}
