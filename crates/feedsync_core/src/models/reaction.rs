//! Reactions and reaction groups.

use super::user::UserData;
use crate::sorted::{Identifiable, SortedVec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reactions kept in the `latest` sample.
pub const LATEST_REACTIONS_LIMIT: usize = 10;

/// A reaction on an activity or a comment.
///
/// Reactions are keyed per user and kind, not globally: the identity is
/// `(user, kind, activity[, comment])`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsReactionData {
    /// Activity the reaction belongs to (directly or through a comment).
    pub activity_id: String,
    /// Comment the reaction is on, for comment reactions.
    pub comment_id: Option<String>,
    /// Reaction kind (`like`, `fire`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Reacting user.
    pub user: UserData,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Identifiable for FeedsReactionData {
    type Id = String;

    fn id(&self) -> String {
        match &self.comment_id {
            Some(comment_id) => format!(
                "{}-{}-{}-{}",
                self.user.id, self.kind, self.activity_id, comment_id
            ),
            None => format!("{}-{}-{}", self.user.id, self.kind, self.activity_id),
        }
    }
}

/// Aggregate for one reaction kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionGroupData {
    /// Number of reactions of this kind.
    pub count: u32,
    /// Earliest reaction time.
    pub first_reaction_at: DateTime<Utc>,
    /// Latest reaction time.
    pub last_reaction_at: DateTime<Utc>,
}

impl ReactionGroupData {
    /// A group holding a single reaction made at `at`.
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            first_reaction_at: at,
            last_reaction_at: at,
        }
    }

    /// Records one more reaction made at `at`.
    pub fn increment(&mut self, at: DateTime<Utc>) {
        self.count += 1;
        self.first_reaction_at = self.first_reaction_at.min(at);
        self.last_reaction_at = self.last_reaction_at.max(at);
    }

    /// Records a removed reaction. Floors at zero.
    pub fn decrement(&mut self) {
        self.count = self.count.saturating_sub(1);
    }

    /// Returns true once the last reaction is gone.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Reaction state embedded in activities and comments.
///
/// `groups` is the source of truth for the reaction count; `own` and `latest`
/// are partial indices (the current user's reactions and a recent sample).
///
/// # Invariants
///
/// - `count()` is always the sum of group counts
/// - Groups with a zero count are removed
/// - A reaction already present in `own` or `latest` is never counted twice
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionSummary {
    /// Reaction groups by kind.
    pub groups: BTreeMap<String, ReactionGroupData>,
    /// Reactions made by the current user.
    pub own: Vec<FeedsReactionData>,
    /// Most recent reactions, newest first, at most
    /// [`LATEST_REACTIONS_LIMIT`].
    pub latest: Vec<FeedsReactionData>,
}

impl ReactionSummary {
    /// Total number of reactions across all kinds.
    pub fn count(&self) -> u32 {
        self.groups.values().map(|group| group.count).sum()
    }

    /// Returns true if the current user has reacted with `kind`.
    pub fn has_own(&self, kind: &str) -> bool {
        self.own.iter().any(|reaction| reaction.kind == kind)
    }

    /// Records a new reaction.
    ///
    /// Returns `false` (and only refreshes the stored copy) when the reaction
    /// is already known locally.
    pub fn add(&mut self, reaction: FeedsReactionData, current_user_id: &str) -> bool {
        let id = reaction.id();
        if self.own.contains_id(&id) || self.latest.contains_id(&id) {
            self.own.replace_by_id(reaction.clone());
            self.latest.replace_by_id(reaction);
            return false;
        }

        let at = reaction.created_at;
        self.groups
            .entry(reaction.kind.clone())
            .and_modify(|group| group.increment(at))
            .or_insert_with(|| ReactionGroupData::new(at));

        if reaction.user.id == current_user_id {
            self.own.push(reaction.clone());
        }
        self.latest.insert(0, reaction);
        self.latest.truncate(LATEST_REACTIONS_LIMIT);
        true
    }

    /// Records a removed reaction.
    ///
    /// Removing one of the current user's reactions that is no longer in
    /// `own` is a no-op, so a repeated delete does not decrement twice.
    pub fn remove(&mut self, reaction: &FeedsReactionData, current_user_id: &str) -> bool {
        let id = reaction.id();
        let was_own = self.own.sorted_remove(&id).is_some();
        self.latest.sorted_remove(&id);
        if reaction.user.id == current_user_id && !was_own {
            return false;
        }

        if let Some(group) = self.groups.get_mut(&reaction.kind) {
            group.decrement();
            if group.is_empty() {
                self.groups.remove(&reaction.kind);
            }
        }
        true
    }

    /// Refreshes a known reaction without touching counts.
    pub fn update(&mut self, reaction: FeedsReactionData) -> bool {
        let in_own = self.own.replace_by_id(reaction.clone());
        let in_latest = self.latest.replace_by_id(reaction);
        in_own || in_latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn reaction(user: &str, kind: &str, at: i64) -> FeedsReactionData {
        FeedsReactionData {
            activity_id: "act-1".into(),
            comment_id: None,
            kind: kind.into(),
            user: UserData::new(user),
            created_at: ts(at),
            updated_at: ts(at),
        }
    }

    #[test]
    fn composite_identity() {
        let mut r = reaction("alice", "like", 1);
        assert_eq!(r.id(), "alice-like-act-1");
        r.comment_id = Some("c1".into());
        assert_eq!(r.id(), "alice-like-act-1-c1");
    }

    #[test]
    fn new_kind_creates_group() {
        let mut summary = ReactionSummary::default();
        assert!(summary.add(reaction("bob", "fire", 10), "alice"));

        let group = &summary.groups["fire"];
        assert_eq!(group.count, 1);
        assert_eq!(group.first_reaction_at, group.last_reaction_at);
        assert_eq!(summary.count(), 1);
        assert!(summary.own.is_empty());
        assert_eq!(summary.latest.len(), 1);
    }

    #[test]
    fn count_is_sum_of_groups() {
        let mut summary = ReactionSummary::default();
        summary.add(reaction("alice", "like", 1), "alice");
        summary.add(reaction("bob", "like", 5), "alice");
        summary.add(reaction("carol", "fire", 3), "alice");

        assert_eq!(summary.count(), 3);
        assert_eq!(summary.groups["like"].count, 2);
        assert_eq!(summary.groups["like"].first_reaction_at, ts(1));
        assert_eq!(summary.groups["like"].last_reaction_at, ts(5));
        assert!(summary.has_own("like"));
        assert!(!summary.has_own("fire"));
    }

    #[test]
    fn duplicate_add_is_not_counted() {
        let mut summary = ReactionSummary::default();
        assert!(summary.add(reaction("alice", "like", 1), "alice"));
        assert!(!summary.add(reaction("alice", "like", 1), "alice"));
        assert_eq!(summary.count(), 1);
        assert_eq!(summary.own.len(), 1);
    }

    #[test]
    fn removing_last_reaction_drops_group() {
        let mut summary = ReactionSummary::default();
        let own = reaction("alice", "like", 1);
        summary.add(own.clone(), "alice");

        assert!(summary.remove(&own, "alice"));
        assert!(summary.groups.is_empty());
        assert_eq!(summary.count(), 0);

        // Second delete of the same own reaction is a no-op
        assert!(!summary.remove(&own, "alice"));
        assert_eq!(summary.count(), 0);
    }

    #[test]
    fn latest_sample_is_capped_newest_first() {
        let mut summary = ReactionSummary::default();
        for n in 0..=LATEST_REACTIONS_LIMIT as i64 {
            summary.add(reaction(&format!("user{n}"), "like", n), "alice");
        }
        assert_eq!(summary.latest.len(), LATEST_REACTIONS_LIMIT);
        assert_eq!(summary.latest[0].user.id, format!("user{LATEST_REACTIONS_LIMIT}"));
        assert!(!summary.latest.iter().any(|r| r.user.id == "user0"));
        assert_eq!(summary.count() as usize, LATEST_REACTIONS_LIMIT + 1);
    }

    #[test]
    fn removing_unknown_foreign_reaction_floors_at_zero() {
        let mut summary = ReactionSummary::default();
        summary.remove(&reaction("bob", "like", 1), "alice");
        assert_eq!(summary.count(), 0);

        summary.add(reaction("bob", "like", 1), "alice");
        summary.remove(&reaction("bob", "like", 1), "alice");
        summary.remove(&reaction("bob", "like", 1), "alice");
        assert_eq!(summary.count(), 0);
    }
}
