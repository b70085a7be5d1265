//! Follow relationships between feeds.

use super::feed::FeedData;
use crate::ids::FeedId;
use crate::query::{FilterField, FilterValue, Queryable, Sort, SortField};
use crate::sorted::Identifiable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// State of a follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowStatus {
    /// Waiting for the target feed's owner to accept.
    #[default]
    Pending,
    /// Active follow.
    Accepted,
    /// Declined by the target feed's owner.
    Rejected,
}

impl FollowStatus {
    /// Returns the wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowStatus::Pending => "pending",
            FollowStatus::Accepted => "accepted",
            FollowStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for FollowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A follow from `source_feed` to `target_feed`.
///
/// The pair of feeds is the identity; re-following replaces the entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowData {
    /// The following feed.
    pub source_feed: FeedData,
    /// The followed feed.
    pub target_feed: FeedData,
    /// Follow state.
    pub status: FollowStatus,
    /// Push preference for activities of the target feed.
    pub push_preference: Option<String>,
    /// Acceptance time for follow requests.
    pub request_accepted_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl FollowData {
    /// Returns true if this is an accepted follow of `fid` (a follower of it).
    pub fn is_follower(&self, fid: &FeedId) -> bool {
        self.status == FollowStatus::Accepted && self.target_feed.feed == *fid
    }

    /// Returns true if this is an accepted follow made by `fid`.
    pub fn is_following(&self, fid: &FeedId) -> bool {
        self.status == FollowStatus::Accepted && self.source_feed.feed == *fid
    }

    /// Returns true if this is a pending request to follow `fid`.
    pub fn is_follow_request(&self, fid: &FeedId) -> bool {
        self.status == FollowStatus::Pending && self.target_feed.feed == *fid
    }

    /// Returns true if `fid` is either side of the follow.
    pub fn involves(&self, fid: &FeedId) -> bool {
        self.source_feed.feed == *fid || self.target_feed.feed == *fid
    }
}

impl Identifiable for FollowData {
    type Id = (FeedId, FeedId);

    fn id(&self) -> (FeedId, FeedId) {
        (self.source_feed.feed.clone(), self.target_feed.feed.clone())
    }
}

/// Sort fields for follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowSortField {
    /// Creation time.
    CreatedAt,
    /// Last update time.
    UpdatedAt,
}

impl SortField for FollowSortField {
    type Model = FollowData;

    fn remote_name(&self) -> &'static str {
        match self {
            FollowSortField::CreatedAt => "created_at",
            FollowSortField::UpdatedAt => "updated_at",
        }
    }

    fn compare(&self, lhs: &FollowData, rhs: &FollowData) -> Ordering {
        match self {
            FollowSortField::CreatedAt => lhs.created_at.cmp(&rhs.created_at),
            FollowSortField::UpdatedAt => lhs.updated_at.cmp(&rhs.updated_at),
        }
    }
}

/// Filter fields for follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowFilterField {
    /// The following feed.
    SourceFeed,
    /// The followed feed.
    TargetFeed,
    /// Follow state.
    Status,
}

impl FilterField for FollowFilterField {
    type Model = FollowData;

    fn remote_name(&self) -> &'static str {
        match self {
            FollowFilterField::SourceFeed => "source_feed",
            FollowFilterField::TargetFeed => "target_feed",
            FollowFilterField::Status => "status",
        }
    }

    fn value_of(&self, model: &FollowData) -> FilterValue {
        match self {
            FollowFilterField::SourceFeed => (&model.source_feed.feed).into(),
            FollowFilterField::TargetFeed => (&model.target_feed.feed).into(),
            FollowFilterField::Status => model.status.as_str().into(),
        }
    }
}

impl Queryable for FollowData {
    type SortField = FollowSortField;
    type FilterField = FollowFilterField;

    fn default_sort() -> Vec<Sort<FollowSortField>> {
        vec![Sort::descending(FollowSortField::CreatedAt)]
    }
}
