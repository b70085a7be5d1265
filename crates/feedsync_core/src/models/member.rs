//! Feed members.

use super::user::UserData;
use crate::query::{FilterField, FilterValue, Queryable, Sort, SortField};
use crate::sorted::Identifiable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Membership state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    /// Active member.
    #[default]
    Member,
    /// Invited, not yet accepted.
    Pending,
    /// Invite declined.
    Rejected,
}

impl MemberStatus {
    /// Returns the wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Member => "member",
            MemberStatus::Pending => "pending",
            MemberStatus::Rejected => "rejected",
        }
    }
}

/// A member of a feed. Identified by user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedMemberData {
    /// The member.
    pub user: UserData,
    /// Role within the feed.
    pub role: String,
    /// Membership state.
    pub status: MemberStatus,
    /// Invite acceptance time.
    pub invite_accepted_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Identifiable for FeedMemberData {
    type Id = String;

    fn id(&self) -> String {
        self.user.id.clone()
    }
}

/// Sort fields for members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberSortField {
    /// Creation time.
    CreatedAt,
    /// Last update time.
    UpdatedAt,
}

impl SortField for MemberSortField {
    type Model = FeedMemberData;

    fn remote_name(&self) -> &'static str {
        match self {
            MemberSortField::CreatedAt => "created_at",
            MemberSortField::UpdatedAt => "updated_at",
        }
    }

    fn compare(&self, lhs: &FeedMemberData, rhs: &FeedMemberData) -> Ordering {
        match self {
            MemberSortField::CreatedAt => lhs.created_at.cmp(&rhs.created_at),
            MemberSortField::UpdatedAt => lhs.updated_at.cmp(&rhs.updated_at),
        }
    }
}

/// Filter fields for members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberFilterField {
    /// Member id.
    UserId,
    /// Role.
    Role,
    /// Membership state.
    Status,
}

impl FilterField for MemberFilterField {
    type Model = FeedMemberData;

    fn remote_name(&self) -> &'static str {
        match self {
            MemberFilterField::UserId => "user_id",
            MemberFilterField::Role => "role",
            MemberFilterField::Status => "status",
        }
    }

    fn value_of(&self, model: &FeedMemberData) -> FilterValue {
        match self {
            MemberFilterField::UserId => model.user.id.as_str().into(),
            MemberFilterField::Role => model.role.as_str().into(),
            MemberFilterField::Status => model.status.as_str().into(),
        }
    }
}

impl Queryable for FeedMemberData {
    type SortField = MemberSortField;
    type FilterField = MemberFilterField;

    fn default_sort() -> Vec<Sort<MemberSortField>> {
        vec![Sort::descending(MemberSortField::CreatedAt)]
    }
}
