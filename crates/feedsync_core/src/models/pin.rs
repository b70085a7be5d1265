//! Pinned activities.

use super::activity::ActivityData;
use super::user::UserData;
use crate::ids::FeedId;
use crate::query::{FilterField, FilterValue, Queryable, Sort, SortField};
use crate::sorted::Identifiable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An activity pinned to a feed. Identified by the activity within its feed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityPinData {
    /// The pinned activity.
    pub activity: ActivityData,
    /// Feed the activity is pinned to.
    pub feed: FeedId,
    /// User who pinned it.
    pub user: UserData,
    /// Pin time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Identifiable for ActivityPinData {
    type Id = String;

    fn id(&self) -> String {
        self.activity.id.clone()
    }
}

/// Sort fields for pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinSortField {
    /// Pin time.
    CreatedAt,
}

impl SortField for PinSortField {
    type Model = ActivityPinData;

    fn remote_name(&self) -> &'static str {
        "created_at"
    }

    fn compare(&self, lhs: &ActivityPinData, rhs: &ActivityPinData) -> Ordering {
        lhs.created_at.cmp(&rhs.created_at)
    }
}

/// Filter fields for pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinFilterField {
    /// Pinned activity.
    ActivityId,
    /// Pinning user.
    UserId,
}

impl FilterField for PinFilterField {
    type Model = ActivityPinData;

    fn remote_name(&self) -> &'static str {
        match self {
            PinFilterField::ActivityId => "activity_id",
            PinFilterField::UserId => "user_id",
        }
    }

    fn value_of(&self, model: &ActivityPinData) -> FilterValue {
        match self {
            PinFilterField::ActivityId => model.activity.id.as_str().into(),
            PinFilterField::UserId => model.user.id.as_str().into(),
        }
    }
}

impl Queryable for ActivityPinData {
    type SortField = PinSortField;
    type FilterField = PinFilterField;

    /// Most recently pinned first.
    fn default_sort() -> Vec<Sort<PinSortField>> {
        vec![Sort::descending(PinSortField::CreatedAt)]
    }
}
