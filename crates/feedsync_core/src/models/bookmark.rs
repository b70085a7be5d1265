//! Bookmarks and bookmark folders.

use super::activity::ActivityData;
use super::user::UserData;
use crate::query::{FilterField, FilterValue, Queryable, Sort, SortField};
use crate::sorted::Identifiable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A folder grouping bookmarks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookmarkFolderData {
    /// Folder id.
    pub id: String,
    /// Folder name.
    pub name: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// A user's bookmark of an activity.
///
/// A user bookmarks an activity at most once, so the identity is
/// `(user, activity)`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookmarkData {
    /// The bookmarked activity.
    pub activity: ActivityData,
    /// Owner of the bookmark.
    pub user: UserData,
    /// Folder, if filed.
    pub folder: Option<BookmarkFolderData>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl BookmarkData {
    /// Id of the bookmarked activity.
    pub fn activity_id(&self) -> &str {
        &self.activity.id
    }
}

impl Identifiable for BookmarkData {
    type Id = String;

    fn id(&self) -> String {
        format!("{}-{}", self.user.id, self.activity.id)
    }
}

/// Sort fields for bookmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkSortField {
    /// Creation time.
    CreatedAt,
    /// Last update time.
    UpdatedAt,
}

impl SortField for BookmarkSortField {
    type Model = BookmarkData;

    fn remote_name(&self) -> &'static str {
        match self {
            BookmarkSortField::CreatedAt => "created_at",
            BookmarkSortField::UpdatedAt => "updated_at",
        }
    }

    fn compare(&self, lhs: &BookmarkData, rhs: &BookmarkData) -> Ordering {
        match self {
            BookmarkSortField::CreatedAt => lhs.created_at.cmp(&rhs.created_at),
            BookmarkSortField::UpdatedAt => lhs.updated_at.cmp(&rhs.updated_at),
        }
    }
}

/// Filter fields for bookmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkFilterField {
    /// Bookmarked activity.
    ActivityId,
    /// Folder.
    FolderId,
    /// Owner.
    UserId,
}

impl FilterField for BookmarkFilterField {
    type Model = BookmarkData;

    fn remote_name(&self) -> &'static str {
        match self {
            BookmarkFilterField::ActivityId => "activity_id",
            BookmarkFilterField::FolderId => "folder_id",
            BookmarkFilterField::UserId => "user_id",
        }
    }

    fn value_of(&self, model: &BookmarkData) -> FilterValue {
        match self {
            BookmarkFilterField::ActivityId => model.activity.id.as_str().into(),
            BookmarkFilterField::FolderId => {
                model.folder.as_ref().map(|folder| folder.id.as_str()).into()
            }
            BookmarkFilterField::UserId => model.user.id.as_str().into(),
        }
    }
}

impl Queryable for BookmarkData {
    type SortField = BookmarkSortField;
    type FilterField = BookmarkFilterField;

    fn default_sort() -> Vec<Sort<BookmarkSortField>> {
        vec![Sort::descending(BookmarkSortField::CreatedAt)]
    }
}
