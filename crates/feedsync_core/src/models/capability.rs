//! Feed permissions of the current user.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Something the current user may do on a feed.
///
/// Serialized in kebab-case (`add-activity`). Capabilities this client does
/// not know are kept verbatim in [`FeedOwnCapability::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeedOwnCapability {
    /// Post activities.
    AddActivity,
    /// React to activities.
    AddActivityReaction,
    /// Comment on activities.
    AddComment,
    /// React to comments.
    AddCommentReaction,
    /// Bookmark activities.
    BookmarkActivity,
    /// Create the feed.
    CreateFeed,
    /// Delete own bookmarks.
    DeleteBookmark,
    /// Delete comments.
    DeleteComment,
    /// Delete the feed.
    DeleteFeed,
    /// Edit bookmarks.
    EditBookmark,
    /// Follow the feed.
    Follow,
    /// Pin activities.
    PinActivity,
    /// List follows.
    QueryFollows,
    /// Read the feed.
    ReadFeed,
    /// Delete activities.
    RemoveActivity,
    /// Remove own activity reactions.
    RemoveActivityReaction,
    /// Remove own comment reactions.
    RemoveCommentReaction,
    /// Unfollow the feed.
    Unfollow,
    /// Edit activities.
    UpdateActivity,
    /// Edit comments.
    UpdateComment,
    /// Edit the feed.
    UpdateFeed,
    /// A capability unknown to this client.
    Unknown(String),
}

impl FeedOwnCapability {
    /// Returns the wire form.
    pub fn as_str(&self) -> &str {
        match self {
            FeedOwnCapability::AddActivity => "add-activity",
            FeedOwnCapability::AddActivityReaction => "add-activity-reaction",
            FeedOwnCapability::AddComment => "add-comment",
            FeedOwnCapability::AddCommentReaction => "add-comment-reaction",
            FeedOwnCapability::BookmarkActivity => "bookmark-activity",
            FeedOwnCapability::CreateFeed => "create-feed",
            FeedOwnCapability::DeleteBookmark => "delete-bookmark",
            FeedOwnCapability::DeleteComment => "delete-comment",
            FeedOwnCapability::DeleteFeed => "delete-feed",
            FeedOwnCapability::EditBookmark => "edit-bookmark",
            FeedOwnCapability::Follow => "follow",
            FeedOwnCapability::PinActivity => "pin-activity",
            FeedOwnCapability::QueryFollows => "query-follows",
            FeedOwnCapability::ReadFeed => "read-feed",
            FeedOwnCapability::RemoveActivity => "remove-activity",
            FeedOwnCapability::RemoveActivityReaction => "remove-activity-reaction",
            FeedOwnCapability::RemoveCommentReaction => "remove-comment-reaction",
            FeedOwnCapability::Unfollow => "unfollow",
            FeedOwnCapability::UpdateActivity => "update-activity",
            FeedOwnCapability::UpdateComment => "update-comment",
            FeedOwnCapability::UpdateFeed => "update-feed",
            FeedOwnCapability::Unknown(raw) => raw,
        }
    }
}

impl From<String> for FeedOwnCapability {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "add-activity" => FeedOwnCapability::AddActivity,
            "add-activity-reaction" => FeedOwnCapability::AddActivityReaction,
            "add-comment" => FeedOwnCapability::AddComment,
            "add-comment-reaction" => FeedOwnCapability::AddCommentReaction,
            "bookmark-activity" => FeedOwnCapability::BookmarkActivity,
            "create-feed" => FeedOwnCapability::CreateFeed,
            "delete-bookmark" => FeedOwnCapability::DeleteBookmark,
            "delete-comment" => FeedOwnCapability::DeleteComment,
            "delete-feed" => FeedOwnCapability::DeleteFeed,
            "edit-bookmark" => FeedOwnCapability::EditBookmark,
            "follow" => FeedOwnCapability::Follow,
            "pin-activity" => FeedOwnCapability::PinActivity,
            "query-follows" => FeedOwnCapability::QueryFollows,
            "read-feed" => FeedOwnCapability::ReadFeed,
            "remove-activity" => FeedOwnCapability::RemoveActivity,
            "remove-activity-reaction" => FeedOwnCapability::RemoveActivityReaction,
            "remove-comment-reaction" => FeedOwnCapability::RemoveCommentReaction,
            "unfollow" => FeedOwnCapability::Unfollow,
            "update-activity" => FeedOwnCapability::UpdateActivity,
            "update-comment" => FeedOwnCapability::UpdateComment,
            "update-feed" => FeedOwnCapability::UpdateFeed,
            _ => FeedOwnCapability::Unknown(raw),
        }
    }
}

impl From<&str> for FeedOwnCapability {
    fn from(raw: &str) -> Self {
        raw.to_string().into()
    }
}

impl From<FeedOwnCapability> for String {
    fn from(capability: FeedOwnCapability) -> Self {
        match capability {
            FeedOwnCapability::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FeedOwnCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_is_kebab_case() {
        let json = serde_json::to_string(&FeedOwnCapability::AddActivityReaction).unwrap();
        assert_eq!(json, "\"add-activity-reaction\"");
        let parsed: FeedOwnCapability = serde_json::from_str("\"pin-activity\"").unwrap();
        assert_eq!(parsed, FeedOwnCapability::PinActivity);
    }

    #[test]
    fn unknown_capabilities_survive() {
        let parsed: FeedOwnCapability = serde_json::from_str("\"launch-rocket\"").unwrap();
        assert_eq!(parsed, FeedOwnCapability::Unknown("launch-rocket".into()));
        assert_eq!(parsed.to_string(), "launch-rocket");
    }
}
