//! Request bodies.

use feedsync_core::{FeedId, Filter, QueryConfiguration, Queryable, Sort, SortField};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One sort key as sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortParam {
    /// Remote field name.
    pub field: String,
    /// `1` ascending, `-1` descending.
    pub direction: i32,
}

impl SortParam {
    /// Renders a typed sort.
    pub fn from_sort<F: SortField>(sort: &Sort<F>) -> Self {
        Self {
            field: sort.field.remote_name().to_string(),
            direction: sort.direction.as_i32(),
        }
    }
}

/// Filter, sort and cursor of a paged list query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    /// Backend JSON filter.
    pub filter: Option<Value>,
    /// Sort keys, most significant first.
    pub sort: Vec<SortParam>,
    /// Page size.
    pub limit: Option<u32>,
    /// Cursor of the page to load after.
    pub next: Option<String>,
    /// Cursor of the page to load before.
    pub prev: Option<String>,
}

impl QueryParams {
    /// Renders a query configuration.
    pub fn from_config<M: Queryable>(config: &QueryConfiguration<M>, limit: Option<u32>) -> Self {
        Self {
            filter: config.filter.as_ref().map(Filter::to_json),
            sort: config.sort.iter().map(SortParam::from_sort).collect(),
            limit,
            next: None,
            prev: None,
        }
    }

    /// Sets the next-page cursor.
    pub fn with_next(mut self, next: Option<String>) -> Self {
        self.next = next;
        self
    }
}

/// Parameters of a get-or-create feed call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetOrCreateFeedRequest {
    /// Activity query.
    pub activities: QueryParams,
    /// Follower page size.
    pub follower_limit: Option<u32>,
    /// Following page size.
    pub following_limit: Option<u32>,
    /// Member page size.
    pub member_limit: Option<u32>,
    /// Subscribe to real-time events for the feed.
    pub watch: bool,
}

/// Body of an update-feed call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateFeedRequest {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New visibility.
    pub visibility: Option<String>,
}

/// Body of an add-activity call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AddActivityRequest {
    /// Activity type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Body text.
    pub text: Option<String>,
    /// Target feeds.
    pub feeds: Vec<FeedId>,
    /// Visibility.
    pub visibility: Option<String>,
    /// Poll to attach.
    pub poll_id: Option<String>,
}

impl AddActivityRequest {
    /// A text post into `feeds`.
    pub fn post(text: impl Into<String>, feeds: Vec<FeedId>) -> Self {
        Self {
            kind: "post".to_string(),
            text: Some(text.into()),
            feeds,
            ..Default::default()
        }
    }
}

/// Body of an update-activity call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateActivityRequest {
    /// New text.
    pub text: Option<String>,
    /// New visibility.
    pub visibility: Option<String>,
}

/// Body of an add-comment call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AddCommentRequest {
    /// Commented object id.
    pub object_id: String,
    /// Commented object kind.
    pub object_type: String,
    /// Parent comment, for replies.
    pub parent_id: Option<String>,
    /// Body text.
    pub text: String,
}

impl AddCommentRequest {
    /// A comment on an activity.
    pub fn on_activity(activity_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            object_id: activity_id.into(),
            object_type: "activity".to_string(),
            parent_id: None,
            text: text.into(),
        }
    }

    /// Makes this a reply to `parent_id`.
    pub fn reply_to(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

/// Body of an update-comment call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateCommentRequest {
    /// New text.
    pub text: Option<String>,
}

/// Body of an add-reaction call (activities and comments).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AddReactionRequest {
    /// Reaction kind.
    #[serde(rename = "type")]
    pub kind: String,
    /// Replace the user's other reactions on the same target.
    pub enforce_unique: bool,
}

impl AddReactionRequest {
    /// A reaction of `kind`.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            enforce_unique: false,
        }
    }
}

/// Body of an add-bookmark call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AddBookmarkRequest {
    /// Existing folder.
    pub folder_id: Option<String>,
    /// Name of a folder to create.
    pub new_folder: Option<String>,
}

/// Body of an update-bookmark call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateBookmarkRequest {
    /// Target folder.
    pub folder_id: Option<String>,
    /// Name of a folder to create and move into.
    pub new_folder: Option<String>,
}

/// Body of a follow call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FollowRequest {
    /// The following feed.
    pub source: FeedId,
    /// The feed to follow.
    pub target: FeedId,
    /// Push preference.
    pub push_preference: Option<String>,
    /// Post a notification activity to the target.
    pub create_notification_activity: bool,
}

impl FollowRequest {
    /// A follow from `source` to `target`.
    pub fn new(source: FeedId, target: FeedId) -> Self {
        Self {
            source,
            target,
            ..Default::default()
        }
    }
}

/// Body of a create-poll call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreatePollRequest {
    /// Question.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Option labels.
    pub options: Vec<String>,
    /// Mutually exclusive voting.
    pub enforce_unique_vote: bool,
    /// Accept free-text answers.
    pub allow_answers: bool,
    /// Voters may add options.
    pub allow_user_suggested_options: bool,
    /// Vote limit per user.
    pub max_votes_allowed: Option<u32>,
    /// `public` or `anonymous`.
    pub voting_visibility: Option<String>,
}

/// Body of a cast-vote call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CastPollVoteRequest {
    /// Chosen option.
    pub option_id: Option<String>,
    /// Free-text answer.
    pub answer_text: Option<String>,
}

impl CastPollVoteRequest {
    /// A vote for `option_id`.
    pub fn option(option_id: impl Into<String>) -> Self {
        Self {
            option_id: Some(option_id.into()),
            answer_text: None,
        }
    }

    /// A free-text answer.
    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            option_id: None,
            answer_text: Some(text.into()),
        }
    }
}

/// Body of a create-option call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreatePollOptionRequest {
    /// Option label.
    pub text: String,
}
