//! Response DTOs and envelopes.
//!
//! Entity DTOs follow the backend's JSON shape and convert into the core
//! models with `From`. The reverse conversions exist so fakes and fixtures
//! can answer with wire types built from models.

use chrono::{DateTime, Utc};
use feedsync_core::{
    ActivityData, ActivityPinData, BookmarkData, BookmarkFolderData, CommentData, FeedData,
    FeedId, FeedMemberData, FeedOwnCapability, FeedsReactionData, FollowData, FollowStatus,
    PaginationData, PaginationResult, PollData, PollOptionData, PollVoteData, ReactionGroupData,
    ReactionSummary, UserData,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Wire form of an activity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityResponse {
    /// Activity id.
    pub id: String,
    /// Activity type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Body text.
    pub text: Option<String>,
    /// Target feeds.
    pub feeds: Vec<FeedId>,
    /// Author.
    pub user: UserData,
    /// Visibility.
    pub visibility: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Last edit time.
    pub edited_at: Option<DateTime<Utc>>,
    /// Soft-delete time.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Popularity score.
    pub popularity: i32,
    /// Reaction groups by kind.
    pub reaction_groups: BTreeMap<String, ReactionGroupData>,
    /// Server-computed total; ignored in favour of the groups.
    pub reaction_count: u32,
    /// Requesting user's reactions.
    pub own_reactions: Vec<FeedsReactionData>,
    /// Recent reactions.
    pub latest_reactions: Vec<FeedsReactionData>,
    /// Total comments.
    pub comment_count: u32,
    /// Comment sample.
    pub comments: Vec<CommentResponse>,
    /// Total bookmarks.
    pub bookmark_count: u32,
    /// Requesting user's bookmarks.
    pub own_bookmarks: Vec<BookmarkResponse>,
    /// Attached poll.
    pub poll: Option<PollResponse>,
}

impl From<ActivityResponse> for ActivityData {
    fn from(dto: ActivityResponse) -> Self {
        ActivityData {
            id: dto.id,
            kind: dto.kind,
            text: dto.text,
            feeds: dto.feeds,
            user: dto.user,
            visibility: dto.visibility,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
            edited_at: dto.edited_at,
            deleted_at: dto.deleted_at,
            popularity: dto.popularity,
            reactions: ReactionSummary {
                groups: dto.reaction_groups,
                own: dto.own_reactions,
                latest: dto.latest_reactions,
            },
            comment_count: dto.comment_count,
            comments: dto.comments.into_iter().map(Into::into).collect(),
            bookmark_count: dto.bookmark_count,
            own_bookmarks: dto.own_bookmarks.into_iter().map(Into::into).collect(),
            poll: dto.poll.map(Into::into),
            comment_ledger: Default::default(),
        }
    }
}

impl From<ActivityData> for ActivityResponse {
    fn from(model: ActivityData) -> Self {
        let reaction_count = model.reaction_count();
        ActivityResponse {
            id: model.id,
            kind: model.kind,
            text: model.text,
            feeds: model.feeds,
            user: model.user,
            visibility: model.visibility,
            created_at: model.created_at,
            updated_at: model.updated_at,
            edited_at: model.edited_at,
            deleted_at: model.deleted_at,
            popularity: model.popularity,
            reaction_groups: model.reactions.groups,
            reaction_count,
            own_reactions: model.reactions.own,
            latest_reactions: model.reactions.latest,
            comment_count: model.comment_count,
            comments: model.comments.into_iter().map(Into::into).collect(),
            bookmark_count: model.bookmark_count,
            own_bookmarks: model.own_bookmarks.into_iter().map(Into::into).collect(),
            poll: model.poll.map(Into::into),
        }
    }
}

/// Wire form of a comment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentResponse {
    /// Comment id.
    pub id: String,
    /// Commented object id.
    pub object_id: String,
    /// Commented object kind.
    pub object_type: String,
    /// Parent comment.
    pub parent_id: Option<String>,
    /// Author.
    pub user: UserData,
    /// Body text.
    pub text: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete time.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Ranking score.
    pub score: i32,
    /// Reaction groups by kind.
    pub reaction_groups: BTreeMap<String, ReactionGroupData>,
    /// Requesting user's reactions.
    pub own_reactions: Vec<FeedsReactionData>,
    /// Recent reactions.
    pub latest_reactions: Vec<FeedsReactionData>,
    /// Total replies.
    pub reply_count: u32,
    /// Loaded replies; absent when not fetched.
    pub replies: Option<Vec<CommentResponse>>,
}

impl From<CommentResponse> for CommentData {
    fn from(dto: CommentResponse) -> Self {
        CommentData {
            id: dto.id,
            object_id: dto.object_id,
            object_type: dto.object_type,
            parent_id: dto.parent_id,
            user: dto.user,
            text: dto.text,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
            deleted_at: dto.deleted_at,
            score: dto.score,
            reactions: ReactionSummary {
                groups: dto.reaction_groups,
                own: dto.own_reactions,
                latest: dto.latest_reactions,
            },
            reply_count: dto.reply_count,
            replies: dto
                .replies
                .map(|replies| replies.into_iter().map(Into::into).collect()),
        }
    }
}

impl From<CommentData> for CommentResponse {
    fn from(model: CommentData) -> Self {
        CommentResponse {
            id: model.id,
            object_id: model.object_id,
            object_type: model.object_type,
            parent_id: model.parent_id,
            user: model.user,
            text: model.text,
            created_at: model.created_at,
            updated_at: model.updated_at,
            deleted_at: model.deleted_at,
            score: model.score,
            reaction_groups: model.reactions.groups,
            own_reactions: model.reactions.own,
            latest_reactions: model.reactions.latest,
            reply_count: model.reply_count,
            replies: model
                .replies
                .map(|replies| replies.into_iter().map(Into::into).collect()),
        }
    }
}

/// Wire form of a poll.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PollResponse {
    /// Poll id.
    pub id: String,
    /// Question.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Mutually exclusive voting.
    pub enforce_unique_vote: bool,
    /// Free-text answers accepted.
    pub allow_answers: bool,
    /// Voters may add options.
    pub allow_user_suggested_options: bool,
    /// Voting closed.
    pub is_closed: bool,
    /// Vote limit per user.
    pub max_votes_allowed: Option<u32>,
    /// Voting visibility.
    pub voting_visibility: String,
    /// Options.
    pub options: Vec<PollOptionData>,
    /// Votes per option.
    pub vote_counts_by_option: BTreeMap<String, u32>,
    /// Server-computed total; recomputed on conversion.
    pub vote_count: u32,
    /// Requesting user's votes.
    pub own_votes: Vec<PollVoteData>,
    /// Recent votes per option.
    pub latest_votes_by_option: BTreeMap<String, Vec<PollVoteData>>,
    /// Recent answers.
    pub latest_answers: Vec<PollVoteData>,
    /// Number of answers.
    pub answers_count: u32,
    /// Creator.
    pub created_by: Option<UserData>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl From<PollResponse> for PollData {
    fn from(dto: PollResponse) -> Self {
        let mut poll = PollData {
            id: dto.id,
            name: dto.name,
            description: dto.description,
            enforce_unique_vote: dto.enforce_unique_vote,
            allow_answers: dto.allow_answers,
            allow_user_suggested_options: dto.allow_user_suggested_options,
            is_closed: dto.is_closed,
            max_votes_allowed: dto.max_votes_allowed,
            voting_visibility: dto.voting_visibility,
            options: dto.options,
            vote_counts_by_option: dto.vote_counts_by_option,
            vote_count: 0,
            own_votes: dto.own_votes,
            latest_votes_by_option: dto.latest_votes_by_option,
            latest_answers: dto.latest_answers,
            answers_count: dto.answers_count,
            created_by: dto.created_by,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        };
        poll.recompute_vote_count();
        poll
    }
}

impl From<PollData> for PollResponse {
    fn from(model: PollData) -> Self {
        PollResponse {
            id: model.id,
            name: model.name,
            description: model.description,
            enforce_unique_vote: model.enforce_unique_vote,
            allow_answers: model.allow_answers,
            allow_user_suggested_options: model.allow_user_suggested_options,
            is_closed: model.is_closed,
            max_votes_allowed: model.max_votes_allowed,
            voting_visibility: model.voting_visibility,
            options: model.options,
            vote_counts_by_option: model.vote_counts_by_option,
            vote_count: model.vote_count,
            own_votes: model.own_votes,
            latest_votes_by_option: model.latest_votes_by_option,
            latest_answers: model.latest_answers,
            answers_count: model.answers_count,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Wire form of a bookmark.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookmarkResponse {
    /// Bookmarked activity.
    pub activity: ActivityResponse,
    /// Owner.
    pub user: UserData,
    /// Folder.
    pub folder: Option<BookmarkFolderData>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl From<BookmarkResponse> for BookmarkData {
    fn from(dto: BookmarkResponse) -> Self {
        BookmarkData {
            activity: dto.activity.into(),
            user: dto.user,
            folder: dto.folder,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        }
    }
}

impl From<BookmarkData> for BookmarkResponse {
    fn from(model: BookmarkData) -> Self {
        BookmarkResponse {
            activity: model.activity.into(),
            user: model.user,
            folder: model.folder,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Wire form of a feed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedResponse {
    /// Feed identity (`group:id`).
    pub feed: FeedId,
    /// Name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Creator.
    pub created_by: UserData,
    /// Visibility.
    pub visibility: Option<String>,
    /// Followers.
    pub follower_count: u32,
    /// Followed feeds.
    pub following_count: u32,
    /// Members.
    pub member_count: u32,
    /// Pinned activities.
    pub pin_count: u32,
    /// Requesting user's capabilities; absent from list endpoints.
    pub own_capabilities: Option<Vec<FeedOwnCapability>>,
    /// Requesting user's follows; absent from list endpoints.
    pub own_follows: Option<Vec<FollowResponse>>,
    /// Requesting user's membership.
    pub own_membership: Option<FeedMemberData>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl From<FeedResponse> for FeedData {
    fn from(dto: FeedResponse) -> Self {
        FeedData {
            feed: dto.feed,
            name: dto.name,
            description: dto.description,
            created_by: dto.created_by,
            visibility: dto.visibility,
            follower_count: dto.follower_count,
            following_count: dto.following_count,
            member_count: dto.member_count,
            pin_count: dto.pin_count,
            own_capabilities: dto
                .own_capabilities
                .map(|capabilities| capabilities.into_iter().collect()),
            own_follows: dto
                .own_follows
                .map(|follows| follows.into_iter().map(Into::into).collect()),
            own_membership: dto.own_membership,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        }
    }
}

impl From<FeedData> for FeedResponse {
    fn from(model: FeedData) -> Self {
        FeedResponse {
            feed: model.feed,
            name: model.name,
            description: model.description,
            created_by: model.created_by,
            visibility: model.visibility,
            follower_count: model.follower_count,
            following_count: model.following_count,
            member_count: model.member_count,
            pin_count: model.pin_count,
            own_capabilities: model
                .own_capabilities
                .map(|capabilities| capabilities.into_iter().collect()),
            own_follows: model
                .own_follows
                .map(|follows| follows.into_iter().map(Into::into).collect()),
            own_membership: model.own_membership,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Wire form of a follow.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowResponse {
    /// Following feed.
    pub source_feed: FeedResponse,
    /// Followed feed.
    pub target_feed: FeedResponse,
    /// State.
    pub status: FollowStatus,
    /// Push preference.
    pub push_preference: Option<String>,
    /// Acceptance time.
    pub request_accepted_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl From<FollowResponse> for FollowData {
    fn from(dto: FollowResponse) -> Self {
        FollowData {
            source_feed: dto.source_feed.into(),
            target_feed: dto.target_feed.into(),
            status: dto.status,
            push_preference: dto.push_preference,
            request_accepted_at: dto.request_accepted_at,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        }
    }
}

impl From<FollowData> for FollowResponse {
    fn from(model: FollowData) -> Self {
        FollowResponse {
            source_feed: model.source_feed.into(),
            target_feed: model.target_feed.into(),
            status: model.status,
            push_preference: model.push_preference,
            request_accepted_at: model.request_accepted_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Wire form of a pinned activity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PinResponse {
    /// Pinned activity.
    pub activity: ActivityResponse,
    /// Feed it is pinned to.
    pub feed: FeedId,
    /// Pinning user.
    pub user: UserData,
    /// Pin time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl From<PinResponse> for ActivityPinData {
    fn from(dto: PinResponse) -> Self {
        ActivityPinData {
            activity: dto.activity.into(),
            feed: dto.feed,
            user: dto.user,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        }
    }
}

impl From<ActivityPinData> for PinResponse {
    fn from(model: ActivityPinData) -> Self {
        PinResponse {
            activity: model.activity.into(),
            feed: model.feed,
            user: model.user,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Result of adding or removing an activity reaction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReactionResponse {
    /// The activity after the change.
    pub activity: ActivityResponse,
    /// The reaction added or removed.
    pub reaction: FeedsReactionData,
}

/// Result of adding or removing a comment reaction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommentReactionResponse {
    /// The comment after the change.
    pub comment: CommentResponse,
    /// The reaction added or removed.
    pub reaction: FeedsReactionData,
}

/// One page of a list query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResponse<T> {
    /// Items in server order.
    pub items: Vec<T>,
    /// Cursor of the next page.
    #[serde(default)]
    pub next: Option<String>,
    /// Cursor of the previous page.
    #[serde(default)]
    pub prev: Option<String>,
}

impl<T> PagedResponse<T> {
    /// Creates a page.
    pub fn new(items: Vec<T>, next: Option<String>, prev: Option<String>) -> Self {
        Self { items, next, prev }
    }

    /// Returns the cursors.
    pub fn pagination(&self) -> PaginationData {
        PaginationData::new(self.next.clone(), self.prev.clone())
    }

    /// Converts the items into models.
    pub fn into_page<M: From<T>>(self) -> PaginationResult<M> {
        let pagination = self.pagination();
        PaginationResult::new(self.items.into_iter().map(Into::into).collect(), pagination)
    }
}

/// Unread/unseen counters for notification feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotificationStatus {
    /// Unread notifications.
    pub unread: u32,
    /// Unseen notifications.
    pub unseen: u32,
}

/// Everything needed to populate a feed in one call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetOrCreateFeedResponse {
    /// The feed.
    pub feed: FeedResponse,
    /// First page of activities.
    pub activities: Vec<ActivityResponse>,
    /// Next activity page.
    pub next: Option<String>,
    /// Previous activity page.
    pub prev: Option<String>,
    /// Accepted follows targeting the feed.
    pub followers: Vec<FollowResponse>,
    /// Accepted follows made by the feed.
    pub following: Vec<FollowResponse>,
    /// Pending follows targeting the feed.
    pub follow_requests: Vec<FollowResponse>,
    /// First page of members.
    pub members: Vec<FeedMemberData>,
    /// Next member page.
    pub member_next: Option<String>,
    /// Previous member page.
    pub member_prev: Option<String>,
    /// Pinned activities.
    pub pinned_activities: Vec<PinResponse>,
    /// Requesting user's capabilities on the feed.
    pub own_capabilities: Vec<FeedOwnCapability>,
    /// Notification counters, for notification feeds.
    pub notification_status: Option<NotificationStatus>,
}

impl GetOrCreateFeedResponse {
    /// Activity cursors.
    pub fn activity_pagination(&self) -> PaginationData {
        PaginationData::new(self.next.clone(), self.prev.clone())
    }

    /// Member cursors.
    pub fn member_pagination(&self) -> PaginationData {
        PaginationData::new(self.member_next.clone(), self.member_prev.clone())
    }
}

/// Capabilities for a batch of feeds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OwnCapabilitiesBatchResponse {
    /// Capabilities by feed.
    pub capabilities: BTreeMap<FeedId, Vec<FeedOwnCapability>>,
}
