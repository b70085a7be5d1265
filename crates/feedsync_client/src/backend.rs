//! Backend abstraction for feed operations.

use crate::error::ClientResult;
use async_trait::async_trait;
use feedsync_core::{FeedId, FeedMemberData, PollOptionData, PollVoteData};
use feedsync_protocol::{
    ActivityResponse, AddActivityRequest, AddBookmarkRequest, AddCommentRequest,
    AddReactionRequest, BookmarkResponse, CastPollVoteRequest, CommentReactionResponse,
    CommentResponse, CreatePollOptionRequest, CreatePollRequest, FeedResponse, FollowRequest,
    FollowResponse, GetOrCreateFeedRequest, GetOrCreateFeedResponse, OwnCapabilitiesBatchResponse,
    PagedResponse, PinResponse, PollResponse, QueryParams, ReactionResponse, UpdateActivityRequest,
    UpdateBookmarkRequest, UpdateCommentRequest, UpdateFeedRequest,
};

/// The REST side of the feeds service.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, in-memory for testing, recorded fixtures). Each
/// method maps to one backend endpoint and returns its decoded response;
/// state containers are never touched here.
#[async_trait]
pub trait FeedsBackend: Send + Sync {
    /// Loads a feed with its first pages, creating it if needed.
    async fn get_or_create_feed(
        &self,
        fid: &FeedId,
        request: &GetOrCreateFeedRequest,
    ) -> ClientResult<GetOrCreateFeedResponse>;

    /// Updates feed metadata.
    async fn update_feed(&self, fid: &FeedId, request: &UpdateFeedRequest)
        -> ClientResult<FeedResponse>;

    /// Deletes a feed.
    async fn delete_feed(&self, fid: &FeedId) -> ClientResult<()>;

    /// Queries members of a feed.
    async fn query_members(
        &self,
        fid: &FeedId,
        params: &QueryParams,
    ) -> ClientResult<PagedResponse<FeedMemberData>>;

    /// Queries activities across feeds.
    async fn query_activities(
        &self,
        params: &QueryParams,
    ) -> ClientResult<PagedResponse<ActivityResponse>>;

    /// Loads one activity.
    async fn get_activity(&self, activity_id: &str) -> ClientResult<ActivityResponse>;

    /// Publishes an activity.
    async fn add_activity(&self, request: &AddActivityRequest) -> ClientResult<ActivityResponse>;

    /// Edits an activity.
    async fn update_activity(
        &self,
        activity_id: &str,
        request: &UpdateActivityRequest,
    ) -> ClientResult<ActivityResponse>;

    /// Deletes an activity.
    async fn delete_activity(&self, activity_id: &str) -> ClientResult<()>;

    /// Pins an activity to a feed.
    async fn pin_activity(&self, fid: &FeedId, activity_id: &str) -> ClientResult<PinResponse>;

    /// Unpins an activity from a feed.
    async fn unpin_activity(&self, fid: &FeedId, activity_id: &str) -> ClientResult<PinResponse>;

    /// Reacts to an activity.
    async fn add_reaction(
        &self,
        activity_id: &str,
        request: &AddReactionRequest,
    ) -> ClientResult<ReactionResponse>;

    /// Removes the current user's reaction of `kind`.
    async fn delete_reaction(&self, activity_id: &str, kind: &str) -> ClientResult<ReactionResponse>;

    /// Bookmarks an activity.
    async fn add_bookmark(
        &self,
        activity_id: &str,
        request: &AddBookmarkRequest,
    ) -> ClientResult<BookmarkResponse>;

    /// Moves a bookmark between folders.
    async fn update_bookmark(
        &self,
        activity_id: &str,
        request: &UpdateBookmarkRequest,
    ) -> ClientResult<BookmarkResponse>;

    /// Removes a bookmark.
    async fn delete_bookmark(
        &self,
        activity_id: &str,
        folder_id: Option<&str>,
    ) -> ClientResult<BookmarkResponse>;

    /// Queries the current user's bookmarks.
    async fn query_bookmarks(
        &self,
        params: &QueryParams,
    ) -> ClientResult<PagedResponse<BookmarkResponse>>;

    /// Follows a feed.
    async fn follow(&self, request: &FollowRequest) -> ClientResult<FollowResponse>;

    /// Stops following a feed.
    async fn unfollow(&self, source: &FeedId, target: &FeedId) -> ClientResult<FollowResponse>;

    /// Accepts a follow request.
    async fn accept_follow(&self, source: &FeedId, target: &FeedId)
        -> ClientResult<FollowResponse>;

    /// Rejects a follow request.
    async fn reject_follow(&self, source: &FeedId, target: &FeedId)
        -> ClientResult<FollowResponse>;

    /// Queries follows.
    async fn query_follows(&self, params: &QueryParams)
        -> ClientResult<PagedResponse<FollowResponse>>;

    /// Adds a comment or reply.
    async fn add_comment(&self, request: &AddCommentRequest) -> ClientResult<CommentResponse>;

    /// Edits a comment.
    async fn update_comment(
        &self,
        comment_id: &str,
        request: &UpdateCommentRequest,
    ) -> ClientResult<CommentResponse>;

    /// Deletes a comment.
    async fn delete_comment(&self, comment_id: &str) -> ClientResult<CommentResponse>;

    /// Queries comments on an object.
    async fn query_comments(
        &self,
        object_id: &str,
        params: &QueryParams,
    ) -> ClientResult<PagedResponse<CommentResponse>>;

    /// Reacts to a comment.
    async fn add_comment_reaction(
        &self,
        comment_id: &str,
        request: &AddReactionRequest,
    ) -> ClientResult<CommentReactionResponse>;

    /// Removes the current user's comment reaction of `kind`.
    async fn delete_comment_reaction(
        &self,
        comment_id: &str,
        kind: &str,
    ) -> ClientResult<CommentReactionResponse>;

    /// Creates a poll (attach it with an activity).
    async fn create_poll(&self, request: &CreatePollRequest) -> ClientResult<PollResponse>;

    /// Closes a poll.
    async fn close_poll(&self, poll_id: &str) -> ClientResult<PollResponse>;

    /// Deletes a poll.
    async fn delete_poll(&self, poll_id: &str) -> ClientResult<()>;

    /// Votes on a poll.
    async fn cast_poll_vote(
        &self,
        activity_id: &str,
        poll_id: &str,
        request: &CastPollVoteRequest,
    ) -> ClientResult<PollVoteData>;

    /// Retracts a vote.
    async fn remove_poll_vote(
        &self,
        activity_id: &str,
        poll_id: &str,
        vote_id: &str,
    ) -> ClientResult<PollVoteData>;

    /// Adds an option to a poll.
    async fn create_poll_option(
        &self,
        poll_id: &str,
        request: &CreatePollOptionRequest,
    ) -> ClientResult<PollOptionData>;

    /// Removes an option from a poll.
    async fn delete_poll_option(&self, poll_id: &str, option_id: &str) -> ClientResult<()>;

    /// Queries votes of a poll.
    async fn query_poll_votes(
        &self,
        poll_id: &str,
        params: &QueryParams,
    ) -> ClientResult<PagedResponse<PollVoteData>>;

    /// Loads the current user's capabilities for several feeds.
    async fn own_capabilities_batch(
        &self,
        fids: &[FeedId],
    ) -> ClientResult<OwnCapabilitiesBatchResponse>;
}
