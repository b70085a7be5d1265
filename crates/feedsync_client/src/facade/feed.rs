//! Feed facade.

use super::{log_failure, reaction_for};
use crate::client::ClientContext;
use crate::config::FeedQuery;
use crate::error::{ClientError, ClientResult};
use crate::event::StateEvent;
use crate::state::{FeedSnapshot, FeedState, PageMode};
use feedsync_core::{
    ActivityData, ActivityPinData, BookmarkData, CommentData, FeedData, FeedId, FeedMemberData,
    FeedsReactionData, FollowData, PaginationResult,
};
use feedsync_protocol::{
    AddActivityRequest, AddBookmarkRequest, AddCommentRequest, AddReactionRequest,
    CreatePollRequest, FollowRequest, QueryParams, UpdateActivityRequest, UpdateBookmarkRequest,
    UpdateCommentRequest, UpdateFeedRequest,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// One feed: loads it, pages through its activities and members, and runs
/// mutations whose results flow back into [`FeedState`].
pub struct Feed {
    context: Arc<ClientContext>,
    state: Arc<FeedState>,
    query: FeedQuery,
}

impl Feed {
    pub(crate) fn new(context: Arc<ClientContext>, state: Arc<FeedState>, query: FeedQuery) -> Self {
        Self {
            context,
            state,
            query,
        }
    }

    /// The feed's identity.
    pub fn fid(&self) -> &FeedId {
        &self.query.fid
    }

    /// The observable state.
    pub fn state(&self) -> &Arc<FeedState> {
        &self.state
    }

    /// The query the feed is loaded with.
    pub fn query(&self) -> &FeedQuery {
        &self.query
    }

    /// Loads (creating if needed) the feed and replaces all state with the
    /// result.
    pub async fn get(&self) -> ClientResult<FeedData> {
        let previous = self.state.begin_load();
        let request = self.query.to_request(self.context.config.default_page_size);
        let response = match self
            .context
            .backend
            .get_or_create_feed(&self.query.fid, &request)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                self.state.fail_load(previous);
                log_failure("get_or_create_feed")(&err);
                return Err(err);
            }
        };

        let snapshot = FeedSnapshot::from(response);
        let feed = snapshot.feed.clone();
        let activity_feeds: BTreeSet<FeedId> = snapshot
            .activities
            .models
            .iter()
            .flat_map(|activity| activity.feeds.iter().cloned())
            .filter(|fid| *fid != self.query.fid)
            .collect();
        self.state
            .apply_snapshot(snapshot, self.query.activity_config());

        if let Some(capabilities) = feed.own_capabilities.clone() {
            self.context
                .save_capabilities(BTreeMap::from([(self.query.fid.clone(), capabilities)]));
        }
        self.context.fill_capabilities(activity_feeds).await;
        Ok(feed)
    }

    /// Loads the next page of activities. Returns the new page.
    pub async fn query_more_activities(
        &self,
        limit: Option<u32>,
    ) -> ClientResult<Vec<ActivityData>> {
        let next = self.next_cursor(self.state.activities_pagination().next)?;
        let query = self.state.activity_query();
        let limit = limit
            .or(self.query.activity_limit)
            .unwrap_or(self.context.config.default_page_size);
        let mut request = self.query.to_request(self.context.config.default_page_size);
        request.activities = QueryParams::from_config(&query, Some(limit)).with_next(Some(next));

        let response = self
            .context
            .backend
            .get_or_create_feed(&self.query.fid, &request)
            .await
            .inspect_err(log_failure("query_more_activities"))?;
        let pagination = response.activity_pagination();
        let models: Vec<ActivityData> = response.activities.into_iter().map(Into::into).collect();
        debug!(fid = %self.query.fid, count = models.len(), "loaded activity page");
        self.state.apply_activity_page(
            PaginationResult::new(models.clone(), pagination),
            query,
            PageMode::Append,
        );
        Ok(models)
    }

    /// Loads the next page of members. Returns the new page.
    pub async fn query_more_members(&self, limit: Option<u32>) -> ClientResult<Vec<FeedMemberData>> {
        let next = self.next_cursor(self.state.members_pagination().next)?;
        let query = self.state.member_query();
        let limit = limit
            .or(self.query.member_limit)
            .unwrap_or(self.context.config.default_page_size);
        let params = QueryParams::from_config(&query, Some(limit)).with_next(Some(next));

        let page: PaginationResult<FeedMemberData> = self
            .context
            .backend
            .query_members(&self.query.fid, &params)
            .await
            .inspect_err(log_failure("query_members"))?
            .into_page();
        let models = page.models.clone();
        self.state.apply_member_page(page, query, PageMode::Append);
        Ok(models)
    }

    fn next_cursor(&self, next: Option<String>) -> ClientResult<String> {
        if !self.state.phase().is_loaded() {
            return Err(ClientError::NotLoaded { what: "feed" });
        }
        next.ok_or(ClientError::NoMorePages)
    }

    /// Updates the feed's metadata.
    pub async fn update_feed(&self, request: &UpdateFeedRequest) -> ClientResult<FeedData> {
        let feed: FeedData = self
            .context
            .backend
            .update_feed(&self.query.fid, request)
            .await
            .inspect_err(log_failure("update_feed"))?
            .into();
        self.context.publish(StateEvent::FeedUpdated(feed.clone()));
        Ok(feed)
    }

    /// Deletes the feed.
    pub async fn delete_feed(&self) -> ClientResult<()> {
        self.context
            .backend
            .delete_feed(&self.query.fid)
            .await
            .inspect_err(log_failure("delete_feed"))?;
        self.context
            .publish(StateEvent::FeedDeleted(self.query.fid.clone()));
        Ok(())
    }

    /// Publishes an activity. An empty target list posts into this feed.
    pub async fn add_activity(&self, mut request: AddActivityRequest) -> ClientResult<ActivityData> {
        if request.feeds.is_empty() {
            request.feeds.push(self.query.fid.clone());
        }
        let activity: ActivityData = self
            .context
            .backend
            .add_activity(&request)
            .await
            .inspect_err(log_failure("add_activity"))?
            .into();
        self.context.publish(StateEvent::ActivityAdded {
            fid: None,
            activity: activity.clone(),
        });
        Ok(activity)
    }

    /// Edits an activity.
    pub async fn update_activity(
        &self,
        activity_id: &str,
        request: &UpdateActivityRequest,
    ) -> ClientResult<ActivityData> {
        let activity: ActivityData = self
            .context
            .backend
            .update_activity(activity_id, request)
            .await
            .inspect_err(log_failure("update_activity"))?
            .into();
        self.context
            .publish(StateEvent::ActivityUpdated(activity.clone()));
        Ok(activity)
    }

    /// Deletes an activity.
    pub async fn delete_activity(&self, activity_id: &str) -> ClientResult<()> {
        self.context
            .backend
            .delete_activity(activity_id)
            .await
            .inspect_err(log_failure("delete_activity"))?;
        self.context.publish(StateEvent::ActivityDeleted {
            activity_id: activity_id.to_string(),
        });
        Ok(())
    }

    /// Creates a poll and publishes an activity carrying it into this feed.
    pub async fn create_poll(
        &self,
        request: &CreatePollRequest,
        activity_kind: impl Into<String>,
    ) -> ClientResult<ActivityData> {
        let poll = self
            .context
            .backend
            .create_poll(request)
            .await
            .inspect_err(log_failure("create_poll"))?;
        let activity = AddActivityRequest {
            kind: activity_kind.into(),
            feeds: vec![self.query.fid.clone()],
            poll_id: Some(poll.id),
            ..Default::default()
        };
        self.add_activity(activity).await
    }

    /// Pins an activity to this feed.
    pub async fn pin(&self, activity_id: &str) -> ClientResult<ActivityPinData> {
        let mut pin: ActivityPinData = self
            .context
            .backend
            .pin_activity(&self.query.fid, activity_id)
            .await
            .inspect_err(log_failure("pin_activity"))?
            .into();
        pin.feed = self.query.fid.clone();
        self.context.publish(StateEvent::ActivityPinned(pin.clone()));
        Ok(pin)
    }

    /// Unpins an activity from this feed.
    pub async fn unpin(&self, activity_id: &str) -> ClientResult<()> {
        self.context
            .backend
            .unpin_activity(&self.query.fid, activity_id)
            .await
            .inspect_err(log_failure("unpin_activity"))?;
        self.context.publish(StateEvent::ActivityUnpinned {
            fid: self.query.fid.clone(),
            activity_id: activity_id.to_string(),
        });
        Ok(())
    }

    /// Reacts to an activity.
    pub async fn add_reaction(
        &self,
        activity_id: &str,
        request: &AddReactionRequest,
    ) -> ClientResult<FeedsReactionData> {
        let response = self
            .context
            .backend
            .add_reaction(activity_id, request)
            .await
            .inspect_err(log_failure("add_reaction"))?;
        let reaction = reaction_for(response.reaction, activity_id, None);
        self.context
            .publish(StateEvent::ActivityReactionAdded(reaction.clone()));
        Ok(reaction)
    }

    /// Removes the current user's reaction of `kind`.
    pub async fn delete_reaction(
        &self,
        activity_id: &str,
        kind: &str,
    ) -> ClientResult<FeedsReactionData> {
        let response = self
            .context
            .backend
            .delete_reaction(activity_id, kind)
            .await
            .inspect_err(log_failure("delete_reaction"))?;
        let reaction = reaction_for(response.reaction, activity_id, None);
        self.context
            .publish(StateEvent::ActivityReactionDeleted(reaction.clone()));
        Ok(reaction)
    }

    /// Bookmarks an activity.
    pub async fn add_bookmark(
        &self,
        activity_id: &str,
        request: &AddBookmarkRequest,
    ) -> ClientResult<BookmarkData> {
        let bookmark: BookmarkData = self
            .context
            .backend
            .add_bookmark(activity_id, request)
            .await
            .inspect_err(log_failure("add_bookmark"))?
            .into();
        self.context
            .publish(StateEvent::BookmarkAdded(bookmark.clone()));
        Ok(bookmark)
    }

    /// Moves a bookmark to another folder.
    pub async fn update_bookmark(
        &self,
        activity_id: &str,
        request: &UpdateBookmarkRequest,
    ) -> ClientResult<BookmarkData> {
        let bookmark: BookmarkData = self
            .context
            .backend
            .update_bookmark(activity_id, request)
            .await
            .inspect_err(log_failure("update_bookmark"))?
            .into();
        self.context
            .publish(StateEvent::BookmarkUpdated(bookmark.clone()));
        Ok(bookmark)
    }

    /// Removes a bookmark.
    pub async fn delete_bookmark(
        &self,
        activity_id: &str,
        folder_id: Option<&str>,
    ) -> ClientResult<BookmarkData> {
        let bookmark: BookmarkData = self
            .context
            .backend
            .delete_bookmark(activity_id, folder_id)
            .await
            .inspect_err(log_failure("delete_bookmark"))?
            .into();
        self.context
            .publish(StateEvent::BookmarkDeleted(bookmark.clone()));
        Ok(bookmark)
    }

    /// Comments on an activity of this feed.
    pub async fn add_comment(&self, request: &AddCommentRequest) -> ClientResult<CommentData> {
        let comment: CommentData = self
            .context
            .backend
            .add_comment(request)
            .await
            .inspect_err(log_failure("add_comment"))?
            .into();
        self.context.publish(StateEvent::CommentAdded(comment.clone()));
        Ok(comment)
    }

    /// Edits a comment.
    pub async fn update_comment(
        &self,
        comment_id: &str,
        request: &UpdateCommentRequest,
    ) -> ClientResult<CommentData> {
        let comment: CommentData = self
            .context
            .backend
            .update_comment(comment_id, request)
            .await
            .inspect_err(log_failure("update_comment"))?
            .into();
        self.context
            .publish(StateEvent::CommentUpdated(comment.clone()));
        Ok(comment)
    }

    /// Deletes a comment.
    pub async fn delete_comment(&self, comment_id: &str) -> ClientResult<CommentData> {
        let comment: CommentData = self
            .context
            .backend
            .delete_comment(comment_id)
            .await
            .inspect_err(log_failure("delete_comment"))?
            .into();
        self.context
            .publish(StateEvent::CommentDeleted(comment.clone()));
        Ok(comment)
    }

    /// Follows `target` from this feed.
    pub async fn follow(&self, target: &FeedId) -> ClientResult<FollowData> {
        self.follow_with(FollowRequest::new(self.query.fid.clone(), target.clone()))
            .await
    }

    /// Follows with explicit request options. `request.source` should be
    /// this feed.
    pub async fn follow_with(&self, request: FollowRequest) -> ClientResult<FollowData> {
        let follow: FollowData = self
            .context
            .backend
            .follow(&request)
            .await
            .inspect_err(log_failure("follow"))?
            .into();
        self.context.publish(StateEvent::FollowAdded(follow.clone()));
        Ok(follow)
    }

    /// Stops following `target`.
    pub async fn unfollow(&self, target: &FeedId) -> ClientResult<FollowData> {
        let follow: FollowData = self
            .context
            .backend
            .unfollow(&self.query.fid, target)
            .await
            .inspect_err(log_failure("unfollow"))?
            .into();
        self.context
            .publish(StateEvent::FollowDeleted(follow.clone()));
        Ok(follow)
    }

    /// Accepts `source`'s request to follow this feed.
    pub async fn accept_follow(&self, source: &FeedId) -> ClientResult<FollowData> {
        let follow: FollowData = self
            .context
            .backend
            .accept_follow(source, &self.query.fid)
            .await
            .inspect_err(log_failure("accept_follow"))?
            .into();
        self.context
            .publish(StateEvent::FollowUpdated(follow.clone()));
        Ok(follow)
    }

    /// Rejects `source`'s request to follow this feed.
    pub async fn reject_follow(&self, source: &FeedId) -> ClientResult<FollowData> {
        let follow: FollowData = self
            .context
            .backend
            .reject_follow(source, &self.query.fid)
            .await
            .inspect_err(log_failure("reject_follow"))?
            .into();
        self.context
            .publish(StateEvent::FollowUpdated(follow.clone()));
        Ok(follow)
    }
}

impl std::fmt::Debug for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feed")
            .field("fid", &self.query.fid)
            .field("state", &self.state)
            .finish()
    }
}
