//! Activity facade: one activity, its comment thread and its poll.

use super::{log_failure, reaction_for};
use crate::client::ClientContext;
use crate::config::CommentsQuery;
use crate::error::{ClientError, ClientResult};
use crate::event::StateEvent;
use crate::state::{ActivityState, PageMode};
use feedsync_core::{
    ActivityData, CommentData, FeedId, FeedOwnCapability, FeedsReactionData, PaginationResult,
    PollData, PollOptionData, PollVoteData,
};
use feedsync_protocol::{
    AddCommentRequest, AddReactionRequest, CastPollVoteRequest, CreatePollOptionRequest,
    QueryParams, UpdateCommentRequest,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// One activity: loads it with its first page of comments and runs
/// comment, reaction and poll mutations whose results flow back into
/// [`ActivityState`].
pub struct Activity {
    context: Arc<ClientContext>,
    state: Arc<ActivityState>,
    fid: FeedId,
    comments: CommentsQuery,
}

impl Activity {
    pub(crate) fn new(
        context: Arc<ClientContext>,
        state: Arc<ActivityState>,
        fid: FeedId,
        comments: CommentsQuery,
    ) -> Self {
        Self {
            context,
            state,
            fid,
            comments,
        }
    }

    /// The activity's id.
    pub fn activity_id(&self) -> &str {
        self.state.activity_id()
    }

    /// The feed the activity is viewed in.
    pub fn fid(&self) -> &FeedId {
        &self.fid
    }

    /// The observable state.
    pub fn state(&self) -> &Arc<ActivityState> {
        &self.state
    }

    /// Cached capabilities of the current user on [`Activity::fid`].
    pub fn own_capabilities(&self) -> Option<BTreeSet<FeedOwnCapability>> {
        self.context.capabilities.get(&self.fid)
    }

    /// Loads the activity and the first page of its comments. State only
    /// changes if both calls succeed.
    pub async fn get(&self) -> ClientResult<ActivityData> {
        let previous = self.state.begin_load();
        let params = self.comments.params(self.context.config.default_page_size);
        let backend = &self.context.backend;
        let fetched = tokio::try_join!(
            backend.get_activity(self.activity_id()),
            backend.query_comments(self.activity_id(), &params),
        );
        let (activity, comments) = match fetched {
            Ok(fetched) => fetched,
            Err(err) => {
                self.state.fail_load(previous);
                log_failure("get_activity")(&err);
                return Err(err);
            }
        };

        let activity: ActivityData = activity.into();
        self.state.set_activity(activity.clone());
        self.state.apply_comment_page(
            comments.into_page(),
            self.comments.config(),
            PageMode::Replace,
        );
        self.context
            .fill_capabilities(BTreeSet::from([self.fid.clone()]))
            .await;
        Ok(activity)
    }

    /// Loads the next page of comments. Returns the new page.
    pub async fn query_more_comments(&self, limit: Option<u32>) -> ClientResult<Vec<CommentData>> {
        if !self.state.phase().is_loaded() {
            return Err(ClientError::NotLoaded { what: "comments" });
        }
        let next = self
            .state
            .comments_pagination()
            .next
            .ok_or(ClientError::NoMorePages)?;
        let query = self.state.comment_query();
        let limit = limit
            .or(self.comments.limit)
            .unwrap_or(self.context.config.default_page_size);
        let params = QueryParams::from_config(&query, Some(limit)).with_next(Some(next));

        let page: PaginationResult<CommentData> = self
            .context
            .backend
            .query_comments(self.activity_id(), &params)
            .await
            .inspect_err(log_failure("query_comments"))?
            .into_page();
        let models = page.models.clone();
        debug!(activity_id = self.activity_id(), count = models.len(), "loaded comment page");
        self.state.apply_comment_page(page, query, PageMode::Append);
        Ok(models)
    }

    /// Comments on the activity.
    pub async fn add_comment(&self, text: impl Into<String>) -> ClientResult<CommentData> {
        self.send_comment(AddCommentRequest::on_activity(self.activity_id(), text))
            .await
    }

    /// Replies to `parent_id`.
    pub async fn reply(
        &self,
        parent_id: impl Into<String>,
        text: impl Into<String>,
    ) -> ClientResult<CommentData> {
        self.send_comment(AddCommentRequest::on_activity(self.activity_id(), text).reply_to(parent_id))
            .await
    }

    async fn send_comment(&self, request: AddCommentRequest) -> ClientResult<CommentData> {
        let comment: CommentData = self
            .context
            .backend
            .add_comment(&request)
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

    /// Reacts to a comment.
    pub async fn add_comment_reaction(
        &self,
        comment_id: &str,
        request: &AddReactionRequest,
    ) -> ClientResult<FeedsReactionData> {
        let response = self
            .context
            .backend
            .add_comment_reaction(comment_id, request)
            .await
            .inspect_err(log_failure("add_comment_reaction"))?;
        let reaction = reaction_for(response.reaction, self.activity_id(), Some(comment_id));
        self.context
            .publish(StateEvent::CommentReactionAdded(reaction.clone()));
        Ok(reaction)
    }

    /// Removes the current user's reaction of `kind` from a comment.
    pub async fn delete_comment_reaction(
        &self,
        comment_id: &str,
        kind: &str,
    ) -> ClientResult<FeedsReactionData> {
        let response = self
            .context
            .backend
            .delete_comment_reaction(comment_id, kind)
            .await
            .inspect_err(log_failure("delete_comment_reaction"))?;
        let reaction = reaction_for(response.reaction, self.activity_id(), Some(comment_id));
        self.context
            .publish(StateEvent::CommentReactionDeleted(reaction.clone()));
        Ok(reaction)
    }

    /// Reacts to the activity.
    pub async fn add_reaction(&self, request: &AddReactionRequest) -> ClientResult<FeedsReactionData> {
        let response = self
            .context
            .backend
            .add_reaction(self.activity_id(), request)
            .await
            .inspect_err(log_failure("add_reaction"))?;
        let reaction = reaction_for(response.reaction, self.activity_id(), None);
        self.context
            .publish(StateEvent::ActivityReactionAdded(reaction.clone()));
        Ok(reaction)
    }

    /// Removes the current user's reaction of `kind` from the activity.
    pub async fn delete_reaction(&self, kind: &str) -> ClientResult<FeedsReactionData> {
        let response = self
            .context
            .backend
            .delete_reaction(self.activity_id(), kind)
            .await
            .inspect_err(log_failure("delete_reaction"))?;
        let reaction = reaction_for(response.reaction, self.activity_id(), None);
        self.context
            .publish(StateEvent::ActivityReactionDeleted(reaction.clone()));
        Ok(reaction)
    }

    fn poll_id(&self) -> ClientResult<String> {
        self.state
            .poll()
            .map(|poll| poll.id)
            .ok_or(ClientError::NotLoaded { what: "poll" })
    }

    /// Votes on the attached poll.
    pub async fn cast_poll_vote(&self, request: &CastPollVoteRequest) -> ClientResult<PollVoteData> {
        let poll_id = self.poll_id()?;
        let mut vote = self
            .context
            .backend
            .cast_poll_vote(self.activity_id(), &poll_id, request)
            .await
            .inspect_err(log_failure("cast_poll_vote"))?;
        if vote.poll_id.is_empty() {
            vote.poll_id = poll_id;
        }
        self.context.publish(StateEvent::PollVoteCasted(vote.clone()));
        Ok(vote)
    }

    /// Retracts a vote.
    pub async fn remove_poll_vote(&self, vote_id: &str) -> ClientResult<PollVoteData> {
        let poll_id = self.poll_id()?;
        let mut vote = self
            .context
            .backend
            .remove_poll_vote(self.activity_id(), &poll_id, vote_id)
            .await
            .inspect_err(log_failure("remove_poll_vote"))?;
        if vote.poll_id.is_empty() {
            vote.poll_id = poll_id;
        }
        self.context.publish(StateEvent::PollVoteRemoved(vote.clone()));
        Ok(vote)
    }

    /// Closes the attached poll.
    pub async fn close_poll(&self) -> ClientResult<PollData> {
        let poll_id = self.poll_id()?;
        let poll: PollData = self
            .context
            .backend
            .close_poll(&poll_id)
            .await
            .inspect_err(log_failure("close_poll"))?
            .into();
        self.context.publish(StateEvent::PollClosed { poll_id });
        Ok(poll)
    }

    /// Deletes the attached poll.
    pub async fn delete_poll(&self) -> ClientResult<()> {
        let poll_id = self.poll_id()?;
        self.context
            .backend
            .delete_poll(&poll_id)
            .await
            .inspect_err(log_failure("delete_poll"))?;
        self.context.publish(StateEvent::PollDeleted { poll_id });
        Ok(())
    }

    /// Adds an option to the attached poll.
    pub async fn create_poll_option(&self, text: impl Into<String>) -> ClientResult<PollOptionData> {
        let poll_id = self.poll_id()?;
        let request = CreatePollOptionRequest { text: text.into() };
        let option = self
            .context
            .backend
            .create_poll_option(&poll_id, &request)
            .await
            .inspect_err(log_failure("create_poll_option"))?;
        self.context.publish(StateEvent::PollOptionAdded {
            poll_id,
            option: option.clone(),
        });
        Ok(option)
    }

    /// Removes an option from the attached poll.
    pub async fn delete_poll_option(&self, option_id: &str) -> ClientResult<()> {
        let poll_id = self.poll_id()?;
        self.context
            .backend
            .delete_poll_option(&poll_id, option_id)
            .await
            .inspect_err(log_failure("delete_poll_option"))?;
        self.context.publish(StateEvent::PollOptionRemoved {
            poll_id,
            option_id: option_id.to_string(),
        });
        Ok(())
    }
}

impl std::fmt::Debug for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Activity")
            .field("fid", &self.fid)
            .field("state", &self.state)
            .finish()
    }
}
