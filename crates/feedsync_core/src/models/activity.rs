//! Activities.

use super::bookmark::BookmarkData;
use super::comment::{CommentData, ReplyInsert};
use super::ledger::CommentLedger;
use super::poll::{PollData, PollOptionData, PollVoteData};
use super::reaction::{FeedsReactionData, ReactionSummary};
use super::user::UserData;
use crate::error::{CoreError, CoreResult};
use crate::ids::FeedId;
use crate::query::{FilterField, FilterValue, Queryable, Sort, SortField};
use crate::sorted::{Identifiable, SortedVec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Top-level comments kept in an activity's comment sample.
pub const COMMENT_SAMPLE_LIMIT: usize = 25;

/// An activity published into one or more feeds.
///
/// `reactions.groups` is the source of truth for the reaction count.
/// `comments` and `own_bookmarks` are partial local indices; `comment_count`
/// and `bookmark_count` are the server totals, moved independently by the
/// mutators below and floored at zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityData {
    /// Activity id.
    pub id: String,
    /// Activity type (`post`, `poll`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Body text.
    pub text: Option<String>,
    /// Feeds the activity was published into.
    pub feeds: Vec<FeedId>,
    /// Author.
    pub user: UserData,
    /// `public`, `private` or `tag`.
    pub visibility: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Last edit time.
    pub edited_at: Option<DateTime<Utc>>,
    /// Soft-delete time.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Server-side popularity score.
    pub popularity: i32,
    /// Reactions.
    pub reactions: ReactionSummary,
    /// Total comments, replies included.
    pub comment_count: u32,
    /// Sample of loaded comments.
    pub comments: Vec<CommentData>,
    /// Total bookmarks.
    pub bookmark_count: u32,
    /// The current user's bookmarks of this activity.
    pub own_bookmarks: Vec<BookmarkData>,
    /// Attached poll.
    pub poll: Option<PollData>,
    /// Comments that already moved `comment_count`.
    #[serde(skip)]
    pub comment_ledger: CommentLedger,
}

impl ActivityData {
    /// Total reactions across all kinds.
    pub fn reaction_count(&self) -> u32 {
        self.reactions.count()
    }

    /// Returns true if the activity was published into `fid`.
    pub fn belongs_to(&self, fid: &FeedId) -> bool {
        self.feeds.contains(fid)
    }

    /// Returns true if the current user bookmarked this activity.
    pub fn is_bookmarked(&self) -> bool {
        !self.own_bookmarks.is_empty()
    }

    /// Records a reaction. Returns `false` for an already known reaction.
    pub fn add_reaction(&mut self, reaction: FeedsReactionData, current_user_id: &str) -> bool {
        self.reactions.add(reaction, current_user_id)
    }

    /// Records a removed reaction.
    pub fn remove_reaction(&mut self, reaction: &FeedsReactionData, current_user_id: &str) -> bool {
        self.reactions.remove(reaction, current_user_id)
    }

    /// Refreshes a known reaction.
    pub fn update_reaction(&mut self, reaction: FeedsReactionData) -> bool {
        self.reactions.update(reaction)
    }

    /// Records a new comment (or reply) on this activity.
    ///
    /// A reply whose parent is not loaded still counts, once per comment id.
    /// Returns `false` for a comment that was already loaded or counted.
    /// The sample keeps the newest [`COMMENT_SAMPLE_LIMIT`] top-level
    /// comments.
    pub fn add_comment(&mut self, comment: CommentData) -> bool {
        let id = comment.id.clone();
        let inserted = match CommentData::insert_into(&mut self.comments, comment) {
            ReplyInsert::Duplicate => return false,
            ReplyInsert::Inserted => true,
            ReplyInsert::ParentMissing => false,
        };
        if self.comments.len() > COMMENT_SAMPLE_LIMIT {
            if let Some(oldest) = self
                .comments
                .iter()
                .enumerate()
                .min_by_key(|(_, comment)| comment.created_at)
                .map(|(index, _)| index)
            {
                self.comments.remove(oldest);
            }
        }
        if !self.comment_ledger.added.record(&id) {
            return inserted;
        }
        self.comment_count += 1;
        true
    }

    /// Records a deleted comment.
    ///
    /// Decrements once per comment id, when the comment was loaded or when
    /// some comments are known to be unloaded.
    pub fn remove_comment(&mut self, comment: &CommentData) -> bool {
        let loaded = CommentData::loaded_count(&self.comments);
        let removed = CommentData::remove_from(&mut self.comments, comment);
        if !self.comment_ledger.removed.record(&comment.id) {
            return removed;
        }
        if removed || (self.comment_count as usize) > loaded {
            self.comment_count = self.comment_count.saturating_sub(1);
        }
        removed
    }

    /// Merges an updated comment into the loaded sample.
    pub fn update_comment(&mut self, comment: CommentData) -> bool {
        CommentData::replace_in(&mut self.comments, comment)
    }

    /// Records a reaction on a loaded comment.
    pub fn add_comment_reaction(
        &mut self,
        comment_id: &str,
        reaction: FeedsReactionData,
        current_user_id: &str,
    ) -> bool {
        CommentData::find_in_mut(&mut self.comments, comment_id)
            .map_or(false, |comment| comment.add_reaction(reaction, current_user_id))
    }

    /// Records a removed reaction on a loaded comment.
    pub fn remove_comment_reaction(
        &mut self,
        comment_id: &str,
        reaction: &FeedsReactionData,
        current_user_id: &str,
    ) -> bool {
        CommentData::find_in_mut(&mut self.comments, comment_id)
            .map_or(false, |comment| comment.remove_reaction(reaction, current_user_id))
    }

    /// Records a bookmark.
    ///
    /// The current user's bookmarks are guarded by membership in
    /// `own_bookmarks`; other users' bookmarks always count.
    pub fn add_bookmark(&mut self, bookmark: BookmarkData, current_user_id: &str) -> bool {
        if bookmark.user.id == current_user_id && !self.own_bookmarks.insert_by_id(bookmark) {
            return false;
        }
        self.bookmark_count += 1;
        true
    }

    /// Records a removed bookmark. Floors at zero.
    pub fn remove_bookmark(&mut self, bookmark: &BookmarkData, current_user_id: &str) -> bool {
        let was_own = self.own_bookmarks.sorted_remove(&bookmark.id()).is_some();
        if bookmark.user.id == current_user_id && !was_own {
            return false;
        }
        self.bookmark_count = self.bookmark_count.saturating_sub(1);
        true
    }

    /// Refreshes one of the current user's bookmarks (e.g. moved folder).
    pub fn update_bookmark(&mut self, bookmark: BookmarkData) -> bool {
        self.own_bookmarks.replace_by_id(bookmark)
    }

    /// Substitutes an incoming copy of this activity.
    ///
    /// Broadcast payloads do not carry the current user's reactions,
    /// bookmarks or votes, so those are kept from the local copy when the
    /// incoming payload omits them.
    pub fn merge(&mut self, mut incoming: ActivityData) {
        if incoming.reactions.own.is_empty() {
            incoming.reactions.own = std::mem::take(&mut self.reactions.own);
        }
        if incoming.own_bookmarks.is_empty() {
            incoming.own_bookmarks = std::mem::take(&mut self.own_bookmarks);
        }
        incoming.comment_ledger = std::mem::take(&mut self.comment_ledger);
        if incoming.comments.is_empty() {
            incoming.comments = std::mem::take(&mut self.comments);
        }
        if let Some(poll) = incoming.poll.take() {
            incoming.poll = Some(match self.poll.take() {
                Some(mut local) if local.id == poll.id => {
                    local.merge(poll);
                    local
                }
                _ => poll,
            });
        }
        *self = incoming;
    }

    /// Attaches or replaces the poll.
    pub fn set_poll(&mut self, poll: PollData) {
        match self.poll.as_mut() {
            Some(local) if local.id == poll.id => local.merge(poll),
            _ => {
                self.poll = Some(poll);
            }
        }
    }

    /// Detaches the poll if its id matches.
    pub fn remove_poll(&mut self, poll_id: &str) -> bool {
        if self.poll.as_ref().map_or(false, |poll| poll.id == poll_id) {
            self.poll = None;
            true
        } else {
            false
        }
    }

    /// Closes the poll if its id matches.
    pub fn close_poll(&mut self, poll_id: &str) -> bool {
        self.poll_mut(poll_id).map(PollData::close).is_some()
    }

    /// Records a vote on the poll.
    pub fn cast_poll_vote(&mut self, vote: PollVoteData, current_user_id: &str) -> bool {
        let poll_id = vote.poll_id.clone();
        self.poll_mut(&poll_id)
            .map(|poll| poll.cast_vote(vote, current_user_id))
            .is_some()
    }

    /// Records a retracted vote on the poll.
    pub fn remove_poll_vote(&mut self, vote: &PollVoteData, current_user_id: &str) -> bool {
        self.poll_mut(&vote.poll_id)
            .map_or(false, |poll| poll.remove_vote(vote, current_user_id))
    }

    /// Adds an option to the poll.
    pub fn add_poll_option(&mut self, poll_id: &str, option: PollOptionData) -> bool {
        self.poll_mut(poll_id)
            .map_or(false, |poll| poll.add_option(option))
    }

    /// Refreshes an option of the poll.
    pub fn update_poll_option(&mut self, poll_id: &str, option: PollOptionData) -> bool {
        self.poll_mut(poll_id)
            .map_or(false, |poll| poll.update_option(option))
    }

    /// Removes an option from the poll.
    pub fn remove_poll_option(&mut self, poll_id: &str, option_id: &str) -> bool {
        self.poll_mut(poll_id)
            .map_or(false, |poll| poll.remove_option(option_id))
    }

    fn poll_mut(&mut self, poll_id: &str) -> Option<&mut PollData> {
        self.poll.as_mut().filter(|poll| poll.id == poll_id)
    }
}

impl Identifiable for ActivityData {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}

/// Sort fields for activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySortField {
    /// Creation time.
    CreatedAt,
    /// Popularity score.
    Popularity,
    /// Number of reactions.
    ReactionCount,
    /// Number of comments.
    CommentCount,
}

impl SortField for ActivitySortField {
    type Model = ActivityData;

    fn remote_name(&self) -> &'static str {
        match self {
            ActivitySortField::CreatedAt => "created_at",
            ActivitySortField::Popularity => "popularity",
            ActivitySortField::ReactionCount => "reaction_count",
            ActivitySortField::CommentCount => "comment_count",
        }
    }

    fn compare(&self, lhs: &ActivityData, rhs: &ActivityData) -> Ordering {
        match self {
            ActivitySortField::CreatedAt => lhs.created_at.cmp(&rhs.created_at),
            ActivitySortField::Popularity => lhs.popularity.cmp(&rhs.popularity),
            ActivitySortField::ReactionCount => lhs.reaction_count().cmp(&rhs.reaction_count()),
            ActivitySortField::CommentCount => lhs.comment_count.cmp(&rhs.comment_count),
        }
    }
}

impl FromStr for ActivitySortField {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "created_at" => Ok(ActivitySortField::CreatedAt),
            "popularity" => Ok(ActivitySortField::Popularity),
            "reaction_count" => Ok(ActivitySortField::ReactionCount),
            "comment_count" => Ok(ActivitySortField::CommentCount),
            other => Err(CoreError::unknown_sort_field("activity", other)),
        }
    }
}

/// Filter fields for activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityFilterField {
    /// Activity id.
    Id,
    /// Activity type.
    Kind,
    /// Author id.
    UserId,
    /// Feeds the activity was published into.
    Feeds,
}

impl FilterField for ActivityFilterField {
    type Model = ActivityData;

    fn remote_name(&self) -> &'static str {
        match self {
            ActivityFilterField::Id => "id",
            ActivityFilterField::Kind => "activity_type",
            ActivityFilterField::UserId => "user_id",
            ActivityFilterField::Feeds => "feed",
        }
    }

    fn value_of(&self, model: &ActivityData) -> FilterValue {
        match self {
            ActivityFilterField::Id => model.id.as_str().into(),
            ActivityFilterField::Kind => model.kind.as_str().into(),
            ActivityFilterField::UserId => model.user.id.as_str().into(),
            ActivityFilterField::Feeds => {
                FilterValue::List(model.feeds.iter().map(FilterValue::from).collect())
            }
        }
    }
}

impl Queryable for ActivityData {
    type SortField = ActivitySortField;
    type FilterField = ActivityFilterField;

    /// Newest first.
    fn default_sort() -> Vec<Sort<ActivitySortField>> {
        vec![Sort::descending(ActivitySortField::CreatedAt)]
    }
}
