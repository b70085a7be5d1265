//! Comments and comment trees.

use super::reaction::{FeedsReactionData, ReactionSummary};
use super::user::UserData;
use crate::query::{FilterField, FilterValue, Queryable, Sort, SortField};
use crate::sorted::{Identifiable, SortedVec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A comment on an activity, or a reply to another comment.
///
/// `replies == None` means replies were never fetched; `Some(vec![])` means
/// fetched and empty. `reply_count` is the server's total and moves with
/// local reply mutations independently of how many replies are loaded, so
/// `reply_count` and `replies.len()` may legitimately differ.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentData {
    /// Comment id.
    pub id: String,
    /// Id of the commented object (an activity id).
    pub object_id: String,
    /// Kind of the commented object.
    pub object_type: String,
    /// Parent comment for replies.
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
    /// Ranking score used by "top" sorting.
    pub score: i32,
    /// Reactions on this comment.
    pub reactions: ReactionSummary,
    /// Nominal number of replies.
    pub reply_count: u32,
    /// Loaded replies, if fetched.
    pub replies: Option<Vec<CommentData>>,
}

/// Outcome of inserting a comment into a comment tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyInsert {
    /// The comment was added.
    Inserted,
    /// The comment was already present and has been refreshed.
    Duplicate,
    /// The parent comment is not loaded; nothing changed.
    ParentMissing,
}

impl CommentData {
    /// Returns true once replies have been fetched (possibly empty).
    pub fn is_threaded(&self) -> bool {
        self.replies.is_some()
    }

    /// Total reactions on this comment.
    pub fn reaction_count(&self) -> u32 {
        self.reactions.count()
    }

    /// Adds a direct reply. Returns `false` if it was already loaded.
    pub fn add_reply(&mut self, reply: CommentData) -> bool {
        let inserted = self.replies.get_or_insert_with(Vec::new).insert_by_id(reply);
        if inserted {
            self.reply_count += 1;
        }
        inserted
    }

    /// Removes a direct reply.
    ///
    /// The count is decremented when the reply was loaded, or when some
    /// replies are known to be unloaded (it may have been one of those).
    pub fn remove_reply(&mut self, reply_id: &str) -> bool {
        let loaded = self.replies.as_ref().map_or(0, Vec::len);
        let removed = self
            .replies
            .as_mut()
            .and_then(|replies| replies.sorted_remove(&reply_id.to_string()))
            .is_some();
        if removed || (self.reply_count as usize) > loaded {
            self.reply_count = self.reply_count.saturating_sub(1);
        }
        removed
    }

    /// Substitutes an incoming copy, keeping locally known fields the
    /// incoming payload does not carry (own reactions, loaded replies).
    pub fn merge(&mut self, mut incoming: CommentData) {
        incoming.reactions.own = std::mem::take(&mut self.reactions.own);
        if incoming.replies.is_none() {
            incoming.replies = self.replies.take();
        }
        *self = incoming;
    }

    /// Records a reaction on this comment.
    pub fn add_reaction(&mut self, reaction: FeedsReactionData, current_user_id: &str) -> bool {
        self.reactions.add(reaction, current_user_id)
    }

    /// Records a removed reaction on this comment.
    pub fn remove_reaction(&mut self, reaction: &FeedsReactionData, current_user_id: &str) -> bool {
        self.reactions.remove(reaction, current_user_id)
    }

    /// Finds a comment anywhere in a tree.
    pub fn find_in<'a>(comments: &'a [CommentData], id: &str) -> Option<&'a CommentData> {
        for comment in comments {
            if comment.id == id {
                return Some(comment);
            }
            if let Some(found) = comment
                .replies
                .as_deref()
                .and_then(|replies| Self::find_in(replies, id))
            {
                return Some(found);
            }
        }
        None
    }

    /// Finds a comment anywhere in a tree, mutably.
    pub fn find_in_mut<'a>(comments: &'a mut [CommentData], id: &str) -> Option<&'a mut CommentData> {
        for comment in comments.iter_mut() {
            if comment.id == id {
                return Some(comment);
            }
            if let Some(replies) = comment.replies.as_mut() {
                if let Some(found) = Self::find_in_mut(replies, id) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Inserts a comment into a tree: top-level comments are appended,
    /// replies go under their parent wherever it is loaded.
    pub fn insert_into(comments: &mut Vec<CommentData>, comment: CommentData) -> ReplyInsert {
        let inserted = match comment.parent_id.clone() {
            None => comments.insert_by_id(comment),
            Some(parent_id) => match Self::find_in_mut(comments, &parent_id) {
                Some(parent) => parent.add_reply(comment),
                None => return ReplyInsert::ParentMissing,
            },
        };
        if inserted {
            ReplyInsert::Inserted
        } else {
            ReplyInsert::Duplicate
        }
    }

    /// Removes a comment from a tree. Returns `true` if it was loaded.
    pub fn remove_from(comments: &mut Vec<CommentData>, comment: &CommentData) -> bool {
        match &comment.parent_id {
            None => comments.sorted_remove(&comment.id).is_some(),
            Some(parent_id) => Self::find_in_mut(comments, parent_id)
                .map_or(false, |parent| parent.remove_reply(&comment.id)),
        }
    }

    /// Merges an updated copy into the tree. Returns `false` if not loaded.
    pub fn replace_in(comments: &mut [CommentData], comment: CommentData) -> bool {
        match Self::find_in_mut(comments, &comment.id) {
            Some(existing) => {
                existing.merge(comment);
                true
            }
            None => false,
        }
    }

    /// Number of comments loaded in a tree, replies included.
    pub fn loaded_count(comments: &[CommentData]) -> usize {
        comments
            .iter()
            .map(|comment| 1 + comment.replies.as_deref().map_or(0, Self::loaded_count))
            .sum()
    }
}

impl Identifiable for CommentData {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}

/// Sort fields for comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentSortField {
    /// Creation time.
    CreatedAt,
    /// Ranking score.
    Score,
    /// Number of reactions.
    ReactionCount,
}

impl SortField for CommentSortField {
    type Model = CommentData;

    fn remote_name(&self) -> &'static str {
        match self {
            CommentSortField::CreatedAt => "created_at",
            CommentSortField::Score => "score",
            CommentSortField::ReactionCount => "reaction_count",
        }
    }

    fn compare(&self, lhs: &CommentData, rhs: &CommentData) -> Ordering {
        match self {
            CommentSortField::CreatedAt => lhs.created_at.cmp(&rhs.created_at),
            CommentSortField::Score => lhs.score.cmp(&rhs.score),
            CommentSortField::ReactionCount => lhs.reaction_count().cmp(&rhs.reaction_count()),
        }
    }
}

/// Filter fields for comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentFilterField {
    /// Author id.
    UserId,
    /// Parent comment id.
    ParentId,
    /// Commented object id.
    ObjectId,
}

impl FilterField for CommentFilterField {
    type Model = CommentData;

    fn remote_name(&self) -> &'static str {
        match self {
            CommentFilterField::UserId => "user_id",
            CommentFilterField::ParentId => "parent_id",
            CommentFilterField::ObjectId => "object_id",
        }
    }

    fn value_of(&self, model: &CommentData) -> FilterValue {
        match self {
            CommentFilterField::UserId => model.user.id.as_str().into(),
            CommentFilterField::ParentId => model.parent_id.clone().into(),
            CommentFilterField::ObjectId => model.object_id.as_str().into(),
        }
    }
}

impl Queryable for CommentData {
    type SortField = CommentSortField;
    type FilterField = CommentFilterField;

    /// Newest first.
    fn default_sort() -> Vec<Sort<CommentSortField>> {
        vec![Sort::descending(CommentSortField::CreatedAt)]
    }
}
