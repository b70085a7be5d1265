//! Standalone list containers.
//!
//! Every list (activities, bookmarks, comments, poll votes, follows) is the
//! same [`ListState`] over a [`PaginatedList`]; a [`ListKind`] supplies the
//! model, the fetch call and the event rules.

use super::list::{PageMode, PaginatedList};
use super::{LoadPhase, StateChange};
use crate::backend::FeedsBackend;
use crate::error::ClientResult;
use crate::event::StateEvent;
use crate::router::EventSubscriber;
use async_trait::async_trait;
use feedsync_core::{
    ActivityData, BookmarkData, ChangeFeed, CommentData, FollowData, Identifiable,
    PaginationData, PaginationResult, PollVoteData, QueryConfiguration, Queryable, ReplyInsert,
};
use feedsync_protocol::QueryParams;
use parking_lot::RwLock;
use std::sync::mpsc::Receiver;
use tracing::trace;

/// What a list holds and how it stays current.
#[async_trait]
pub trait ListKind: Send + Sync + 'static {
    /// Listed model.
    type Model: Queryable;

    /// Loads one page.
    async fn fetch(
        &self,
        backend: &dyn FeedsBackend,
        params: &QueryParams,
    ) -> ClientResult<PaginationResult<Self::Model>>;

    /// Applies an event to the list. Returns true if it changed.
    fn apply(
        &self,
        list: &mut PaginatedList<Self::Model>,
        event: &StateEvent,
        current_user_id: &str,
    ) -> bool;
}

/// An observable paginated list.
pub struct ListState<K: ListKind> {
    kind: K,
    current_user_id: String,
    inner: RwLock<PaginatedList<K::Model>>,
    changes: ChangeFeed<StateChange>,
}

impl<K: ListKind> ListState<K> {
    /// Creates an empty list ordered by `query`.
    pub fn new(kind: K, current_user_id: impl Into<String>, query: QueryConfiguration<K::Model>) -> Self {
        Self {
            kind,
            current_user_id: current_user_id.into(),
            inner: RwLock::new(PaginatedList::new(query)),
            changes: ChangeFeed::new(),
        }
    }

    /// The list kind.
    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// Loaded items in order.
    pub fn items(&self) -> Vec<K::Model> {
        self.inner.read().items().to_vec()
    }

    /// Cursors of the last page.
    pub fn pagination(&self) -> PaginationData {
        self.inner.read().pagination().clone()
    }

    /// Returns true if another page can be loaded.
    pub fn has_next(&self) -> bool {
        self.inner.read().has_next()
    }

    /// Query the list is ordered by.
    pub fn query(&self) -> QueryConfiguration<K::Model> {
        self.inner.read().query().clone()
    }

    /// Load phase.
    pub fn phase(&self) -> LoadPhase {
        self.inner.read().phase()
    }

    /// Subscribes to changes.
    pub fn subscribe(&self) -> Receiver<StateChange> {
        self.changes.subscribe()
    }

    /// Marks a fetch as started. Returns the phase to restore on failure.
    pub fn begin_load(&self) -> LoadPhase {
        self.inner.write().begin_load()
    }

    /// Marks a fetch as failed.
    pub fn fail_load(&self, previous: LoadPhase) {
        self.inner.write().fail_load(previous);
    }

    /// Applies a fetched page.
    pub fn apply_page(
        &self,
        page: PaginationResult<K::Model>,
        query: QueryConfiguration<K::Model>,
        mode: PageMode,
    ) {
        let count = page.models.len();
        self.inner.write().apply_page(page, query, mode);
        trace!(count, ?mode, "applied list page");
        self.changes.emit(StateChange::Items);
    }
}

impl<K: ListKind> EventSubscriber for ListState<K> {
    fn apply_event(&self, event: &StateEvent) -> bool {
        let changed = {
            let mut list = self.inner.write();
            self.kind.apply(&mut list, event, &self.current_user_id)
        };
        if changed {
            self.changes.emit(StateChange::Items);
        }
        changed
    }
}

/// Applies activity-level events to every matching activity in `list`.
fn apply_to_activities<M, G>(
    list: &mut PaginatedList<M>,
    event: &StateEvent,
    current_user_id: &str,
    activity_of: G,
) -> bool
where
    M: Queryable,
    G: Fn(&mut M) -> &mut ActivityData,
{
    let Some(target) = event.activity_target() else {
        return false;
    };
    let mut changed = false;
    for item in list.items_mut().iter_mut() {
        let activity = activity_of(item);
        if target.matches(activity) {
            changed |= event.apply_to_activity(activity, current_user_id);
        }
    }
    if changed {
        list.resort();
    }
    changed
}

/// Applies comment events for `object_id` to a comment tree.
pub(crate) fn apply_comment_event(
    list: &mut PaginatedList<CommentData>,
    object_id: &str,
    event: &StateEvent,
    current_user_id: &str,
) -> bool {
    let changed = match event {
        StateEvent::CommentAdded(comment) if comment.object_id == object_id => {
            match comment.parent_id {
                None if list.contains(&comment.id) => {
                    CommentData::replace_in(list.items_mut(), comment.clone());
                    false
                }
                None => list.insert(comment.clone()),
                Some(_) => {
                    CommentData::insert_into(list.items_mut(), comment.clone())
                        == ReplyInsert::Inserted
                }
            }
        }
        StateEvent::CommentUpdated(comment) if comment.object_id == object_id => {
            CommentData::replace_in(list.items_mut(), comment.clone())
        }
        StateEvent::CommentDeleted(comment) if comment.object_id == object_id => {
            CommentData::remove_from(list.items_mut(), comment)
        }
        StateEvent::CommentReactionAdded(reaction) if reaction.activity_id == object_id => {
            match reaction.comment_id.as_deref() {
                Some(comment_id) => CommentData::find_in_mut(list.items_mut(), comment_id)
                    .map_or(false, |comment| comment.add_reaction(reaction.clone(), current_user_id)),
                None => false,
            }
        }
        StateEvent::CommentReactionDeleted(reaction) if reaction.activity_id == object_id => {
            match reaction.comment_id.as_deref() {
                Some(comment_id) => CommentData::find_in_mut(list.items_mut(), comment_id)
                    .map_or(false, |comment| comment.remove_reaction(reaction, current_user_id)),
                None => false,
            }
        }
        StateEvent::ActivityDeleted { activity_id } if activity_id == object_id => {
            let had_items = !list.is_empty();
            list.clear();
            had_items
        }
        _ => false,
    };
    if changed {
        list.resort();
    }
    changed
}

/// Activities across feeds, selected by a filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityListKind;

#[async_trait]
impl ListKind for ActivityListKind {
    type Model = ActivityData;

    async fn fetch(
        &self,
        backend: &dyn FeedsBackend,
        params: &QueryParams,
    ) -> ClientResult<PaginationResult<ActivityData>> {
        Ok(backend.query_activities(params).await?.into_page())
    }

    fn apply(&self, list: &mut PaginatedList<ActivityData>, event: &StateEvent, current_user_id: &str) -> bool {
        match event {
            StateEvent::ActivityAdded { activity, .. } => list.insert(activity.clone()),
            StateEvent::ActivityDeleted { activity_id } => list.remove(activity_id).is_some(),
            _ => apply_to_activities(list, event, current_user_id, |activity| activity),
        }
    }
}

/// The current user's bookmarks.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookmarkListKind;

#[async_trait]
impl ListKind for BookmarkListKind {
    type Model = BookmarkData;

    async fn fetch(
        &self,
        backend: &dyn FeedsBackend,
        params: &QueryParams,
    ) -> ClientResult<PaginationResult<BookmarkData>> {
        Ok(backend.query_bookmarks(params).await?.into_page())
    }

    fn apply(&self, list: &mut PaginatedList<BookmarkData>, event: &StateEvent, current_user_id: &str) -> bool {
        match event {
            StateEvent::BookmarkAdded(bookmark) | StateEvent::BookmarkUpdated(bookmark) => {
                bookmark.user.id == current_user_id && list.upsert(bookmark.clone())
            }
            StateEvent::BookmarkDeleted(bookmark) => list.remove(&bookmark.id()).is_some(),
            StateEvent::ActivityDeleted { activity_id } => {
                list.retain(|bookmark| bookmark.activity_id() != activity_id)
            }
            _ => apply_to_activities(list, event, current_user_id, |bookmark| &mut bookmark.activity),
        }
    }
}

/// Comments on one object (activity).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentListKind {
    /// The commented object.
    pub object_id: String,
}

#[async_trait]
impl ListKind for CommentListKind {
    type Model = CommentData;

    async fn fetch(
        &self,
        backend: &dyn FeedsBackend,
        params: &QueryParams,
    ) -> ClientResult<PaginationResult<CommentData>> {
        Ok(backend.query_comments(&self.object_id, params).await?.into_page())
    }

    fn apply(&self, list: &mut PaginatedList<CommentData>, event: &StateEvent, current_user_id: &str) -> bool {
        apply_comment_event(list, &self.object_id, event, current_user_id)
    }
}

/// Votes of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollVoteListKind {
    /// The poll.
    pub poll_id: String,
}

#[async_trait]
impl ListKind for PollVoteListKind {
    type Model = PollVoteData;

    async fn fetch(
        &self,
        backend: &dyn FeedsBackend,
        params: &QueryParams,
    ) -> ClientResult<PaginationResult<PollVoteData>> {
        Ok(backend.query_poll_votes(&self.poll_id, params).await?.into_page())
    }

    fn apply(&self, list: &mut PaginatedList<PollVoteData>, event: &StateEvent, _current_user_id: &str) -> bool {
        match event {
            StateEvent::PollVoteCasted(vote) | StateEvent::PollVoteChanged(vote)
                if vote.poll_id == self.poll_id =>
            {
                list.upsert(vote.clone())
            }
            StateEvent::PollVoteRemoved(vote) if vote.poll_id == self.poll_id => {
                list.remove(&vote.id).is_some()
            }
            StateEvent::PollOptionRemoved { poll_id, option_id } if *poll_id == self.poll_id => {
                list.retain(|vote| vote.is_answer || vote.option_id != *option_id)
            }
            StateEvent::PollDeleted { poll_id } if *poll_id == self.poll_id => {
                let had_items = !list.is_empty();
                list.clear();
                had_items
            }
            _ => false,
        }
    }
}

/// Follows selected by a filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FollowListKind;

#[async_trait]
impl ListKind for FollowListKind {
    type Model = FollowData;

    async fn fetch(
        &self,
        backend: &dyn FeedsBackend,
        params: &QueryParams,
    ) -> ClientResult<PaginationResult<FollowData>> {
        Ok(backend.query_follows(params).await?.into_page())
    }

    fn apply(&self, list: &mut PaginatedList<FollowData>, event: &StateEvent, _current_user_id: &str) -> bool {
        match event {
            StateEvent::FollowAdded(follow) | StateEvent::FollowUpdated(follow) => {
                list.upsert(follow.clone())
            }
            StateEvent::FollowDeleted(follow) => list.remove(&follow.id()).is_some(),
            _ => false,
        }
    }
}

/// Activities across feeds.
pub type ActivityListState = ListState<ActivityListKind>;
/// The current user's bookmarks.
pub type BookmarkListState = ListState<BookmarkListKind>;
/// Comments on an activity.
pub type CommentListState = ListState<CommentListKind>;
/// Votes of a poll.
pub type PollVoteListState = ListState<PollVoteListKind>;
/// Follows.
pub type FollowListState = ListState<FollowListKind>;

#[cfg(test)]
mod tests {
    use super::*;
    use feedsync_core::{
        BookmarkFilterField, Filter, FollowStatus, FeedData, FeedId, FeedsReactionData, UserData,
    };
    use chrono::DateTime;

    fn activity(id: &str, secs: i64) -> ActivityData {
        ActivityData {
            id: id.into(),
            kind: "post".into(),
            created_at: DateTime::from_timestamp(secs, 0).unwrap(),
            ..Default::default()
        }
    }

    fn comment(id: &str, parent: Option<&str>, secs: i64) -> CommentData {
        CommentData {
            id: id.into(),
            object_id: "a1".into(),
            object_type: "activity".into(),
            parent_id: parent.map(Into::into),
            created_at: DateTime::from_timestamp(secs, 0).unwrap(),
            ..Default::default()
        }
    }

    fn bookmark(user: &str, activity_id: &str) -> BookmarkData {
        BookmarkData {
            activity: activity(activity_id, 1),
            user: UserData::new(user),
            ..Default::default()
        }
    }

    fn ids<M: Queryable>(items: &[M]) -> Vec<M::Id> {
        items.iter().map(|item| item.id()).collect()
    }

    #[test]
    fn activity_list_applies_events() {
        let state = ActivityListState::new(ActivityListKind, "alice", QueryConfiguration::default());
        let changes = state.subscribe();

        assert!(state.apply_event(&StateEvent::ActivityAdded { fid: None, activity: activity("a", 1) }));
        assert!(state.apply_event(&StateEvent::ActivityAdded { fid: None, activity: activity("b", 2) }));
        assert!(state.apply_event(&StateEvent::ActivityAdded { fid: None, activity: activity("a", 1) }));
        assert_eq!(ids(&state.items()), vec!["b".to_string(), "a".to_string()]);

        let reaction = FeedsReactionData {
            activity_id: "a".into(),
            kind: "like".into(),
            user: UserData::new("bob"),
            ..Default::default()
        };
        assert!(state.apply_event(&StateEvent::ActivityReactionAdded(reaction)));
        assert_eq!(state.items()[1].reaction_count(), 1);

        assert!(state.apply_event(&StateEvent::ActivityDeleted { activity_id: "b".into() }));
        assert!(!state.apply_event(&StateEvent::ActivityDeleted { activity_id: "b".into() }));
        assert_eq!(state.items().len(), 1);
        assert_eq!(changes.try_iter().count(), 5);
    }

    #[test]
    fn bookmark_list_keeps_only_own_bookmarks() {
        let state = BookmarkListState::new(BookmarkListKind, "alice", QueryConfiguration::default());
        assert!(state.apply_event(&StateEvent::BookmarkAdded(bookmark("alice", "a1"))));
        assert!(!state.apply_event(&StateEvent::BookmarkAdded(bookmark("bob", "a2"))));
        assert_eq!(state.items().len(), 1);

        assert!(state.apply_event(&StateEvent::BookmarkDeleted(bookmark("alice", "a1"))));
        assert!(state.items().is_empty());
    }

    #[test]
    fn bookmark_list_honours_folder_filter() {
        let query = QueryConfiguration::new(
            Some(Filter::equal(BookmarkFilterField::FolderId, "f1")),
            vec![],
        );
        let state = BookmarkListState::new(BookmarkListKind, "alice", query);
        assert!(!state.apply_event(&StateEvent::BookmarkAdded(bookmark("alice", "a1"))));
    }

    #[test]
    fn bookmark_list_follows_activity_deletion() {
        let state = BookmarkListState::new(BookmarkListKind, "alice", QueryConfiguration::default());
        state.apply_event(&StateEvent::BookmarkAdded(bookmark("alice", "a1")));
        assert!(state.apply_event(&StateEvent::ActivityDeleted { activity_id: "a1".into() }));
        assert!(state.items().is_empty());
    }

    #[test]
    fn comment_list_builds_a_tree() {
        let state = CommentListState::new(
            CommentListKind { object_id: "a1".into() },
            "alice",
            QueryConfiguration::default(),
        );
        assert!(state.apply_event(&StateEvent::CommentAdded(comment("c1", None, 1))));
        assert!(state.apply_event(&StateEvent::CommentAdded(comment("c2", None, 2))));
        assert!(state.apply_event(&StateEvent::CommentAdded(comment("r1", Some("c1"), 3))));
        assert!(!state.apply_event(&StateEvent::CommentAdded(comment("r1", Some("c1"), 3))));
        assert!(!state.apply_event(&StateEvent::CommentAdded(comment("r2", Some("missing"), 3))));

        let items = state.items();
        assert_eq!(ids(&items), vec!["c2".to_string(), "c1".to_string()]);
        let c1 = &items[1];
        assert_eq!(c1.reply_count, 1);
        assert_eq!(c1.replies.as_ref().unwrap()[0].id, "r1");

        assert!(state.apply_event(&StateEvent::CommentDeleted(comment("r1", Some("c1"), 3))));
        assert_eq!(state.items()[1].reply_count, 0);
    }

    #[test]
    fn comment_list_ignores_other_objects() {
        let state = CommentListState::new(
            CommentListKind { object_id: "other".into() },
            "alice",
            QueryConfiguration::default(),
        );
        assert!(!state.apply_event(&StateEvent::CommentAdded(comment("c1", None, 1))));
    }

    #[test]
    fn poll_vote_list_tracks_votes() {
        let state = PollVoteListState::new(
            PollVoteListKind { poll_id: "p1".into() },
            "alice",
            QueryConfiguration::default(),
        );
        let vote = PollVoteData {
            id: "v1".into(),
            poll_id: "p1".into(),
            option_id: "o1".into(),
            ..Default::default()
        };
        assert!(state.apply_event(&StateEvent::PollVoteCasted(vote.clone())));
        let mut other_poll = vote.clone();
        other_poll.poll_id = "p2".into();
        assert!(!state.apply_event(&StateEvent::PollVoteCasted(other_poll)));

        let mut changed = vote.clone();
        changed.option_id = "o2".into();
        assert!(state.apply_event(&StateEvent::PollVoteChanged(changed)));
        assert_eq!(state.items()[0].option_id, "o2");

        assert!(state.apply_event(&StateEvent::PollVoteRemoved(vote)));
        assert!(state.items().is_empty());
    }

    #[test]
    fn follow_list_drops_follows_leaving_the_filter() {
        let query = QueryConfiguration::new(
            Some(Filter::equal(feedsync_core::FollowFilterField::Status, "accepted")),
            vec![],
        );
        let state = FollowListState::new(FollowListKind, "alice", query);
        let mut follow = FollowData {
            source_feed: FeedData::new(FeedId::new("timeline", "alice")),
            target_feed: FeedData::new(FeedId::new("user", "bob")),
            status: FollowStatus::Pending,
            ..Default::default()
        };
        assert!(!state.apply_event(&StateEvent::FollowAdded(follow.clone())));
        follow.status = FollowStatus::Accepted;
        assert!(state.apply_event(&StateEvent::FollowUpdated(follow.clone())));
        assert_eq!(state.items().len(), 1);
        assert!(state.apply_event(&StateEvent::FollowDeleted(follow)));
        assert!(state.items().is_empty());
    }

    #[test]
    fn failed_first_load_reverts_phase() {
        let state = FollowListState::new(FollowListKind, "alice", QueryConfiguration::default());
        let previous = state.begin_load();
        assert_eq!(state.phase(), LoadPhase::Loading);
        state.fail_load(previous);
        assert_eq!(state.phase(), LoadPhase::Uninitialized);
    }
}
