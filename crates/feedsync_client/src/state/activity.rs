//! State of a single activity and its comment thread.

use super::list::{PageMode, PaginatedList};
use super::lists::apply_comment_event;
use super::{LoadPhase, StateChange};
use crate::event::{ActivityTarget, StateEvent};
use crate::router::EventSubscriber;
use feedsync_core::{
    ActivityData, ChangeFeed, CommentData, PaginationData, PaginationResult, PollData,
    QueryConfiguration,
};
use parking_lot::RwLock;
use std::sync::mpsc::Receiver;
use tracing::trace;

#[derive(Debug)]
struct ActivityInner {
    activity: Option<ActivityData>,
    comments: PaginatedList<CommentData>,
    deleted: bool,
}

/// Observable state of one activity: the activity itself (with its poll)
/// and a paginated comment tree.
pub struct ActivityState {
    activity_id: String,
    current_user_id: String,
    inner: RwLock<ActivityInner>,
    changes: ChangeFeed<StateChange>,
}

impl ActivityState {
    /// Creates empty state for `activity_id` with comments ordered by `query`.
    pub fn new(
        activity_id: impl Into<String>,
        current_user_id: impl Into<String>,
        query: QueryConfiguration<CommentData>,
    ) -> Self {
        Self {
            activity_id: activity_id.into(),
            current_user_id: current_user_id.into(),
            inner: RwLock::new(ActivityInner {
                activity: None,
                comments: PaginatedList::new(query),
                deleted: false,
            }),
            changes: ChangeFeed::new(),
        }
    }

    /// The activity's id.
    pub fn activity_id(&self) -> &str {
        &self.activity_id
    }

    /// The activity, once loaded.
    pub fn activity(&self) -> Option<ActivityData> {
        self.inner.read().activity.clone()
    }

    /// The attached poll.
    pub fn poll(&self) -> Option<PollData> {
        self.inner
            .read()
            .activity
            .as_ref()
            .and_then(|activity| activity.poll.clone())
    }

    /// Top-level comments in query order, replies nested.
    pub fn comments(&self) -> Vec<CommentData> {
        self.inner.read().comments.items().to_vec()
    }

    /// A loaded comment or reply.
    pub fn comment(&self, comment_id: &str) -> Option<CommentData> {
        CommentData::find_in(self.inner.read().comments.items(), comment_id).cloned()
    }

    /// Cursors of the comment list.
    pub fn comments_pagination(&self) -> PaginationData {
        self.inner.read().comments.pagination().clone()
    }

    /// Query the comments are ordered by.
    pub fn comment_query(&self) -> QueryConfiguration<CommentData> {
        self.inner.read().comments.query().clone()
    }

    /// Returns true if more comments can be loaded.
    pub fn has_more_comments(&self) -> bool {
        self.inner.read().comments.has_next()
    }

    /// Load phase of the comment list.
    pub fn phase(&self) -> LoadPhase {
        self.inner.read().comments.phase()
    }

    /// Returns true once a delete event was applied.
    pub fn is_deleted(&self) -> bool {
        self.inner.read().deleted
    }

    /// Subscribes to changes.
    pub fn subscribe(&self) -> Receiver<StateChange> {
        self.changes.subscribe()
    }

    /// Marks a load as started. Returns the phase to restore on failure.
    pub fn begin_load(&self) -> LoadPhase {
        self.inner.write().comments.begin_load()
    }

    /// Marks a load as failed.
    pub fn fail_load(&self, previous: LoadPhase) {
        self.inner.write().comments.fail_load(previous);
    }

    /// Replaces the activity with a fetched copy.
    pub fn set_activity(&self, activity: ActivityData) {
        let has_poll = activity.poll.is_some();
        {
            let mut inner = self.inner.write();
            inner.activity = Some(activity);
            inner.deleted = false;
        }
        self.changes.emit(StateChange::Activity);
        if has_poll {
            self.changes.emit(StateChange::Poll);
        }
    }

    /// Applies a fetched page of comments.
    pub fn apply_comment_page(
        &self,
        page: PaginationResult<CommentData>,
        query: QueryConfiguration<CommentData>,
        mode: PageMode,
    ) {
        self.inner.write().comments.apply_page(page, query, mode);
        self.changes.emit(StateChange::Comments);
    }

    fn apply(&self, inner: &mut ActivityInner, event: &StateEvent) -> Vec<StateChange> {
        let mut changes = Vec::new();
        if let StateEvent::ActivityDeleted { activity_id } = event {
            if *activity_id == self.activity_id && !inner.deleted {
                inner.activity = None;
                inner.comments.clear();
                inner.deleted = true;
                changes.push(StateChange::Activity);
            }
            return changes;
        }

        if apply_comment_event(
            &mut inner.comments,
            &self.activity_id,
            event,
            &self.current_user_id,
        ) {
            changes.push(StateChange::Comments);
        }

        let Some(target) = event.activity_target() else {
            return changes;
        };
        if let Some(activity) = inner.activity.as_mut() {
            if target.matches(activity) && event.apply_to_activity(activity, &self.current_user_id) {
                changes.push(match target {
                    ActivityTarget::Poll(_) => StateChange::Poll,
                    ActivityTarget::Activity(_) => StateChange::Activity,
                });
            }
        }
        changes
    }
}

impl EventSubscriber for ActivityState {
    fn apply_event(&self, event: &StateEvent) -> bool {
        let changes = {
            let mut inner = self.inner.write();
            self.apply(&mut inner, event)
        };
        if changes.is_empty() {
            return false;
        }
        trace!(activity_id = %self.activity_id, event = event.name(), ?changes, "activity state changed");
        self.changes.emit_batch(changes);
        true
    }
}

impl std::fmt::Debug for ActivityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityState")
            .field("activity_id", &self.activity_id)
            .field("phase", &self.phase())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use feedsync_core::{FeedsReactionData, PollOptionData, PollVoteData, UserData};

    fn comment(id: &str, parent: Option<&str>, secs: i64) -> CommentData {
        CommentData {
            id: id.into(),
            object_id: "a1".into(),
            object_type: "activity".into(),
            parent_id: parent.map(Into::into),
            user: UserData::new("bob"),
            created_at: DateTime::from_timestamp(secs, 0).unwrap(),
            ..Default::default()
        }
    }

    fn loaded() -> ActivityState {
        let state = ActivityState::new("a1", "alice", QueryConfiguration::default());
        state.set_activity(ActivityData {
            id: "a1".into(),
            poll: Some(PollData {
                id: "p1".into(),
                enforce_unique_vote: true,
                options: vec![
                    PollOptionData {
                        id: "x".into(),
                        text: "X".into(),
                    },
                    PollOptionData {
                        id: "y".into(),
                        text: "Y".into(),
                    },
                ],
                ..Default::default()
            }),
            ..Default::default()
        });
        state.apply_comment_page(
            PaginationResult::new(vec![], PaginationData::default()),
            QueryConfiguration::default(),
            PageMode::Replace,
        );
        state
    }

    fn vote(id: &str, option: &str) -> PollVoteData {
        PollVoteData {
            id: id.into(),
            poll_id: "p1".into(),
            option_id: option.into(),
            user_id: "alice".into(),
            ..Default::default()
        }
    }

    #[test]
    fn comment_then_reply() {
        let state = loaded();
        assert!(state.apply_event(&StateEvent::CommentAdded(comment("c1", None, 1))));
        assert!(state.apply_event(&StateEvent::CommentAdded(comment("c2", Some("c1"), 2))));

        let comments = state.comments();
        assert_eq!(comments.len(), 1);
        let c1 = &comments[0];
        assert_eq!(c1.reply_count, 1);
        assert_eq!(c1.replies.as_ref().unwrap()[0].id, "c2");
        assert_eq!(state.activity().unwrap().comment_count, 2);
        assert!(state.comment("c2").is_some());
    }

    #[test]
    fn comment_reactions_reach_the_tree() {
        let state = loaded();
        state.apply_event(&StateEvent::CommentAdded(comment("c1", None, 1)));
        let reaction = FeedsReactionData {
            activity_id: "a1".into(),
            comment_id: Some("c1".into()),
            kind: "like".into(),
            user: UserData::new("alice"),
            ..Default::default()
        };
        assert!(state.apply_event(&StateEvent::CommentReactionAdded(reaction.clone())));
        assert_eq!(state.comment("c1").unwrap().reaction_count(), 1);
        assert!(state.apply_event(&StateEvent::CommentReactionDeleted(reaction)));
        assert_eq!(state.comment("c1").unwrap().reaction_count(), 0);
    }

    #[test]
    fn unique_vote_moves_between_options() {
        let state = loaded();
        let changes = state.subscribe();
        assert!(state.apply_event(&StateEvent::PollVoteCasted(vote("v1", "x"))));
        assert!(state.apply_event(&StateEvent::PollVoteChanged(vote("v2", "y"))));

        let poll = state.poll().unwrap();
        assert_eq!(poll.vote_counts_by_option.get("x").copied().unwrap_or(0), 0);
        assert_eq!(poll.vote_counts_by_option["y"], 1);
        assert_eq!(poll.own_votes.len(), 1);
        assert_eq!(poll.vote_count, 1);
        assert_eq!(changes.try_iter().collect::<Vec<_>>(), vec![StateChange::Poll, StateChange::Poll]);
    }

    #[test]
    fn poll_close_and_delete() {
        let state = loaded();
        assert!(state.apply_event(&StateEvent::PollClosed { poll_id: "p1".into() }));
        assert!(state.poll().unwrap().is_closed);
        assert!(!state.apply_event(&StateEvent::PollDeleted { poll_id: "other".into() }));
        assert!(state.apply_event(&StateEvent::PollDeleted { poll_id: "p1".into() }));
        assert!(state.poll().is_none());
    }

    #[test]
    fn other_activities_are_ignored() {
        let state = loaded();
        let mut foreign = comment("c1", None, 1);
        foreign.object_id = "a2".into();
        assert!(!state.apply_event(&StateEvent::CommentAdded(foreign)));
        assert!(!state.apply_event(&StateEvent::ActivityDeleted { activity_id: "a2".into() }));
    }

    #[test]
    fn delete_is_applied_once() {
        let state = loaded();
        let event = StateEvent::ActivityDeleted { activity_id: "a1".into() };
        assert!(state.apply_event(&event));
        assert!(!state.apply_event(&event));
        assert!(state.is_deleted());
        assert!(state.activity().is_none());
    }
}
