//! Observable state containers.
//!
//! Each container owns the models for one screen-sized concern (a feed, an
//! activity, a list) behind a lock. Mutations happen only through
//! [`EventSubscriber::apply_event`](crate::EventSubscriber::apply_event) and
//! the page-application methods used by facades; after each applied
//! mutation the container emits a [`StateChange`] on its change feed.

mod activity;
mod feed;
mod list;
mod lists;

pub use activity::ActivityState;
pub use feed::{FeedSnapshot, FeedState};
pub use list::{PageMode, PaginatedList};
pub use lists::{
    ActivityListKind, ActivityListState, BookmarkListKind, BookmarkListState, CommentListKind,
    CommentListState, FollowListKind, FollowListState, ListKind, ListState, PollVoteListKind,
    PollVoteListState,
};

/// Lifecycle of a paginated collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    /// Nothing has been fetched.
    #[default]
    Uninitialized,
    /// The first fetch is in flight.
    Loading,
    /// At least one fetch succeeded.
    Populated,
}

impl LoadPhase {
    /// Returns true once a fetch has succeeded.
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadPhase::Populated)
    }

    /// Returns true while the first fetch is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadPhase::Loading)
    }
}

/// What part of a container changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateChange {
    /// Feed metadata or capabilities.
    Feed,
    /// The feed's activity list.
    Activities,
    /// Pinned activities.
    PinnedActivities,
    /// Followers.
    Followers,
    /// Followed feeds.
    Following,
    /// Pending follow requests.
    FollowRequests,
    /// Members.
    Members,
    /// The feed was deleted.
    Deleted,
    /// The activity itself.
    Activity,
    /// Comments.
    Comments,
    /// The attached poll.
    Poll,
    /// Items of a standalone list.
    Items,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_phase_predicates() {
        assert!(!LoadPhase::Uninitialized.is_loaded());
        assert!(LoadPhase::Loading.is_loading());
        assert!(LoadPhase::Populated.is_loaded());
        assert_eq!(LoadPhase::default(), LoadPhase::Uninitialized);
    }
}
