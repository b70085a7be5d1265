//! # Feedsync Client
//!
//! State synchronization engine for social feeds.
//!
//! This crate provides:
//! - Observable state containers (feed, activity, five paginated lists)
//! - An event router with duplicate suppression
//! - A write-through own-capabilities cache
//! - Async facades over a pluggable [`FeedsBackend`]
//! - An [`EventSource`] pump for real-time events
//!
//! ## Architecture
//!
//! Data reaches a container along two paths that share one mutation surface:
//! 1. A facade calls the backend, converts the response into models and
//!    publishes it as a [`StateEvent`]
//! 2. A real-time [`WsEvent`](feedsync_protocol::WsEvent) is converted into
//!    the same [`StateEvent`] by the [`EventRouter`]
//!
//! Either way every live container is offered the event and applies it
//! with the same handlers, using the sort order of its last query.
//!
//! ## Key Invariants
//!
//! - Collections stay sorted and free of duplicate ids
//! - Failed fetches leave state untouched
//! - Containers never fail; unknown targets are ignored
//! - Applying the same event twice does not double counters held in
//!   local subsets

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod capabilities;
mod client;
mod config;
mod error;
mod event;
mod facade;
mod router;
mod source;
mod state;

pub use backend::FeedsBackend;
pub use capabilities::{CapabilityCache, CapabilityMap};
pub use client::FeedsClient;
pub use config::{
    ActivitiesQuery, BookmarksQuery, ClientConfig, CommentsQuery, FeedQuery, FollowsQuery,
    ListQuery, MembersQuery, PollVotesQuery,
};
pub use error::{ClientError, ClientResult};
pub use event::StateEvent;
pub use facade::{
    Activity, ActivityList, BookmarkList, CommentList, Feed, FollowList, List, PollVoteList,
};
pub use router::{EventRouter, EventSubscriber, RouterStats};
pub use source::{ChannelEventSource, EventSource, ReplayEventSource};
pub use state::{
    ActivityListKind, ActivityListState, ActivityState, BookmarkListKind, BookmarkListState,
    CommentListKind, CommentListState, FeedSnapshot, FeedState, FollowListKind, FollowListState,
    ListKind, ListState, LoadPhase, PageMode, PaginatedList, PollVoteListKind, PollVoteListState,
    StateChange,
};
