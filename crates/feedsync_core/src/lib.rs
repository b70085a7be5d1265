//! # feedsync core
//!
//! Domain layer of the feedsync client SDK.
//!
//! This crate provides:
//! - Entity models (activities, comments, polls, feeds, follows, bookmarks,
//!   reactions, members, pins) with invariant-preserving mutators
//! - Sorted-merge primitives over id-deduplicated sequences
//! - Query configuration (filter + sort) shared by fetches and real-time inserts
//! - A change feed used by state containers to publish mutations
//!
//! This is a pure crate with no I/O.
//!
//! ## Key Invariants
//!
//! - Every collection stays sorted and free of duplicate ids after each operation
//! - Derived counters (`reaction_count`, `vote_count`) are recomputed, never stored twice
//! - Local counters (`comment_count`, `bookmark_count`, `reply_count`) never go below zero

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod change_feed;
mod error;
mod ids;
pub mod models;
pub mod query;
pub mod sorted;

pub use change_feed::ChangeFeed;
pub use error::{CoreError, CoreResult};
pub use ids::FeedId;
pub use models::*;
pub use query::{
    Filter, FilterField, FilterValue, QueryConfiguration, Queryable, Sort, SortDirection,
    SortField,
};
pub use sorted::{sorted_merge, Identifiable, SortedVec};
