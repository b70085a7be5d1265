//! Async facades over the backend.
//!
//! A facade calls the backend, converts the response into models and
//! publishes the result as a [`StateEvent`](crate::StateEvent) through the
//! router, so the owning container (and every other live container that
//! holds the same entity) applies it with the same handlers a real-time
//! event would use. Backend errors are returned unchanged and leave state
//! untouched.

mod activity;
mod feed;
mod list;

pub use activity::Activity;
pub use feed::Feed;
pub use list::{ActivityList, BookmarkList, CommentList, FollowList, List, PollVoteList};

use crate::error::ClientError;
use feedsync_core::FeedsReactionData;
use tracing::debug;

fn log_failure(operation: &'static str) -> impl Fn(&ClientError) {
    move |err| debug!(operation, error = %err, "backend call failed")
}

/// Fills routing fields the backend may leave out of a returned reaction.
fn reaction_for(
    mut reaction: FeedsReactionData,
    activity_id: &str,
    comment_id: Option<&str>,
) -> FeedsReactionData {
    if reaction.activity_id.is_empty() {
        reaction.activity_id = activity_id.to_string();
    }
    if reaction.comment_id.is_none() {
        reaction.comment_id = comment_id.map(str::to_string);
    }
    reaction
}
