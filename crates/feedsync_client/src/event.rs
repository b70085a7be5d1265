//! Domain events applied to state containers.
//!
//! A [`StateEvent`] is what a container actually applies. Real-time
//! [`WsEvent`]s are converted into one, and every successful facade
//! mutation produces the same variant from its REST response, so both
//! triggers go through the same handlers.

use crate::capabilities::CapabilityMap;
use feedsync_core::{
    ActivityData, ActivityPinData, BookmarkData, CommentData, FeedData, FeedId, FeedMemberData,
    FeedsReactionData, FollowData, PollData, PollOptionData, PollVoteData,
};
use feedsync_protocol::WsEvent;

/// A state change to apply to every interested container.
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    /// An activity was published. `fid` is the feed the event was delivered
    /// for; local results carry `None` and match on the activity's feeds.
    ActivityAdded {
        /// Delivery feed.
        fid: Option<FeedId>,
        /// The activity.
        activity: ActivityData,
    },
    /// An activity changed.
    ActivityUpdated(ActivityData),
    /// An activity was deleted.
    ActivityDeleted {
        /// Deleted activity.
        activity_id: String,
    },
    /// A reaction was added to an activity.
    ActivityReactionAdded(FeedsReactionData),
    /// A reaction on an activity changed.
    ActivityReactionUpdated(FeedsReactionData),
    /// A reaction was removed from an activity.
    ActivityReactionDeleted(FeedsReactionData),
    /// An activity was pinned.
    ActivityPinned(ActivityPinData),
    /// An activity was unpinned.
    ActivityUnpinned {
        /// Feed it was pinned to.
        fid: FeedId,
        /// Unpinned activity.
        activity_id: String,
    },
    /// A bookmark was added.
    BookmarkAdded(BookmarkData),
    /// A bookmark changed.
    BookmarkUpdated(BookmarkData),
    /// A bookmark was removed.
    BookmarkDeleted(BookmarkData),
    /// A comment or reply was added.
    CommentAdded(CommentData),
    /// A comment changed.
    CommentUpdated(CommentData),
    /// A comment was deleted.
    CommentDeleted(CommentData),
    /// A reaction was added to a comment.
    CommentReactionAdded(FeedsReactionData),
    /// A reaction was removed from a comment.
    CommentReactionDeleted(FeedsReactionData),
    /// Feed metadata changed.
    FeedUpdated(FeedData),
    /// A feed was deleted.
    FeedDeleted(FeedId),
    /// A follow was created.
    FollowAdded(FollowData),
    /// A follow changed (accepted, rejected).
    FollowUpdated(FollowData),
    /// A follow was removed.
    FollowDeleted(FollowData),
    /// A member joined a feed.
    MemberAdded {
        /// The feed.
        fid: FeedId,
        /// The member.
        member: FeedMemberData,
    },
    /// A membership changed.
    MemberUpdated {
        /// The feed.
        fid: FeedId,
        /// The member.
        member: FeedMemberData,
    },
    /// A member left a feed.
    MemberRemoved {
        /// The feed.
        fid: FeedId,
        /// Removed user.
        user_id: String,
    },
    /// A poll changed.
    PollUpdated(PollData),
    /// A poll was closed.
    PollClosed {
        /// The poll.
        poll_id: String,
    },
    /// A poll was deleted.
    PollDeleted {
        /// The poll.
        poll_id: String,
    },
    /// An option was added to a poll.
    PollOptionAdded {
        /// The poll.
        poll_id: String,
        /// The option.
        option: PollOptionData,
    },
    /// An option was removed from a poll.
    PollOptionRemoved {
        /// The poll.
        poll_id: String,
        /// The option.
        option_id: String,
    },
    /// A vote was cast.
    PollVoteCasted(PollVoteData),
    /// A vote moved to another option.
    PollVoteChanged(PollVoteData),
    /// A vote was retracted.
    PollVoteRemoved(PollVoteData),
    /// Cached capabilities changed for some feeds.
    FeedOwnCapabilitiesUpdated(CapabilityMap),
}

/// How an event locates the activity it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ActivityTarget<'a> {
    /// By activity id.
    Activity(&'a str),
    /// By the id of the attached poll. Poll events carry no activity id.
    Poll(&'a str),
}

impl ActivityTarget<'_> {
    /// Returns true if `activity` is the one addressed.
    pub(crate) fn matches(&self, activity: &ActivityData) -> bool {
        match self {
            ActivityTarget::Activity(id) => activity.id == *id,
            ActivityTarget::Poll(poll_id) => activity
                .poll
                .as_ref()
                .map_or(false, |poll| poll.id == *poll_id),
        }
    }
}

impl StateEvent {
    /// Converts a real-time event. Returns `None` for unknown types.
    pub fn from_ws(event: WsEvent) -> Option<Self> {
        let event = match event {
            WsEvent::ActivityAdded { fid, activity, .. } => StateEvent::ActivityAdded {
                fid: Some(fid),
                activity: activity.into(),
            },
            WsEvent::ActivityUpdated { activity, .. } => StateEvent::ActivityUpdated(activity.into()),
            WsEvent::ActivityDeleted { activity, .. } => StateEvent::ActivityDeleted {
                activity_id: activity.id,
            },
            WsEvent::ActivityReactionAdded {
                activity, reaction, ..
            } => StateEvent::ActivityReactionAdded(on_activity(reaction, &activity.id)),
            WsEvent::ActivityReactionUpdated {
                activity, reaction, ..
            } => StateEvent::ActivityReactionUpdated(on_activity(reaction, &activity.id)),
            WsEvent::ActivityReactionDeleted {
                activity, reaction, ..
            } => StateEvent::ActivityReactionDeleted(on_activity(reaction, &activity.id)),
            WsEvent::ActivityPinned {
                fid,
                pinned_activity,
                ..
            } => {
                let mut pin: ActivityPinData = pinned_activity.into();
                pin.feed = fid;
                StateEvent::ActivityPinned(pin)
            }
            WsEvent::ActivityUnpinned {
                fid,
                pinned_activity,
                ..
            } => StateEvent::ActivityUnpinned {
                fid,
                activity_id: pinned_activity.activity.id,
            },
            WsEvent::BookmarkAdded { bookmark, .. } => StateEvent::BookmarkAdded(bookmark.into()),
            WsEvent::BookmarkUpdated { bookmark, .. } => {
                StateEvent::BookmarkUpdated(bookmark.into())
            }
            WsEvent::BookmarkDeleted { bookmark, .. } => {
                StateEvent::BookmarkDeleted(bookmark.into())
            }
            WsEvent::CommentAdded { comment, .. } => StateEvent::CommentAdded(comment.into()),
            WsEvent::CommentUpdated { comment, .. } => StateEvent::CommentUpdated(comment.into()),
            WsEvent::CommentDeleted { comment, .. } => StateEvent::CommentDeleted(comment.into()),
            WsEvent::CommentReactionAdded {
                comment, reaction, ..
            } => StateEvent::CommentReactionAdded(on_comment(
                reaction,
                &comment.object_id,
                &comment.id,
            )),
            WsEvent::CommentReactionDeleted {
                comment, reaction, ..
            } => StateEvent::CommentReactionDeleted(on_comment(
                reaction,
                &comment.object_id,
                &comment.id,
            )),
            WsEvent::FeedUpdated { fid, feed, .. } => {
                let mut feed: FeedData = feed.into();
                feed.feed = fid;
                StateEvent::FeedUpdated(feed)
            }
            WsEvent::FeedDeleted { fid, .. } => StateEvent::FeedDeleted(fid),
            WsEvent::FollowCreated { follow, .. } => StateEvent::FollowAdded(follow.into()),
            WsEvent::FollowUpdated { follow, .. } => StateEvent::FollowUpdated(follow.into()),
            WsEvent::FollowDeleted { follow, .. } => StateEvent::FollowDeleted(follow.into()),
            WsEvent::MemberAdded { fid, member, .. } => StateEvent::MemberAdded { fid, member },
            WsEvent::MemberUpdated { fid, member, .. } => StateEvent::MemberUpdated { fid, member },
            WsEvent::MemberRemoved { fid, member_id, .. } => StateEvent::MemberRemoved {
                fid,
                user_id: member_id,
            },
            WsEvent::PollUpdated { poll, .. } => StateEvent::PollUpdated(poll.into()),
            WsEvent::PollClosed { poll, .. } => StateEvent::PollClosed { poll_id: poll.id },
            WsEvent::PollDeleted { poll, .. } => StateEvent::PollDeleted { poll_id: poll.id },
            WsEvent::PollVoteCasted {
                poll_id, poll_vote, ..
            } => StateEvent::PollVoteCasted(for_poll(poll_vote, poll_id)),
            WsEvent::PollVoteChanged {
                poll_id, poll_vote, ..
            } => StateEvent::PollVoteChanged(for_poll(poll_vote, poll_id)),
            WsEvent::PollVoteRemoved {
                poll_id, poll_vote, ..
            } => StateEvent::PollVoteRemoved(for_poll(poll_vote, poll_id)),
            WsEvent::Unknown => return None,
        };
        Some(event)
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            StateEvent::ActivityAdded { .. } => "activity_added",
            StateEvent::ActivityUpdated(_) => "activity_updated",
            StateEvent::ActivityDeleted { .. } => "activity_deleted",
            StateEvent::ActivityReactionAdded(_) => "activity_reaction_added",
            StateEvent::ActivityReactionUpdated(_) => "activity_reaction_updated",
            StateEvent::ActivityReactionDeleted(_) => "activity_reaction_deleted",
            StateEvent::ActivityPinned(_) => "activity_pinned",
            StateEvent::ActivityUnpinned { .. } => "activity_unpinned",
            StateEvent::BookmarkAdded(_) => "bookmark_added",
            StateEvent::BookmarkUpdated(_) => "bookmark_updated",
            StateEvent::BookmarkDeleted(_) => "bookmark_deleted",
            StateEvent::CommentAdded(_) => "comment_added",
            StateEvent::CommentUpdated(_) => "comment_updated",
            StateEvent::CommentDeleted(_) => "comment_deleted",
            StateEvent::CommentReactionAdded(_) => "comment_reaction_added",
            StateEvent::CommentReactionDeleted(_) => "comment_reaction_deleted",
            StateEvent::FeedUpdated(_) => "feed_updated",
            StateEvent::FeedDeleted(_) => "feed_deleted",
            StateEvent::FollowAdded(_) => "follow_added",
            StateEvent::FollowUpdated(_) => "follow_updated",
            StateEvent::FollowDeleted(_) => "follow_deleted",
            StateEvent::MemberAdded { .. } => "member_added",
            StateEvent::MemberUpdated { .. } => "member_updated",
            StateEvent::MemberRemoved { .. } => "member_removed",
            StateEvent::PollUpdated(_) => "poll_updated",
            StateEvent::PollClosed { .. } => "poll_closed",
            StateEvent::PollDeleted { .. } => "poll_deleted",
            StateEvent::PollOptionAdded { .. } => "poll_option_added",
            StateEvent::PollOptionRemoved { .. } => "poll_option_removed",
            StateEvent::PollVoteCasted(_) => "poll_vote_casted",
            StateEvent::PollVoteChanged(_) => "poll_vote_changed",
            StateEvent::PollVoteRemoved(_) => "poll_vote_removed",
            StateEvent::FeedOwnCapabilitiesUpdated(_) => "feed_own_capabilities_updated",
        }
    }

    /// The activity this event changes in place, if any.
    pub(crate) fn activity_target(&self) -> Option<ActivityTarget<'_>> {
        let target = match self {
            StateEvent::ActivityUpdated(activity) => ActivityTarget::Activity(&activity.id),
            StateEvent::ActivityReactionAdded(reaction)
            | StateEvent::ActivityReactionUpdated(reaction)
            | StateEvent::ActivityReactionDeleted(reaction)
            | StateEvent::CommentReactionAdded(reaction)
            | StateEvent::CommentReactionDeleted(reaction) => {
                ActivityTarget::Activity(&reaction.activity_id)
            }
            StateEvent::CommentAdded(comment)
            | StateEvent::CommentUpdated(comment)
            | StateEvent::CommentDeleted(comment) => ActivityTarget::Activity(&comment.object_id),
            StateEvent::BookmarkAdded(bookmark)
            | StateEvent::BookmarkUpdated(bookmark)
            | StateEvent::BookmarkDeleted(bookmark) => {
                ActivityTarget::Activity(bookmark.activity_id())
            }
            StateEvent::PollUpdated(poll) => ActivityTarget::Poll(&poll.id),
            StateEvent::PollClosed { poll_id }
            | StateEvent::PollDeleted { poll_id }
            | StateEvent::PollOptionAdded { poll_id, .. }
            | StateEvent::PollOptionRemoved { poll_id, .. } => ActivityTarget::Poll(poll_id),
            StateEvent::PollVoteCasted(vote)
            | StateEvent::PollVoteChanged(vote)
            | StateEvent::PollVoteRemoved(vote) => ActivityTarget::Poll(&vote.poll_id),
            _ => return None,
        };
        Some(target)
    }

    /// Applies this event to one activity. Returns true if it changed.
    ///
    /// The caller has already checked [`activity_target`](Self::activity_target).
    pub(crate) fn apply_to_activity(&self, activity: &mut ActivityData, current_user_id: &str) -> bool {
        match self {
            StateEvent::ActivityUpdated(incoming) => {
                activity.merge(incoming.clone());
                true
            }
            StateEvent::ActivityReactionAdded(reaction) => {
                activity.add_reaction(reaction.clone(), current_user_id)
            }
            StateEvent::ActivityReactionUpdated(reaction) => activity.update_reaction(reaction.clone()),
            StateEvent::ActivityReactionDeleted(reaction) => {
                activity.remove_reaction(reaction, current_user_id)
            }
            StateEvent::CommentAdded(comment) => activity.add_comment(comment.clone()),
            StateEvent::CommentUpdated(comment) => activity.update_comment(comment.clone()),
            StateEvent::CommentDeleted(comment) => activity.remove_comment(comment),
            StateEvent::CommentReactionAdded(reaction) => match &reaction.comment_id {
                Some(comment_id) => {
                    activity.add_comment_reaction(comment_id, reaction.clone(), current_user_id)
                }
                None => false,
            },
            StateEvent::CommentReactionDeleted(reaction) => match &reaction.comment_id {
                Some(comment_id) => {
                    activity.remove_comment_reaction(comment_id, reaction, current_user_id)
                }
                None => false,
            },
            StateEvent::BookmarkAdded(bookmark) => {
                activity.add_bookmark(bookmark.clone(), current_user_id)
            }
            StateEvent::BookmarkUpdated(bookmark) => activity.update_bookmark(bookmark.clone()),
            StateEvent::BookmarkDeleted(bookmark) => {
                activity.remove_bookmark(bookmark, current_user_id)
            }
            StateEvent::PollUpdated(poll) => {
                activity.set_poll(poll.clone());
                true
            }
            StateEvent::PollClosed { poll_id } => activity.close_poll(poll_id),
            StateEvent::PollDeleted { poll_id } => activity.remove_poll(poll_id),
            StateEvent::PollOptionAdded { poll_id, option } => {
                activity.add_poll_option(poll_id, option.clone())
            }
            StateEvent::PollOptionRemoved { poll_id, option_id } => {
                activity.remove_poll_option(poll_id, option_id)
            }
            StateEvent::PollVoteCasted(vote) | StateEvent::PollVoteChanged(vote) => {
                activity.cast_poll_vote(vote.clone(), current_user_id)
            }
            StateEvent::PollVoteRemoved(vote) => activity.remove_poll_vote(vote, current_user_id),
            _ => false,
        }
    }
}

fn on_activity(mut reaction: FeedsReactionData, activity_id: &str) -> FeedsReactionData {
    if reaction.activity_id.is_empty() {
        reaction.activity_id = activity_id.to_string();
    }
    reaction
}

fn on_comment(mut reaction: FeedsReactionData, activity_id: &str, comment_id: &str) -> FeedsReactionData {
    if reaction.activity_id.is_empty() {
        reaction.activity_id = activity_id.to_string();
    }
    if reaction.comment_id.is_none() {
        reaction.comment_id = Some(comment_id.to_string());
    }
    reaction
}

fn for_poll(mut vote: PollVoteData, poll_id: String) -> PollVoteData {
    if vote.poll_id.is_empty() {
        vote.poll_id = poll_id;
    }
    vote
}
