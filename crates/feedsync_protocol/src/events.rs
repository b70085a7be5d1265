//! Real-time events.
//!
//! Frames arrive as JSON objects tagged by `type`. Each event carries the
//! full updated sub-resource (not a diff) plus the identity of the feed it
//! was published for. Types this client does not know decode to
//! [`WsEvent::Unknown`].

use crate::error::{ProtocolError, ProtocolResult};
use crate::responses::{
    ActivityResponse, BookmarkResponse, CommentResponse, FeedResponse, FollowResponse,
    PinResponse, PollResponse,
};
use chrono::{DateTime, Utc};
use feedsync_core::{FeedId, FeedMemberData, FeedsReactionData, PollVoteData};
use serde::{Deserialize, Serialize};

/// A decoded real-time event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WsEvent {
    /// An activity was added to a feed.
    #[serde(rename = "feeds.activity.added")]
    ActivityAdded {
        /// Feed the event was published for.
        fid: FeedId,
        /// The new activity.
        activity: ActivityResponse,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// An activity changed.
    #[serde(rename = "feeds.activity.updated")]
    ActivityUpdated {
        /// Feed the event was published for.
        fid: FeedId,
        /// The updated activity.
        activity: ActivityResponse,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// An activity was deleted.
    #[serde(rename = "feeds.activity.deleted")]
    ActivityDeleted {
        /// Feed the event was published for.
        fid: FeedId,
        /// The deleted activity.
        activity: ActivityResponse,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A reaction was added to an activity.
    #[serde(rename = "feeds.activity.reaction.added")]
    ActivityReactionAdded {
        /// Feed the event was published for.
        fid: FeedId,
        /// The activity after the change.
        activity: ActivityResponse,
        /// The new reaction.
        reaction: FeedsReactionData,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A reaction was changed.
    #[serde(rename = "feeds.activity.reaction.updated")]
    ActivityReactionUpdated {
        /// Feed the event was published for.
        fid: FeedId,
        /// The activity after the change.
        activity: ActivityResponse,
        /// The updated reaction.
        reaction: FeedsReactionData,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A reaction was removed from an activity.
    #[serde(rename = "feeds.activity.reaction.deleted")]
    ActivityReactionDeleted {
        /// Feed the event was published for.
        fid: FeedId,
        /// The activity after the change.
        activity: ActivityResponse,
        /// The removed reaction.
        reaction: FeedsReactionData,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// An activity was pinned.
    #[serde(rename = "feeds.activity.pinned")]
    ActivityPinned {
        /// Feed the activity was pinned to.
        fid: FeedId,
        /// The pin.
        pinned_activity: PinResponse,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// An activity was unpinned.
    #[serde(rename = "feeds.activity.unpinned")]
    ActivityUnpinned {
        /// Feed the activity was unpinned from.
        fid: FeedId,
        /// The removed pin.
        pinned_activity: PinResponse,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A bookmark was added.
    #[serde(rename = "feeds.bookmark.added")]
    BookmarkAdded {
        /// The new bookmark.
        bookmark: BookmarkResponse,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A bookmark changed (e.g. moved to another folder).
    #[serde(rename = "feeds.bookmark.updated")]
    BookmarkUpdated {
        /// The updated bookmark.
        bookmark: BookmarkResponse,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A bookmark was removed.
    #[serde(rename = "feeds.bookmark.deleted")]
    BookmarkDeleted {
        /// The removed bookmark.
        bookmark: BookmarkResponse,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A comment (or reply) was added.
    #[serde(rename = "feeds.comment.added")]
    CommentAdded {
        /// Feed the event was published for.
        fid: FeedId,
        /// The new comment.
        comment: CommentResponse,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A comment changed.
    #[serde(rename = "feeds.comment.updated")]
    CommentUpdated {
        /// Feed the event was published for.
        fid: FeedId,
        /// The updated comment.
        comment: CommentResponse,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A comment was deleted.
    #[serde(rename = "feeds.comment.deleted")]
    CommentDeleted {
        /// Feed the event was published for.
        fid: FeedId,
        /// The deleted comment.
        comment: CommentResponse,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A reaction was added to a comment.
    #[serde(rename = "feeds.comment.reaction.added")]
    CommentReactionAdded {
        /// Feed the event was published for.
        fid: FeedId,
        /// The comment after the change.
        comment: CommentResponse,
        /// The new reaction.
        reaction: FeedsReactionData,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A reaction was removed from a comment.
    #[serde(rename = "feeds.comment.reaction.deleted")]
    CommentReactionDeleted {
        /// Feed the event was published for.
        fid: FeedId,
        /// The comment after the change.
        comment: CommentResponse,
        /// The removed reaction.
        reaction: FeedsReactionData,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// Feed metadata changed.
    #[serde(rename = "feeds.feed.updated")]
    FeedUpdated {
        /// The feed.
        fid: FeedId,
        /// The updated feed.
        feed: FeedResponse,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A feed was deleted.
    #[serde(rename = "feeds.feed.deleted")]
    FeedDeleted {
        /// The deleted feed.
        fid: FeedId,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A follow was created (accepted or pending).
    #[serde(rename = "feeds.follow.created")]
    FollowCreated {
        /// Feed the event was published for.
        fid: FeedId,
        /// The follow.
        follow: FollowResponse,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A follow changed status.
    #[serde(rename = "feeds.follow.updated")]
    FollowUpdated {
        /// Feed the event was published for.
        fid: FeedId,
        /// The follow.
        follow: FollowResponse,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A follow was removed.
    #[serde(rename = "feeds.follow.deleted")]
    FollowDeleted {
        /// Feed the event was published for.
        fid: FeedId,
        /// The removed follow.
        follow: FollowResponse,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A member was added to a feed.
    #[serde(rename = "feeds.feed_member.added")]
    MemberAdded {
        /// The feed.
        fid: FeedId,
        /// The member.
        member: FeedMemberData,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A member changed role or status.
    #[serde(rename = "feeds.feed_member.updated")]
    MemberUpdated {
        /// The feed.
        fid: FeedId,
        /// The member.
        member: FeedMemberData,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A member was removed from a feed.
    #[serde(rename = "feeds.feed_member.removed")]
    MemberRemoved {
        /// The feed.
        fid: FeedId,
        /// Removed member's user id.
        member_id: String,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A poll changed (options, settings, counts).
    #[serde(rename = "feeds.poll.updated")]
    PollUpdated {
        /// Feed the event was published for.
        fid: FeedId,
        /// The poll.
        poll: PollResponse,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A poll was closed.
    #[serde(rename = "feeds.poll.closed")]
    PollClosed {
        /// Feed the event was published for.
        fid: FeedId,
        /// The poll.
        poll: PollResponse,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A poll was deleted.
    #[serde(rename = "feeds.poll.deleted")]
    PollDeleted {
        /// Feed the event was published for.
        fid: FeedId,
        /// The poll.
        poll: PollResponse,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A vote was cast.
    #[serde(rename = "feeds.poll.vote_casted")]
    PollVoteCasted {
        /// Feed the event was published for.
        fid: FeedId,
        /// Poll id.
        poll_id: String,
        /// The vote.
        poll_vote: PollVoteData,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A vote was moved to another option.
    #[serde(rename = "feeds.poll.vote_changed")]
    PollVoteChanged {
        /// Feed the event was published for.
        fid: FeedId,
        /// Poll id.
        poll_id: String,
        /// The vote after the change.
        poll_vote: PollVoteData,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// A vote was retracted.
    #[serde(rename = "feeds.poll.vote_removed")]
    PollVoteRemoved {
        /// Feed the event was published for.
        fid: FeedId,
        /// Poll id.
        poll_id: String,
        /// The retracted vote.
        poll_vote: PollVoteData,
        /// Event time.
        created_at: DateTime<Utc>,
    },
    /// An event type this client does not know.
    #[serde(other)]
    Unknown,
}

impl WsEvent {
    /// Decodes a JSON text frame.
    pub fn decode(frame: &str) -> ProtocolResult<Self> {
        let value: serde_json::Value = serde_json::from_str(frame)?;
        if value.get("type").and_then(|t| t.as_str()).is_none() {
            return Err(ProtocolError::invalid_frame("missing event type"));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Encodes the event as a JSON text frame.
    pub fn encode(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Returns the wire type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            WsEvent::ActivityAdded { .. } => "feeds.activity.added",
            WsEvent::ActivityUpdated { .. } => "feeds.activity.updated",
            WsEvent::ActivityDeleted { .. } => "feeds.activity.deleted",
            WsEvent::ActivityReactionAdded { .. } => "feeds.activity.reaction.added",
            WsEvent::ActivityReactionUpdated { .. } => "feeds.activity.reaction.updated",
            WsEvent::ActivityReactionDeleted { .. } => "feeds.activity.reaction.deleted",
            WsEvent::ActivityPinned { .. } => "feeds.activity.pinned",
            WsEvent::ActivityUnpinned { .. } => "feeds.activity.unpinned",
            WsEvent::BookmarkAdded { .. } => "feeds.bookmark.added",
            WsEvent::BookmarkUpdated { .. } => "feeds.bookmark.updated",
            WsEvent::BookmarkDeleted { .. } => "feeds.bookmark.deleted",
            WsEvent::CommentAdded { .. } => "feeds.comment.added",
            WsEvent::CommentUpdated { .. } => "feeds.comment.updated",
            WsEvent::CommentDeleted { .. } => "feeds.comment.deleted",
            WsEvent::CommentReactionAdded { .. } => "feeds.comment.reaction.added",
            WsEvent::CommentReactionDeleted { .. } => "feeds.comment.reaction.deleted",
            WsEvent::FeedUpdated { .. } => "feeds.feed.updated",
            WsEvent::FeedDeleted { .. } => "feeds.feed.deleted",
            WsEvent::FollowCreated { .. } => "feeds.follow.created",
            WsEvent::FollowUpdated { .. } => "feeds.follow.updated",
            WsEvent::FollowDeleted { .. } => "feeds.follow.deleted",
            WsEvent::MemberAdded { .. } => "feeds.feed_member.added",
            WsEvent::MemberUpdated { .. } => "feeds.feed_member.updated",
            WsEvent::MemberRemoved { .. } => "feeds.feed_member.removed",
            WsEvent::PollUpdated { .. } => "feeds.poll.updated",
            WsEvent::PollClosed { .. } => "feeds.poll.closed",
            WsEvent::PollDeleted { .. } => "feeds.poll.deleted",
            WsEvent::PollVoteCasted { .. } => "feeds.poll.vote_casted",
            WsEvent::PollVoteChanged { .. } => "feeds.poll.vote_changed",
            WsEvent::PollVoteRemoved { .. } => "feeds.poll.vote_removed",
            WsEvent::Unknown => "unknown",
        }
    }

    /// Feed the event was published for. Bookmark events are user-scoped
    /// and carry none.
    pub fn fid(&self) -> Option<&FeedId> {
        match self {
            WsEvent::ActivityAdded { fid, .. }
            | WsEvent::ActivityUpdated { fid, .. }
            | WsEvent::ActivityDeleted { fid, .. }
            | WsEvent::ActivityReactionAdded { fid, .. }
            | WsEvent::ActivityReactionUpdated { fid, .. }
            | WsEvent::ActivityReactionDeleted { fid, .. }
            | WsEvent::ActivityPinned { fid, .. }
            | WsEvent::ActivityUnpinned { fid, .. }
            | WsEvent::CommentAdded { fid, .. }
            | WsEvent::CommentUpdated { fid, .. }
            | WsEvent::CommentDeleted { fid, .. }
            | WsEvent::CommentReactionAdded { fid, .. }
            | WsEvent::CommentReactionDeleted { fid, .. }
            | WsEvent::FeedUpdated { fid, .. }
            | WsEvent::FeedDeleted { fid, .. }
            | WsEvent::FollowCreated { fid, .. }
            | WsEvent::FollowUpdated { fid, .. }
            | WsEvent::FollowDeleted { fid, .. }
            | WsEvent::MemberAdded { fid, .. }
            | WsEvent::MemberUpdated { fid, .. }
            | WsEvent::MemberRemoved { fid, .. }
            | WsEvent::PollUpdated { fid, .. }
            | WsEvent::PollClosed { fid, .. }
            | WsEvent::PollDeleted { fid, .. }
            | WsEvent::PollVoteCasted { fid, .. }
            | WsEvent::PollVoteChanged { fid, .. }
            | WsEvent::PollVoteRemoved { fid, .. } => Some(fid),
            WsEvent::BookmarkAdded { .. }
            | WsEvent::BookmarkUpdated { .. }
            | WsEvent::BookmarkDeleted { .. }
            | WsEvent::Unknown => None,
        }
    }

    /// Event time, if the event carries one.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        match self {
            WsEvent::ActivityAdded { created_at, .. }
            | WsEvent::ActivityUpdated { created_at, .. }
            | WsEvent::ActivityDeleted { created_at, .. }
            | WsEvent::ActivityReactionAdded { created_at, .. }
            | WsEvent::ActivityReactionUpdated { created_at, .. }
            | WsEvent::ActivityReactionDeleted { created_at, .. }
            | WsEvent::ActivityPinned { created_at, .. }
            | WsEvent::ActivityUnpinned { created_at, .. }
            | WsEvent::BookmarkAdded { created_at, .. }
            | WsEvent::BookmarkUpdated { created_at, .. }
            | WsEvent::BookmarkDeleted { created_at, .. }
            | WsEvent::CommentAdded { created_at, .. }
            | WsEvent::CommentUpdated { created_at, .. }
            | WsEvent::CommentDeleted { created_at, .. }
            | WsEvent::CommentReactionAdded { created_at, .. }
            | WsEvent::CommentReactionDeleted { created_at, .. }
            | WsEvent::FeedUpdated { created_at, .. }
            | WsEvent::FeedDeleted { created_at, .. }
            | WsEvent::FollowCreated { created_at, .. }
            | WsEvent::FollowUpdated { created_at, .. }
            | WsEvent::FollowDeleted { created_at, .. }
            | WsEvent::MemberAdded { created_at, .. }
            | WsEvent::MemberUpdated { created_at, .. }
            | WsEvent::MemberRemoved { created_at, .. }
            | WsEvent::PollUpdated { created_at, .. }
            | WsEvent::PollClosed { created_at, .. }
            | WsEvent::PollDeleted { created_at, .. }
            | WsEvent::PollVoteCasted { created_at, .. }
            | WsEvent::PollVoteChanged { created_at, .. }
            | WsEvent::PollVoteRemoved { created_at, .. } => Some(*created_at),
            WsEvent::Unknown => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_tagged_event() {
        let frame = json!({
            "type": "feeds.comment.added",
            "fid": "user:bob",
            "created_at": "2024-05-01T10:00:00Z",
            "comment": {"id": "c2", "object_id": "act-1", "parent_id": "c1"}
        })
        .to_string();

        let event = WsEvent::decode(&frame).unwrap();
        assert_eq!(event.event_type(), "feeds.comment.added");
        assert_eq!(event.fid(), Some(&FeedId::new("user", "bob")));
        match event {
            WsEvent::CommentAdded { comment, .. } => {
                assert_eq!(comment.parent_id.as_deref(), Some("c1"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn unknown_type_is_forward_compatible() {
        let frame = json!({"type": "feeds.story.added", "fid": "user:bob"}).to_string();
        let event = WsEvent::decode(&frame).unwrap();
        assert_eq!(event, WsEvent::Unknown);
        assert!(event.fid().is_none());
        assert!(event.created_at().is_none());
    }

    #[test]
    fn missing_type_is_invalid_frame() {
        let err = WsEvent::decode(r#"{"fid": "user:bob"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidFrame(_)));

        let err = WsEvent::decode("not json").unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn known_type_with_bad_payload_is_decode_error() {
        let frame = json!({"type": "feeds.feed.deleted", "fid": "no-colon"}).to_string();
        assert!(matches!(
            WsEvent::decode(&frame),
            Err(ProtocolError::Decode(_))
        ));
    }

    #[test]
    fn encoded_frame_carries_wire_type() {
        let event = WsEvent::MemberRemoved {
            fid: FeedId::new("team", "core"),
            member_id: "alice".into(),
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        };
        let frame = event.encode().unwrap();
        assert!(frame.contains("\"type\":\"feeds.feed_member.removed\""));
        assert_eq!(WsEvent::decode(&frame).unwrap(), event);
    }
}
