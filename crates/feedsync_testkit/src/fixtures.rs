//! Model fixtures.
//!
//! Timestamps are whole seconds past a fixed base so ordering in tests is
//! explicit and reproducible.

use chrono::{DateTime, Duration, Utc};
use feedsync_core::{
    ActivityData, BookmarkData, CommentData, FeedData, FeedId, FeedMemberData, FeedOwnCapability,
    FeedsReactionData, FollowData, FollowStatus, PollData, PollOptionData, PollVoteData, UserData,
};
use feedsync_protocol::WsEvent;

/// Base of all fixture timestamps.
pub const BASE_TIMESTAMP: i64 = 1_700_000_000;

/// A timestamp `secs` seconds past [`BASE_TIMESTAMP`].
pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(BASE_TIMESTAMP, 0).unwrap_or_default() + Duration::seconds(secs)
}

/// A timestamp `millis` milliseconds past [`BASE_TIMESTAMP`].
pub fn at_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(BASE_TIMESTAMP, 0).unwrap_or_default() + Duration::milliseconds(millis)
}

/// The `user:<id>` feed.
pub fn user_feed(user_id: &str) -> FeedId {
    FeedId::new("user", user_id)
}

/// The `timeline:<id>` feed.
pub fn timeline_feed(user_id: &str) -> FeedId {
    FeedId::new("timeline", user_id)
}

/// A user.
pub fn user(id: &str) -> UserData {
    UserData::new(id)
}

/// A feed owned by its id's user with the given capabilities.
pub fn feed(fid: &FeedId, capabilities: &[FeedOwnCapability]) -> FeedData {
    FeedData {
        name: fid.id().to_string(),
        created_by: user(fid.id()),
        own_capabilities: Some(capabilities.iter().cloned().collect()),
        created_at: at(0),
        updated_at: at(0),
        ..FeedData::new(fid.clone())
    }
}

/// A post by `fid`'s user into `fid`, created at `secs`.
pub fn activity(id: &str, fid: &FeedId, secs: i64) -> ActivityData {
    ActivityData {
        id: id.to_string(),
        kind: "post".to_string(),
        text: Some(format!("post {id}")),
        feeds: vec![fid.clone()],
        user: user(fid.id()),
        created_at: at(secs),
        updated_at: at(secs),
        ..Default::default()
    }
}

/// A top-level comment by `user_id` on `activity_id`.
pub fn comment(id: &str, activity_id: &str, user_id: &str, secs: i64) -> CommentData {
    CommentData {
        id: id.to_string(),
        object_id: activity_id.to_string(),
        object_type: "activity".to_string(),
        user: user(user_id),
        text: Some(format!("comment {id}")),
        created_at: at(secs),
        updated_at: at(secs),
        ..Default::default()
    }
}

/// A reply to `parent_id`.
pub fn reply(id: &str, activity_id: &str, parent_id: &str, user_id: &str, secs: i64) -> CommentData {
    CommentData {
        parent_id: Some(parent_id.to_string()),
        ..comment(id, activity_id, user_id, secs)
    }
}

/// A reaction of `kind` by `user_id` on an activity.
pub fn reaction(activity_id: &str, kind: &str, user_id: &str, secs: i64) -> FeedsReactionData {
    FeedsReactionData {
        activity_id: activity_id.to_string(),
        comment_id: None,
        kind: kind.to_string(),
        user: user(user_id),
        created_at: at(secs),
        updated_at: at(secs),
    }
}

/// A reaction of `kind` by `user_id` on a comment.
pub fn comment_reaction(
    activity_id: &str,
    comment_id: &str,
    kind: &str,
    user_id: &str,
    secs: i64,
) -> FeedsReactionData {
    FeedsReactionData {
        comment_id: Some(comment_id.to_string()),
        ..reaction(activity_id, kind, user_id, secs)
    }
}

/// A bookmark of `activity` by `user_id`.
pub fn bookmark(activity: &ActivityData, user_id: &str, secs: i64) -> BookmarkData {
    BookmarkData {
        activity: activity.clone(),
        user: user(user_id),
        folder: None,
        created_at: at(secs),
        updated_at: at(secs),
    }
}

/// A follow from `source` to `target`.
pub fn follow(source: &FeedId, target: &FeedId, status: FollowStatus, secs: i64) -> FollowData {
    FollowData {
        source_feed: FeedData {
            created_by: user(source.id()),
            ..FeedData::new(source.clone())
        },
        target_feed: FeedData {
            created_by: user(target.id()),
            ..FeedData::new(target.clone())
        },
        status,
        created_at: at(secs),
        updated_at: at(secs),
        ..Default::default()
    }
}

/// An active member.
pub fn member(user_id: &str, secs: i64) -> FeedMemberData {
    FeedMemberData {
        user: user(user_id),
        role: "member".to_string(),
        created_at: at(secs),
        updated_at: at(secs),
        ..Default::default()
    }
}

/// An open poll with one option per label, ids `o0`, `o1`, ...
pub fn poll(id: &str, labels: &[&str], enforce_unique_vote: bool) -> PollData {
    PollData {
        id: id.to_string(),
        name: format!("poll {id}"),
        enforce_unique_vote,
        voting_visibility: "public".to_string(),
        options: labels
            .iter()
            .enumerate()
            .map(|(index, label)| PollOptionData {
                id: format!("o{index}"),
                text: label.to_string(),
            })
            .collect(),
        created_at: at(0),
        updated_at: at(0),
        ..Default::default()
    }
}

/// A vote by `user_id` for `option_id`.
pub fn vote(id: &str, poll_id: &str, option_id: &str, user_id: &str, secs: i64) -> PollVoteData {
    PollVoteData {
        id: id.to_string(),
        poll_id: poll_id.to_string(),
        option_id: option_id.to_string(),
        user_id: user_id.to_string(),
        user: Some(user(user_id)),
        created_at: at(secs),
        updated_at: at(secs),
        ..Default::default()
    }
}

/// A free-text answer by `user_id`.
pub fn answer(id: &str, poll_id: &str, text: &str, user_id: &str, secs: i64) -> PollVoteData {
    PollVoteData {
        option_id: String::new(),
        answer_text: Some(text.to_string()),
        is_answer: true,
        ..vote(id, poll_id, "", user_id, secs)
    }
}

/// A real-time "activity added" event delivered for `fid`.
pub fn activity_added_event(fid: &FeedId, activity: &ActivityData) -> WsEvent {
    WsEvent::ActivityAdded {
        fid: fid.clone(),
        activity: activity.clone().into(),
        created_at: activity.created_at,
    }
}

/// A real-time "comment added" event delivered for `fid`.
pub fn comment_added_event(fid: &FeedId, comment: &CommentData) -> WsEvent {
    WsEvent::CommentAdded {
        fid: fid.clone(),
        comment: comment.clone().into(),
        created_at: comment.created_at,
    }
}

/// A real-time "reaction added" event delivered for `fid`.
pub fn reaction_added_event(
    fid: &FeedId,
    activity: &ActivityData,
    reaction: &FeedsReactionData,
) -> WsEvent {
    WsEvent::ActivityReactionAdded {
        fid: fid.clone(),
        activity: activity.clone().into(),
        reaction: reaction.clone(),
        created_at: reaction.created_at,
    }
}

/// A real-time "vote casted" event delivered for `fid`.
pub fn vote_casted_event(fid: &FeedId, vote: &PollVoteData) -> WsEvent {
    WsEvent::PollVoteCasted {
        fid: fid.clone(),
        poll_id: vote.poll_id.clone(),
        poll_vote: vote.clone(),
        created_at: vote.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_offsets_from_base() {
        assert_eq!(at(2) - at(1), Duration::seconds(1));
        assert!(at_millis(2500) > at(2));
        assert!(at_millis(2500) < at(3));
    }

    #[test]
    fn poll_options_are_numbered() {
        let poll = poll("p1", &["yes", "no"], true);
        let ids: Vec<_> = poll.options.iter().map(|option| option.id.as_str()).collect();
        assert_eq!(ids, ["o0", "o1"]);
    }

    #[test]
    fn reply_keeps_parent() {
        let reply = reply("c2", "a1", "c1", "bob", 2);
        assert_eq!(reply.parent_id.as_deref(), Some("c1"));
        assert_eq!(reply.object_id, "a1");
    }
}
