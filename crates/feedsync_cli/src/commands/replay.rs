//! Replay command implementation.

use super::{frames, read_file, CliError};
use chrono::{DateTime, Utc};
use feedsync_client::{EventRouter, FeedSnapshot, FeedState, RouterStats};
use feedsync_core::{ActivityData, QueryConfiguration};
use feedsync_protocol::{GetOrCreateFeedResponse, WsEvent};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fingerprints kept while replaying.
const DEDUPE_WINDOW: usize = 256;

/// Replay result.
#[derive(Debug, Serialize)]
pub struct ReplayResult {
    /// Feed id.
    pub fid: String,
    /// Feed name, or `None` once the feed was deleted.
    pub name: Option<String>,
    /// The user replies, reactions and votes were attributed to.
    pub user: String,
    /// Whether a deletion event removed the feed.
    pub deleted: bool,
    /// Activities in feed order.
    pub activities: Vec<ActivitySummary>,
    /// Ids of pinned activities.
    pub pinned: Vec<String>,
    /// Number of followers.
    pub followers: usize,
    /// Number of followed feeds.
    pub following: usize,
    /// Number of pending follow requests.
    pub follow_requests: usize,
    /// Number of loaded members.
    pub members: usize,
    /// Event log statistics.
    pub events: EventStats,
}

/// One activity of the replayed feed.
#[derive(Debug, Serialize)]
pub struct ActivitySummary {
    /// Activity id.
    pub id: String,
    /// Activity type.
    pub kind: String,
    /// Text, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Reaction count.
    pub reactions: u32,
    /// Comment count.
    pub comments: u32,
    /// Vote count of the attached poll.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_votes: Option<u32>,
}

impl From<&ActivityData> for ActivitySummary {
    fn from(activity: &ActivityData) -> Self {
        Self {
            id: activity.id.clone(),
            kind: activity.kind.clone(),
            text: activity.text.clone(),
            created_at: activity.created_at,
            reactions: activity.reaction_count(),
            comments: activity.comment_count,
            poll_votes: activity.poll.as_ref().map(|poll| poll.vote_count),
        }
    }
}

/// Event log statistics.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct EventStats {
    /// Non-empty lines read.
    pub frames: u64,
    /// Frames that failed to decode.
    pub undecodable: u64,
    /// Frames dropped as redeliveries.
    pub duplicates: u64,
    /// Frames of unknown type.
    pub ignored: u64,
    /// Frames that changed the feed.
    pub applied: u64,
}

impl EventStats {
    fn from_router(frames: u64, undecodable: u64, stats: &RouterStats) -> Self {
        Self {
            frames,
            undecodable,
            duplicates: stats.duplicates,
            ignored: stats.ignored,
            applied: stats.applied,
        }
    }
}

/// Loads the snapshot, applies the event log and returns the final state.
pub fn replay(snapshot: &Path, events: &Path, user: Option<&str>) -> Result<ReplayResult, CliError> {
    let response: GetOrCreateFeedResponse =
        serde_json::from_str(&read_file(snapshot)?).map_err(|source| CliError::Snapshot {
            path: snapshot.to_path_buf(),
            source,
        })?;
    let snapshot = FeedSnapshot::from(response);
    let fid = snapshot.feed.feed.clone();
    let user = user
        .map(str::to_string)
        .unwrap_or_else(|| snapshot.feed.created_by.id.clone());

    let router = EventRouter::new(DEDUPE_WINDOW);
    let state = Arc::new(FeedState::new(
        fid.clone(),
        user.clone(),
        QueryConfiguration::<ActivityData>::default(),
    ));
    router.register(&state);
    state.apply_snapshot(snapshot, QueryConfiguration::default());
    info!(%fid, activities = state.activities().len(), "loaded snapshot");

    let log = read_file(events)?;
    let (mut read, mut undecodable) = (0u64, 0u64);
    for (line, frame) in frames(&log) {
        read += 1;
        match WsEvent::decode(frame) {
            Ok(event) => {
                let event_type = event.event_type();
                let changed = router.handle_ws(event);
                debug!(line, event_type, changed, "replayed frame");
            }
            Err(err) => {
                undecodable += 1;
                warn!(line, error = %err, "skipping undecodable frame");
            }
        }
    }
    let stats = EventStats::from_router(read, undecodable, &router.stats());
    info!(frames = stats.frames, applied = stats.applied, "replay finished");

    Ok(ReplayResult {
        fid: fid.raw_value(),
        name: state.feed().map(|feed| feed.name),
        user,
        deleted: state.is_deleted(),
        activities: state.activities().iter().map(ActivitySummary::from).collect(),
        pinned: state
            .pinned_activities()
            .into_iter()
            .map(|pin| pin.activity.id)
            .collect(),
        followers: state.followers().len(),
        following: state.following().len(),
        follow_requests: state.follow_requests().len(),
        members: state.members().len(),
        events: stats,
    })
}

/// Runs the replay command.
pub fn run(snapshot: &Path, events: &Path, user: Option<&str>, format: &str) -> Result<(), CliError> {
    let result = replay(snapshot, events, user)?;
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text_output(&result),
    }
    Ok(())
}

fn print_text_output(result: &ReplayResult) {
    println!("Feed: {}", result.fid);
    match (&result.name, result.deleted) {
        (_, true) => println!("  (deleted)"),
        (Some(name), false) => println!("  Name: {}", name),
        (None, false) => {}
    }
    println!("  User: {}", result.user);
    println!();

    println!("Activities ({}):", result.activities.len());
    for activity in &result.activities {
        let poll = activity
            .poll_votes
            .map(|votes| format!(", {} votes", votes))
            .unwrap_or_default();
        println!(
            "  {}  {:<24} {:<8} {} reactions, {} comments{}",
            activity.created_at.format("%Y-%m-%d %H:%M:%S"),
            activity.id,
            activity.kind,
            activity.reactions,
            activity.comments,
            poll
        );
    }
    if !result.pinned.is_empty() {
        println!("Pinned: {}", result.pinned.join(", "));
    }
    println!();

    println!("Followers:       {}", result.followers);
    println!("Following:       {}", result.following);
    println!("Follow requests: {}", result.follow_requests);
    println!("Members:         {}", result.members);
    println!();

    let stats = &result.events;
    println!("Events:");
    println!("  Frames:      {}", stats.frames);
    println!("  Applied:     {}", stats.applied);
    println!("  Duplicates:  {}", stats.duplicates);
    println!("  Ignored:     {}", stats.ignored);
    println!("  Undecodable: {}", stats.undecodable);
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedsync_core::{FeedData, FeedsReactionData};
    use feedsync_testkit::{
        activity, activity_added_event, reaction, reaction_added_event, user_feed, ReplayFiles,
    };

    fn snapshot(activities: &[ActivityData]) -> GetOrCreateFeedResponse {
        let fid = user_feed("alice");
        GetOrCreateFeedResponse {
            feed: FeedData {
                name: "Alice".into(),
                created_by: feedsync_testkit::user("alice"),
                ..FeedData::new(fid)
            }
            .into(),
            activities: activities.iter().cloned().map(Into::into).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn replays_events_onto_the_snapshot() {
        let fid = user_feed("alice");
        let a1 = activity("a1", &fid, 10);
        let a2 = activity("a2", &fid, 20);
        let like: FeedsReactionData = reaction("a1", "like", "bob", 30);
        let added = activity_added_event(&fid, &a2);
        let events = vec![
            added.clone(),
            reaction_added_event(&fid, &a1, &like),
            added,
            WsEvent::Unknown,
        ];
        let files = ReplayFiles::new(&snapshot(&[a1]), &events).unwrap();

        let result = replay(files.snapshot_path(), files.events_path(), None).unwrap();
        assert_eq!(result.fid, "user:alice");
        assert_eq!(result.user, "alice");
        let ids: Vec<_> = result.activities.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["a2", "a1"]);
        assert_eq!(result.activities[1].reactions, 1);
        assert_eq!(
            result.events,
            EventStats {
                frames: 4,
                undecodable: 0,
                duplicates: 1,
                ignored: 1,
                applied: 2,
            }
        );
    }

    #[test]
    fn undecodable_frames_are_counted_and_skipped() {
        let fid = user_feed("alice");
        let frame = activity_added_event(&fid, &activity("a2", &fid, 20))
            .encode()
            .unwrap();
        let files = ReplayFiles::with_frames(
            &snapshot(&[]),
            &["not json".to_string(), frame],
        )
        .unwrap();

        let result = replay(files.snapshot_path(), files.events_path(), Some("bob")).unwrap();
        assert_eq!(result.user, "bob");
        assert_eq!(result.activities.len(), 1);
        assert_eq!(result.events.undecodable, 1);
        assert_eq!(result.events.frames, 2);
    }

    #[test]
    fn feed_deletion_is_reported() {
        let fid = user_feed("alice");
        let deleted = WsEvent::FeedDeleted {
            fid,
            created_at: feedsync_testkit::at(5),
        };
        let files = ReplayFiles::new(&snapshot(&[]), &[deleted]).unwrap();
        let result = replay(files.snapshot_path(), files.events_path(), None).unwrap();
        assert!(result.deleted);
        assert!(result.name.is_none());
    }

    #[test]
    fn invalid_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("snapshot.json");
        let events = dir.path().join("events.jsonl");
        std::fs::write(&snapshot, "[]").unwrap();
        std::fs::write(&events, "").unwrap();
        let err = replay(&snapshot, &events, None).unwrap_err();
        assert!(matches!(err, CliError::Snapshot { .. }));
    }
}
