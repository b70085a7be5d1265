//! Integration tests for facades, router and state containers against an
//! in-memory backend.

use feedsync_client::{
    ActivitiesQuery, BookmarksQuery, ChannelEventSource, ClientConfig, ClientError, FeedQuery,
    FeedsClient, LoadPhase, ReplayEventSource, StateEvent,
};
use feedsync_core::{ActivityData, FeedOwnCapability, FollowStatus};
use feedsync_protocol::{
    AddActivityRequest, AddBookmarkRequest, AddCommentRequest, AddReactionRequest,
    CastPollVoteRequest, CreatePollRequest,
};
use feedsync_testkit::{
    activity, activity_added_event, comment, comment_added_event, feed, follow, reply, user_feed,
    InMemoryBackend,
};
use std::sync::Arc;

fn client(backend: &Arc<InMemoryBackend>) -> FeedsClient {
    FeedsClient::new(ClientConfig::new(backend.user_id()), backend.clone())
}

fn ids<T>(items: &[T], id: impl Fn(&T) -> &str) -> Vec<String> {
    items.iter().map(|item| id(item).to_string()).collect()
}

/// Backend acting for alice with `user:alice` holding a1..an, ten seconds
/// apart.
fn seeded(count: i64) -> Arc<InMemoryBackend> {
    let backend = Arc::new(InMemoryBackend::new("alice"));
    let fid = user_feed("alice");
    backend.insert_feed(feed(
        &fid,
        &[FeedOwnCapability::ReadFeed, FeedOwnCapability::AddActivity],
    ));
    for n in 1..=count {
        backend.insert_activity(activity(&format!("a{n}"), &fid, n * 10));
    }
    backend
}

#[tokio::test]
async fn feed_get_loads_snapshot_and_caches_capabilities() {
    let backend = seeded(3);
    let client = client(&backend);
    let fid = user_feed("alice");
    let feed = client.feed(FeedQuery::new(fid.clone()));

    let data = feed.get().await.unwrap();
    assert_eq!(data.feed, fid);
    assert_eq!(feed.state().phase(), LoadPhase::Populated);
    assert_eq!(
        ids(&feed.state().activities(), |a| a.id.as_str()),
        ["a3", "a2", "a1"]
    );

    let cached = client.capability_cache().get(&fid).unwrap();
    assert!(cached.contains(&FeedOwnCapability::AddActivity));
    assert_eq!(feed.state().own_capabilities(), Some(cached));
}

#[tokio::test]
async fn realtime_duplicates_are_applied_once() {
    let backend = seeded(2);
    let client = client(&backend);
    let fid = user_feed("alice");
    let feed = client.feed(FeedQuery::new(fid.clone()));
    feed.get().await.unwrap();

    let event = activity_added_event(&fid, &activity("a9", &fid, 90));
    assert_eq!(client.handle_event(event.clone()), 1);
    assert_eq!(client.handle_event(event), 0);

    assert_eq!(feed.state().activities().len(), 3);
    assert_eq!(client.router().stats().duplicates, 1);
}

#[tokio::test]
async fn realtime_activity_lands_in_sort_position() {
    let backend = seeded(3);
    let client = client(&backend);
    let fid = user_feed("alice");
    let feed = client.feed(FeedQuery::new(fid.clone()));
    feed.get().await.unwrap();

    client.handle_event(activity_added_event(&fid, &activity("d", &fid, 15)));
    assert_eq!(
        ids(&feed.state().activities(), |a| a.id.as_str()),
        ["a3", "a2", "d", "a1"]
    );
}

#[tokio::test]
async fn events_for_other_feeds_are_ignored() {
    let backend = seeded(1);
    let client = client(&backend);
    let feed = client.feed(FeedQuery::new(user_feed("alice")));
    feed.get().await.unwrap();

    let other = user_feed("bob");
    assert_eq!(
        client.handle_event(activity_added_event(&other, &activity("b1", &other, 5))),
        0
    );
    assert_eq!(feed.state().activities().len(), 1);
}

#[tokio::test]
async fn local_result_and_realtime_echo_apply_once() {
    let backend = seeded(1);
    let client = client(&backend);
    let fid = user_feed("alice");
    let feed = client.feed(FeedQuery::new(fid.clone()));
    feed.get().await.unwrap();

    let created = feed
        .add_activity(AddActivityRequest::post("hello", vec![]))
        .await
        .unwrap();
    assert_eq!(feed.state().activities()[0].id, created.id);

    let reaction = feed
        .add_reaction(&created.id, &AddReactionRequest::new("like"))
        .await
        .unwrap();
    assert_eq!(reaction.activity_id, created.id);

    for event in backend.take_events() {
        client.handle_event(event);
    }

    let activities = feed.state().activities();
    assert_eq!(activities.len(), 2);
    let local = feed.state().activity(&created.id).unwrap();
    assert_eq!(local.reaction_count(), 1);
    assert!(local.reactions.has_own("like"));
}

#[tokio::test]
async fn failed_reload_leaves_state_untouched() {
    let backend = seeded(2);
    let client = client(&backend);
    let feed = client.feed(FeedQuery::new(user_feed("alice")));
    feed.get().await.unwrap();
    let before = feed.state().activities();

    backend.fail_next(ClientError::transport_retryable("offline"));
    let err = feed.get().await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(feed.state().activities(), before);
    assert_eq!(feed.state().phase(), LoadPhase::Populated);
}

#[tokio::test]
async fn failed_first_load_resets_phase() {
    let backend = seeded(2);
    let client = client(&backend);
    let feed = client.feed(FeedQuery::new(user_feed("alice")));

    backend.fail_next(ClientError::api(503, "unavailable", "try later"));
    assert!(feed.get().await.is_err());
    assert_eq!(feed.state().phase(), LoadPhase::Uninitialized);
    assert!(feed.state().activities().is_empty());
}

#[tokio::test]
async fn overlapping_pages_merge_without_duplicates() {
    let backend = seeded(5);
    let client = client(&backend);
    let fid = user_feed("alice");
    let feed = client.feed(FeedQuery::new(fid.clone()).with_activity_limit(3));
    feed.get().await.unwrap();
    assert_eq!(
        ids(&feed.state().activities(), |a| a.id.as_str()),
        ["a5", "a4", "a3"]
    );

    // A newer post shifts the server's offsets by one.
    backend.insert_activity(activity("a6", &fid, 60));
    let page = feed.query_more_activities(None).await.unwrap();
    assert_eq!(ids(&page, |a| a.id.as_str()), ["a3", "a2", "a1"]);
    assert_eq!(
        ids(&feed.state().activities(), |a| a.id.as_str()),
        ["a5", "a4", "a3", "a2", "a1"]
    );
    assert!(!feed.state().has_more_activities());

    let err = feed.query_more_activities(None).await.unwrap_err();
    assert_eq!(err, ClientError::NoMorePages);
}

#[tokio::test]
async fn unique_vote_moves_between_options() {
    let backend = seeded(0);
    let client = client(&backend);
    let fid = user_feed("alice");
    let feed = client.feed(FeedQuery::new(fid.clone()));
    feed.get().await.unwrap();

    let poll_request = CreatePollRequest {
        name: "lunch".into(),
        options: vec!["pizza".into(), "sushi".into()],
        enforce_unique_vote: true,
        ..Default::default()
    };
    let posted = feed.create_poll(&poll_request, "poll").await.unwrap();
    let activity = client.activity(posted.id.clone(), fid.clone());
    activity.get().await.unwrap();

    activity
        .cast_poll_vote(&CastPollVoteRequest::option("o0"))
        .await
        .unwrap();
    activity
        .cast_poll_vote(&CastPollVoteRequest::option("o1"))
        .await
        .unwrap();
    for event in backend.take_events() {
        client.handle_event(event);
    }

    let poll = activity.state().poll().unwrap();
    assert_eq!(poll.vote_counts_by_option.get("o0").copied().unwrap_or(0), 0);
    assert_eq!(poll.vote_counts_by_option.get("o1").copied(), Some(1));
    assert_eq!(poll.vote_count, 1);
    assert_eq!(poll.own_votes.len(), 1);
    assert!(poll.has_own_vote("o1"));

    let in_feed = feed.state().activity(&posted.id).unwrap();
    assert_eq!(in_feed.poll.unwrap().vote_count, 1);
}

#[tokio::test]
async fn multi_vote_keeps_every_option() {
    let backend = seeded(0);
    let client = client(&backend);
    let fid = user_feed("alice");
    let feed = client.feed(FeedQuery::new(fid.clone()));
    feed.get().await.unwrap();

    let poll_request = CreatePollRequest {
        name: "toppings".into(),
        options: vec!["cheese".into(), "olives".into(), "basil".into()],
        ..Default::default()
    };
    let posted = feed.create_poll(&poll_request, "poll").await.unwrap();
    let activity = client.activity(posted.id.clone(), fid);
    activity.get().await.unwrap();

    let first = activity
        .cast_poll_vote(&CastPollVoteRequest::option("o0"))
        .await
        .unwrap();
    activity
        .cast_poll_vote(&CastPollVoteRequest::option("o2"))
        .await
        .unwrap();
    let poll = activity.state().poll().unwrap();
    assert_eq!(poll.vote_count, 2);
    assert_eq!(poll.own_votes.len(), 2);

    activity.remove_poll_vote(&first.id).await.unwrap();
    let poll = activity.state().poll().unwrap();
    assert_eq!(poll.vote_count, 1);
    assert!(!poll.has_own_vote("o0"));
    assert!(poll.has_own_vote("o2"));
}

#[tokio::test]
async fn comment_then_realtime_reply() {
    let backend = seeded(1);
    let client = client(&backend);
    let fid = user_feed("alice");
    let activity = client.activity("a1", fid.clone());
    activity.get().await.unwrap();

    let first = activity.add_comment("first!").await.unwrap();
    assert_eq!(ids(&activity.state().comments(), |c| c.id.as_str()), [first.id.clone()]);

    let answer = reply("c2", "a1", &first.id, "bob", 500);
    client.handle_event(comment_added_event(&fid, &answer));

    let parent = activity.state().comment(&first.id).unwrap();
    assert_eq!(parent.reply_count, 1);
    assert_eq!(
        parent.replies.as_deref().map(|replies| ids(replies, |c| c.id.as_str())),
        Some(vec!["c2".to_string()])
    );
    assert_eq!(activity.state().activity().unwrap().comment_count, 2);

    for event in backend.take_events() {
        client.handle_event(event);
    }
    assert_eq!(activity.state().activity().unwrap().comment_count, 2);
    assert_eq!(activity.state().comments().len(), 1);
}

/// Backend holding a1 with three comments on the server, none of them in
/// the activity's sample, and top-level comment c0 among them.
fn commented() -> Arc<InMemoryBackend> {
    let backend = seeded(0);
    let fid = user_feed("alice");
    backend.insert_activity(ActivityData {
        comment_count: 3,
        ..activity("a1", &fid, 10)
    });
    backend.insert_comment(comment("c0", "a1", "bob", 20));
    backend
}

#[tokio::test]
async fn reply_to_unloaded_parent_and_its_echo_count_once() {
    let backend = commented();
    let client = client(&backend);
    let feed = client.feed(FeedQuery::new(user_feed("alice")));
    feed.get().await.unwrap();
    assert!(feed.state().activity("a1").unwrap().comments.is_empty());

    let request = AddCommentRequest {
        parent_id: Some("c0".into()),
        ..AddCommentRequest::on_activity("a1", "agreed")
    };
    let posted = feed.add_comment(&request).await.unwrap();
    assert_eq!(feed.state().activity("a1").unwrap().comment_count, 4);

    let echoes = backend.take_events();
    assert_eq!(echoes.len(), 1);
    for event in echoes {
        client.handle_event(event);
    }
    assert_eq!(feed.state().activity("a1").unwrap().comment_count, 4);
    assert_eq!(backend.stored_activity("a1").unwrap().comment_count, 4);

    // Applying the local result again bypasses the redelivery window.
    client.router().dispatch(&StateEvent::CommentAdded(posted));
    assert_eq!(feed.state().activity("a1").unwrap().comment_count, 4);
}

#[tokio::test]
async fn deleting_unloaded_comment_and_its_echo_count_once() {
    let backend = commented();
    let client = client(&backend);
    let feed = client.feed(FeedQuery::new(user_feed("alice")));
    feed.get().await.unwrap();

    feed.delete_comment("c0").await.unwrap();
    assert_eq!(feed.state().activity("a1").unwrap().comment_count, 2);

    for event in backend.take_events() {
        client.handle_event(event);
    }
    assert_eq!(feed.state().activity("a1").unwrap().comment_count, 2);
    assert_eq!(backend.stored_activity("a1").unwrap().comment_count, 2);
}

#[tokio::test]
async fn capabilities_fetch_whole_set_on_partial_miss() {
    let backend = seeded(0);
    let client = client(&backend);
    let alice = user_feed("alice");
    let bob = user_feed("bob");
    backend.set_capabilities(&alice, &[FeedOwnCapability::ReadFeed]);
    backend.set_capabilities(&bob, &[FeedOwnCapability::Follow]);

    client.own_capabilities([alice.clone()]).await.unwrap();
    client.own_capabilities([alice.clone()]).await.unwrap();
    assert_eq!(backend.call_count("own_capabilities_batch"), 1);

    let both = client
        .own_capabilities([alice.clone(), bob.clone()])
        .await
        .unwrap();
    assert_eq!(backend.call_count("own_capabilities_batch"), 2);
    assert_eq!(both.len(), 2);
    assert!(both[&bob].contains(&FeedOwnCapability::Follow));
}

#[tokio::test]
async fn changed_capabilities_reach_loaded_feeds() {
    let backend = seeded(0);
    let client = client(&backend);
    let alice = user_feed("alice");
    let feed = client.feed(FeedQuery::new(alice.clone()));
    feed.get().await.unwrap();
    assert!(!feed
        .state()
        .own_capabilities()
        .unwrap()
        .contains(&FeedOwnCapability::PinActivity));

    backend.set_capabilities(
        &alice,
        &[FeedOwnCapability::ReadFeed, FeedOwnCapability::PinActivity],
    );
    client
        .own_capabilities([alice.clone(), user_feed("bob")])
        .await
        .unwrap();
    assert!(feed
        .state()
        .own_capabilities()
        .unwrap()
        .contains(&FeedOwnCapability::PinActivity));
}

#[tokio::test]
async fn follow_lands_in_following_once() {
    let backend = seeded(0);
    let client = client(&backend);
    let alice = user_feed("alice");
    let bob = user_feed("bob");
    let feed = client.feed(FeedQuery::new(alice.clone()));
    feed.get().await.unwrap();

    let created = feed.follow(&bob).await.unwrap();
    assert_eq!(created.status, FollowStatus::Accepted);
    for event in backend.take_events() {
        client.handle_event(event);
    }
    assert_eq!(feed.state().following().len(), 1);

    feed.unfollow(&bob).await.unwrap();
    assert!(feed.state().following().is_empty());
}

#[tokio::test]
async fn follow_requests_are_accepted_into_followers() {
    let backend = seeded(0);
    let alice = user_feed("alice");
    let carol = user_feed("carol");
    backend.insert_follow(follow(&carol, &alice, FollowStatus::Pending, 5));
    let client = client(&backend);
    let feed = client.feed(FeedQuery::new(alice.clone()));
    feed.get().await.unwrap();
    assert_eq!(feed.state().follow_requests().len(), 1);
    assert!(feed.state().followers().is_empty());

    feed.accept_follow(&carol).await.unwrap();
    assert!(feed.state().follow_requests().is_empty());
    assert_eq!(feed.state().followers().len(), 1);
}

#[tokio::test]
async fn pins_follow_pin_and_unpin() {
    let backend = seeded(2);
    let client = client(&backend);
    let feed = client.feed(FeedQuery::new(user_feed("alice")));
    feed.get().await.unwrap();

    feed.pin("a1").await.unwrap();
    assert_eq!(feed.state().pinned_activities().len(), 1);
    for event in backend.take_events() {
        client.handle_event(event);
    }
    assert_eq!(feed.state().pinned_activities().len(), 1);

    feed.unpin("a1").await.unwrap();
    assert!(feed.state().pinned_activities().is_empty());
}

#[tokio::test]
async fn list_paging_reports_not_loaded_and_exhaustion() {
    let backend = seeded(3);
    let client = client(&backend);
    let list = client.activity_list(ActivitiesQuery::new().with_limit(2));

    assert_eq!(
        list.query_more(None).await.unwrap_err(),
        ClientError::NotLoaded { what: "list" }
    );

    let first = list.get().await.unwrap();
    assert_eq!(ids(&first, |a| a.id.as_str()), ["a3", "a2"]);
    let more = list.query_more(None).await.unwrap();
    assert_eq!(ids(&more, |a| a.id.as_str()), ["a1"]);
    assert_eq!(list.state().items().len(), 3);
    assert_eq!(
        list.query_more(None).await.unwrap_err(),
        ClientError::NoMorePages
    );
}

#[tokio::test]
async fn bookmark_list_tracks_feed_mutations() {
    let backend = seeded(2);
    let client = client(&backend);
    let feed = client.feed(FeedQuery::new(user_feed("alice")));
    feed.get().await.unwrap();
    let bookmarks = client.bookmark_list(BookmarksQuery::new());
    assert!(bookmarks.get().await.unwrap().is_empty());

    feed.add_bookmark("a2", &AddBookmarkRequest::default())
        .await
        .unwrap();
    assert_eq!(bookmarks.state().items().len(), 1);
    assert!(feed.state().activity("a2").unwrap().is_bookmarked());

    feed.delete_activity("a2").await.unwrap();
    assert!(bookmarks.state().items().is_empty());
    assert!(feed.state().activity("a2").is_none());
}

#[tokio::test]
async fn connect_pumps_frames_until_the_source_ends() {
    let backend = seeded(1);
    let client = client(&backend);
    let fid = user_feed("alice");
    let feed = client.feed(FeedQuery::new(fid.clone()));
    feed.get().await.unwrap();

    let (tx, source) = ChannelEventSource::new();
    let pump = client.connect(source);
    let frame = activity_added_event(&fid, &activity("a7", &fid, 70))
        .encode()
        .unwrap();
    tx.send(frame).unwrap();
    tx.send("{ not json".to_string()).unwrap();
    drop(tx);

    assert_eq!(pump.await.unwrap(), 1);
    assert_eq!(feed.state().activities()[0].id, "a7");
}

#[tokio::test]
async fn replayed_events_reach_every_container() {
    let backend = seeded(1);
    let client = client(&backend);
    let fid = user_feed("alice");
    let feed = client.feed(FeedQuery::new(fid.clone()));
    feed.get().await.unwrap();
    let list = client.activity_list(ActivitiesQuery::new());
    list.get().await.unwrap();

    let events = vec![
        activity_added_event(&fid, &activity("a2", &fid, 20)),
        activity_added_event(&fid, &activity("a3", &fid, 30)),
    ];
    let routed = client.connect(ReplayEventSource::new(events)).await.unwrap();
    assert_eq!(routed, 2);
    assert_eq!(feed.state().activities().len(), 3);
    assert_eq!(list.state().items().len(), 3);
}

#[tokio::test]
async fn dropped_facades_stop_receiving_events() {
    let backend = seeded(1);
    let client = client(&backend);
    let fid = user_feed("alice");
    let feed = client.feed(FeedQuery::new(fid.clone()));
    let list = client.activity_list(ActivitiesQuery::new());
    assert_eq!(client.router().subscriber_count(), 2);

    drop(feed);
    assert_eq!(client.router().subscriber_count(), 1);

    list.get().await.unwrap();
    assert_eq!(
        client.handle_event(activity_added_event(&fid, &activity("a5", &fid, 50))),
        1
    );
    drop(list);
    assert_eq!(
        client.handle_event(activity_added_event(&fid, &activity("a6", &fid, 60))),
        0
    );
    assert_eq!(client.router().subscriber_count(), 0);
}
