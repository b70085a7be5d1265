//! Property tests for event application.

use feedsync_client::{ActivityState, EventRouter, FeedState};
use feedsync_core::{ActivityData, CommentData, QueryConfiguration};
use feedsync_testkit::generators::{activity_batch_strategy, comment_strategy};
use feedsync_testkit::{activity_added_event, comment_added_event, user_feed};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

fn router_with_feed() -> (EventRouter, Arc<FeedState>) {
    let router = EventRouter::new(64);
    let state = Arc::new(FeedState::new(
        user_feed("alice"),
        "alice",
        QueryConfiguration::<ActivityData>::default(),
    ));
    router.register(&state);
    (router, state)
}

proptest! {
    #[test]
    fn feed_holds_each_delivered_activity_once_in_order(batch in activity_batch_strategy(60)) {
        let (router, state) = router_with_feed();
        let fid = user_feed("alice");
        let mut expected = BTreeSet::new();
        for activity in &batch {
            let delivered_for = &activity.feeds[0];
            if *delivered_for == fid {
                expected.insert(activity.id.clone());
            }
            router.handle_ws(activity_added_event(delivered_for, activity));
            // Redelivery of the same frame never changes anything.
            prop_assert_eq!(router.handle_ws(activity_added_event(delivered_for, activity)), 0);
        }

        let activities = state.activities();
        let ids: BTreeSet<String> = activities.iter().map(|a| a.id.clone()).collect();
        prop_assert_eq!(ids.len(), activities.len());
        prop_assert_eq!(ids, expected);
        let order = state.activity_query();
        for pair in activities.windows(2) {
            prop_assert!(order.compare(&pair[0], &pair[1]).is_le());
        }
    }

    #[test]
    fn new_comments_land_in_sort_position(batch in prop::collection::vec(comment_strategy(), 0..40)) {
        let mut seen = BTreeSet::new();
        let comments: Vec<CommentData> = batch
            .into_iter()
            .filter(|comment| seen.insert(comment.id.clone()))
            .collect();
        let router = EventRouter::new(0);
        let state = Arc::new(ActivityState::new(
            "a1",
            "alice",
            QueryConfiguration::<CommentData>::default(),
        ));
        router.register(&state);
        let fid = user_feed("alice");
        for comment in &comments {
            router.handle_ws(comment_added_event(&fid, comment));
        }

        let loaded = state.comments();
        let ids: BTreeSet<String> = loaded.iter().map(|c| c.id.clone()).collect();
        let expected: BTreeSet<String> = comments.iter().map(|c| c.id.clone()).collect();
        prop_assert_eq!(ids, expected);
        let order = state.comment_query();
        for pair in loaded.windows(2) {
            prop_assert!(order.compare(&pair[0], &pair[1]).is_le());
        }
    }
}
