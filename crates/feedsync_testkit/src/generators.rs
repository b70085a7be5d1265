//! Property-based test generators using proptest.
//!
//! Ids are drawn from small pools so generated batches overlap, and
//! timestamps collide often enough to exercise tie-breaking.

use crate::fixtures::{activity, at, comment, user_feed, vote};
use feedsync_core::{ActivityData, CommentData, FeedId, PollVoteData};
use proptest::prelude::*;

/// Strategy for ids from a pool of `pool` values.
pub fn id_strategy(prefix: &'static str, pool: u32) -> impl Strategy<Value = String> {
    (0..pool).prop_map(move |n| format!("{prefix}{n}"))
}

/// Strategy for feed ids of a few users.
pub fn feed_id_strategy() -> impl Strategy<Value = FeedId> {
    prop::sample::select(vec!["alice", "bob", "carol"]).prop_map(user_feed)
}

/// Strategy for activities with overlapping ids and colliding timestamps.
pub fn activity_strategy() -> impl Strategy<Value = ActivityData> {
    (id_strategy("a", 40), feed_id_strategy(), 0i64..20, -5i32..50).prop_map(
        |(id, fid, secs, popularity)| ActivityData {
            popularity,
            ..activity(&id, &fid, secs)
        },
    )
}

/// Strategy for batches of activities.
pub fn activity_batch_strategy(max: usize) -> impl Strategy<Value = Vec<ActivityData>> {
    prop::collection::vec(activity_strategy(), 0..max)
}

/// Strategy for top-level comments on `a1`.
pub fn comment_strategy() -> impl Strategy<Value = CommentData> {
    (id_strategy("c", 30), 0i64..15, -3i32..10).prop_map(|(id, secs, score)| CommentData {
        score,
        ..comment(&id, "a1", "bob", secs)
    })
}

/// Strategy for votes on `p1` over options `o0..o3`.
pub fn vote_strategy() -> impl Strategy<Value = PollVoteData> {
    (id_strategy("v", 20), 0u32..3, 0i64..10)
        .prop_map(|(id, option, secs)| vote(&id, "p1", &format!("o{option}"), "alice", secs))
}

/// Strategy for a timestamp offset in seconds.
pub fn timestamp_strategy() -> impl Strategy<Value = chrono::DateTime<chrono::Utc>> {
    (0i64..1_000).prop_map(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedsync_core::{Identifiable, QueryConfiguration, SortedVec};
    use proptest::test_runner::TestRunner;

    #[test]
    fn generated_activities_live_in_their_feed() {
        let mut runner = TestRunner::default();
        runner
            .run(&activity_strategy(), |activity| {
                prop_assert_eq!(activity.feeds.len(), 1);
                prop_assert!(activity.belongs_to(&activity.feeds[0]));
                Ok(())
            })
            .unwrap();
    }

    proptest! {
        #[test]
        fn sorted_insert_keeps_order_and_ids_unique(batch in activity_batch_strategy(60)) {
            let config = QueryConfiguration::<ActivityData>::default();
            let mut items: Vec<ActivityData> = Vec::new();
            for activity in batch {
                items.sorted_insert(activity, config.comparator());
            }
            for pair in items.windows(2) {
                prop_assert!(config.compare(&pair[0], &pair[1]).is_le());
            }
            let mut ids: Vec<String> = items.iter().map(|activity| activity.id()).collect();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), items.len());
        }
    }
}
