//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use chrono::{DateTime, Duration, Utc};
use feedsync_core::{ActivityData, FeedId, UserData};
use rand::seq::SliceRandom;
use rand::Rng;

/// The feed every generated activity is published into.
pub fn bench_feed() -> FeedId {
    FeedId::new("user", "bench")
}

/// An activity created `secs` seconds after the epoch.
pub fn activity(id: usize, secs: i64) -> ActivityData {
    ActivityData {
        id: format!("a{id}"),
        kind: "post".to_string(),
        feeds: vec![bench_feed()],
        user: UserData::new("bench"),
        created_at: DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(secs),
        ..Default::default()
    }
}

/// `count` activities with distinct ids and random timestamps, in random
/// order.
pub fn shuffled_activities(count: usize) -> Vec<ActivityData> {
    let mut rng = rand::thread_rng();
    let mut activities: Vec<ActivityData> = (0..count)
        .map(|id| activity(id, rng.gen_range(0..count as i64 * 4)))
        .collect();
    activities.shuffle(&mut rng);
    activities
}

/// A page of `count` activities starting at id `first`, newest first.
pub fn page(first: usize, count: usize) -> Vec<ActivityData> {
    (first..first + count)
        .map(|id| activity(id, 1_000_000 - id as i64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_are_newest_first() {
        let page = page(10, 3);
        assert_eq!(page[0].id, "a10");
        assert!(page[0].created_at > page[2].created_at);
    }

    #[test]
    fn shuffled_ids_are_distinct() {
        let mut ids: Vec<_> = shuffled_activities(50).into_iter().map(|a| a.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }
}
