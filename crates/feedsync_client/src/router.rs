//! Event routing.
//!
//! The router is the single entry point for state changes. Real-time events
//! are deduplicated, converted into [`StateEvent`]s and offered to every live
//! container; facade results are offered the same way through
//! [`EventRouter::dispatch`]. Each container decides for itself whether an
//! event concerns it by comparing identities.
//!
//! # Key Invariants
//!
//! - Containers are held weakly: dropping a facade unregisters its state
//! - Events are applied synchronously and in the order they are dispatched
//! - A real-time event seen within the dedupe window is applied once

use crate::event::StateEvent;
use feedsync_protocol::WsEvent;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// A container that applies state events.
pub trait EventSubscriber: Send + Sync {
    /// Applies `event` if it concerns this container.
    ///
    /// Returns true if state changed. Must not block on I/O.
    fn apply_event(&self, event: &StateEvent) -> bool;
}

/// Statistics about routed events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterStats {
    /// Real-time events received.
    pub received: u64,
    /// Real-time events dropped as duplicates.
    pub duplicates: u64,
    /// Real-time events of unknown type.
    pub ignored: u64,
    /// Events offered to containers (real-time and local).
    pub dispatched: u64,
    /// Container changes caused by dispatched events.
    pub applied: u64,
}

/// Bounded FIFO of recently seen event fingerprints.
#[derive(Debug, Default)]
struct RecentEvents {
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl RecentEvents {
    /// Records `fingerprint`. Returns false if it was already present.
    fn record(&mut self, fingerprint: String, capacity: usize) -> bool {
        if self.seen.contains(&fingerprint) {
            return false;
        }
        if self.order.len() >= capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
        self.seen.insert(fingerprint.clone());
        self.order.push_back(fingerprint);
        true
    }
}

/// Fans events out to registered containers.
pub struct EventRouter {
    subscribers: RwLock<Vec<Weak<dyn EventSubscriber>>>,
    recent: Mutex<RecentEvents>,
    dedupe_window: usize,
    stats: RwLock<RouterStats>,
}

impl EventRouter {
    /// Creates a router keeping `dedupe_window` fingerprints (0 disables).
    pub fn new(dedupe_window: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            recent: Mutex::new(RecentEvents::default()),
            dedupe_window,
            stats: RwLock::new(RouterStats::default()),
        }
    }

    /// Registers a container. It is dropped from the router when the last
    /// strong reference goes away.
    pub fn register<S: EventSubscriber + 'static>(&self, subscriber: &Arc<S>) {
        let subscriber: Arc<dyn EventSubscriber> = subscriber.clone();
        self.subscribers.write().push(Arc::downgrade(&subscriber));
    }

    /// Number of live containers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Returns routing statistics.
    pub fn stats(&self) -> RouterStats {
        self.stats.read().clone()
    }

    /// Handles a real-time event. Returns the number of containers changed.
    pub fn handle_ws(&self, event: WsEvent) -> usize {
        self.stats.write().received += 1;

        if self.dedupe_window > 0 {
            if let Some(fingerprint) = fingerprint(&event) {
                if !self.recent.lock().record(fingerprint, self.dedupe_window) {
                    debug!(event_type = event.event_type(), "dropping duplicate event");
                    self.stats.write().duplicates += 1;
                    return 0;
                }
            }
        }

        let event_type = event.event_type();
        match StateEvent::from_ws(event) {
            Some(state_event) => self.dispatch(&state_event),
            None => {
                debug!(event_type, "ignoring unknown event");
                self.stats.write().ignored += 1;
                0
            }
        }
    }

    /// Offers `event` to every live container. Returns the number changed.
    pub fn dispatch(&self, event: &StateEvent) -> usize {
        let live = self.live_subscribers();
        let applied = live
            .iter()
            .filter(|subscriber| subscriber.apply_event(event))
            .count();

        {
            let mut stats = self.stats.write();
            stats.dispatched += 1;
            stats.applied += applied as u64;
        }
        trace!(event = event.name(), containers = live.len(), applied, "dispatched");
        applied
    }

    fn live_subscribers(&self) -> Vec<Arc<dyn EventSubscriber>> {
        let (live, dead) = {
            let subscribers = self.subscribers.read();
            let live: Vec<_> = subscribers.iter().filter_map(Weak::upgrade).collect();
            let dead = subscribers.len() - live.len();
            (live, dead)
        };
        if dead > 0 {
            self.subscribers.write().retain(|weak| weak.strong_count() > 0);
            trace!(dropped = dead, "pruned released containers");
        }
        live
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new(256)
    }
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("subscribers", &self.subscriber_count())
            .field("dedupe_window", &self.dedupe_window)
            .finish()
    }
}

/// Identity of a real-time event: type, feed, resource and event time.
fn fingerprint(event: &WsEvent) -> Option<String> {
    let resource = match event {
        WsEvent::ActivityAdded { activity, .. }
        | WsEvent::ActivityUpdated { activity, .. }
        | WsEvent::ActivityDeleted { activity, .. } => activity.id.clone(),
        WsEvent::ActivityReactionAdded {
            activity, reaction, ..
        }
        | WsEvent::ActivityReactionUpdated {
            activity, reaction, ..
        }
        | WsEvent::ActivityReactionDeleted {
            activity, reaction, ..
        } => format!("{}/{}/{}", activity.id, reaction.user.id, reaction.kind),
        WsEvent::ActivityPinned {
            pinned_activity, ..
        }
        | WsEvent::ActivityUnpinned {
            pinned_activity, ..
        } => pinned_activity.activity.id.clone(),
        WsEvent::BookmarkAdded { bookmark, .. }
        | WsEvent::BookmarkUpdated { bookmark, .. }
        | WsEvent::BookmarkDeleted { bookmark, .. } => {
            format!("{}/{}", bookmark.user.id, bookmark.activity.id)
        }
        WsEvent::CommentAdded { comment, .. }
        | WsEvent::CommentUpdated { comment, .. }
        | WsEvent::CommentDeleted { comment, .. } => comment.id.clone(),
        WsEvent::CommentReactionAdded {
            comment, reaction, ..
        }
        | WsEvent::CommentReactionDeleted {
            comment, reaction, ..
        } => format!("{}/{}/{}", comment.id, reaction.user.id, reaction.kind),
        WsEvent::FeedUpdated { .. } | WsEvent::FeedDeleted { .. } => String::new(),
        WsEvent::FollowCreated { follow, .. }
        | WsEvent::FollowUpdated { follow, .. }
        | WsEvent::FollowDeleted { follow, .. } => {
            format!("{}/{}", follow.source_feed.feed, follow.target_feed.feed)
        }
        WsEvent::MemberAdded { member, .. } | WsEvent::MemberUpdated { member, .. } => {
            member.user.id.clone()
        }
        WsEvent::MemberRemoved { member_id, .. } => member_id.clone(),
        WsEvent::PollUpdated { poll, .. }
        | WsEvent::PollClosed { poll, .. }
        | WsEvent::PollDeleted { poll, .. } => poll.id.clone(),
        WsEvent::PollVoteCasted { poll_vote, .. }
        | WsEvent::PollVoteChanged { poll_vote, .. }
        | WsEvent::PollVoteRemoved { poll_vote, .. } => poll_vote.id.clone(),
        WsEvent::Unknown => return None,
    };
    let fid = event.fid().map(ToString::to_string).unwrap_or_default();
    let at = event
        .created_at()
        .map(|at| at.timestamp_micros())
        .unwrap_or_default();
    Some(format!("{}|{}|{}|{}", event.event_type(), fid, resource, at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedsync_core::FeedId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        seen: AtomicUsize,
    }

    impl EventSubscriber for Counting {
        fn apply_event(&self, _event: &StateEvent) -> bool {
            self.seen.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    fn feed_deleted(secs: i64) -> WsEvent {
        WsEvent::FeedDeleted {
            fid: FeedId::new("user", "bob"),
            created_at: chrono::DateTime::from_timestamp(secs, 0).unwrap(),
        }
    }

    #[test]
    fn duplicates_within_window_are_dropped() {
        let router = EventRouter::new(2);
        let counting = Arc::new(Counting::default());
        router.register(&counting);

        assert_eq!(router.handle_ws(feed_deleted(1)), 1);
        assert_eq!(router.handle_ws(feed_deleted(1)), 0);
        assert_eq!(counting.seen.load(Ordering::SeqCst), 1);

        // Evict the first fingerprint.
        router.handle_ws(feed_deleted(2));
        router.handle_ws(feed_deleted(3));
        assert_eq!(router.handle_ws(feed_deleted(1)), 1);

        let stats = router.stats();
        assert_eq!(stats.received, 5);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.dispatched, 4);
    }

    #[test]
    fn zero_window_disables_dedupe() {
        let router = EventRouter::new(0);
        let counting = Arc::new(Counting::default());
        router.register(&counting);
        router.handle_ws(feed_deleted(1));
        router.handle_ws(feed_deleted(1));
        assert_eq!(counting.seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unknown_events_are_ignored() {
        let router = EventRouter::default();
        let counting = Arc::new(Counting::default());
        router.register(&counting);
        assert_eq!(router.handle_ws(WsEvent::Unknown), 0);
        assert_eq!(router.handle_ws(WsEvent::Unknown), 0);
        assert_eq!(counting.seen.load(Ordering::SeqCst), 0);
        assert_eq!(router.stats().ignored, 2);
    }

    #[test]
    fn released_containers_are_pruned() {
        let router = EventRouter::default();
        let kept = Arc::new(Counting::default());
        let released = Arc::new(Counting::default());
        router.register(&kept);
        router.register(&released);
        assert_eq!(router.subscriber_count(), 2);

        drop(released);
        let applied = router.dispatch(&StateEvent::FeedDeleted(FeedId::new("user", "bob")));
        assert_eq!(applied, 1);
        assert_eq!(router.subscriber_count(), 1);
    }
}
