//! Change feed for observing state container mutations.
//!
//! State containers emit one change value after each applied mutation.
//! Observers hold the receiving end only; dropping a receiver unsubscribes
//! it on the next emit.
//!
//! # Usage
//!
//! ```rust,ignore
//! let changes = feed_state.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(change) = changes.recv() {
//!         println!("changed: {:?}", change);
//!     }
//! });
//! ```

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::trace;

/// Distributes change notifications to subscribers.
///
/// The change feed:
/// - Emits only after the mutation it describes has been applied
/// - Preserves emit order per subscriber
/// - Supports multiple subscribers
/// - Is thread-safe
pub struct ChangeFeed<C> {
    /// Subscribers (senders).
    subscribers: RwLock<Vec<Sender<C>>>,
    /// Number of changes emitted so far.
    emitted: AtomicU64,
}

impl<C: Clone + Send> ChangeFeed<C> {
    /// Creates a new change feed.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            emitted: AtomicU64::new(0),
        }
    }

    /// Subscribes to the change feed.
    ///
    /// Returns a receiver that will receive all future changes.
    pub fn subscribe(&self) -> Receiver<C> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Emits a change to all subscribers, dropping disconnected ones.
    pub fn emit(&self, change: C) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|tx| tx.send(change.clone()).is_ok());
        if subscribers.len() < before {
            trace!(
                dropped = before - subscribers.len(),
                "pruned disconnected subscribers"
            );
        }
    }

    /// Emits several changes in order.
    pub fn emit_batch(&self, changes: impl IntoIterator<Item = C>) {
        for change in changes {
            self.emit(change);
        }
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Returns how many changes have been emitted.
    pub fn emitted_count(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }
}

impl<C: Clone + Send> Default for ChangeFeed<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Change {
        Items,
        Feed,
    }

    #[test]
    fn emit_and_receive() {
        let feed = ChangeFeed::new();
        let rx = feed.subscribe();

        feed.emit(Change::Items);

        let received = rx.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(received, Change::Items);
        assert_eq!(feed.emitted_count(), 1);
    }

    #[test]
    fn multiple_subscribers() {
        let feed = ChangeFeed::new();
        let rx1 = feed.subscribe();
        let rx2 = feed.subscribe();

        feed.emit_batch([Change::Feed, Change::Items]);

        assert_eq!(rx1.recv().unwrap(), Change::Feed);
        assert_eq!(rx1.recv().unwrap(), Change::Items);
        assert_eq!(rx2.recv().unwrap(), Change::Feed);
    }

    #[test]
    fn subscriber_cleanup() {
        let feed = ChangeFeed::new();
        assert_eq!(feed.subscriber_count(), 0);

        let rx = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);

        drop(rx);

        // Emit cleans up the disconnected subscriber
        feed.emit(Change::Items);
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn threaded_subscribe() {
        let feed = Arc::new(ChangeFeed::new());
        let rx = feed.subscribe();

        let feed_clone = Arc::clone(&feed);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            feed_clone.emit(Change::Feed);
        });

        let received = rx.recv_timeout(Duration::from_millis(500)).unwrap();
        assert_eq!(received, Change::Feed);

        handle.join().unwrap();
    }
}
