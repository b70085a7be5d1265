//! Bounded records of ids already applied to a counter.

use std::collections::VecDeque;

/// Ids kept by a [`CountedIds`] before the oldest are dropped.
pub const COUNTED_IDS_CAPACITY: usize = 128;

/// Ids whose effect on a counter was already applied, oldest dropped first.
///
/// This is bookkeeping attached to a model, not part of its value: it is
/// never serialized and always compares equal.
#[derive(Debug, Clone, Default)]
pub struct CountedIds {
    ids: VecDeque<String>,
}

impl CountedIds {
    /// Records `id`. Returns `false` if it was already recorded.
    pub fn record(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push_back(id.to_string());
        if self.ids.len() > COUNTED_IDS_CAPACITY {
            self.ids.pop_front();
        }
        true
    }

    /// Returns true if `id` is recorded.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|known| known == id)
    }

    /// Number of recorded ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl PartialEq for CountedIds {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

/// Comment ids that already moved an activity's `comment_count`.
///
/// Local results bypass the router's redelivery window, so a REST result and
/// its real-time echo both reach the activity. Replies to unloaded parents
/// and deletes of unloaded comments leave no trace in the comment sample;
/// the ledger is what keeps the second application from counting again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentLedger {
    /// Comments counted as added.
    pub added: CountedIds,
    /// Comments counted as removed.
    pub removed: CountedIds,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_each_id_once() {
        let mut ids = CountedIds::default();
        assert!(ids.record("c1"));
        assert!(!ids.record("c1"));
        assert!(ids.record("c2"));
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn oldest_ids_are_dropped_at_capacity() {
        let mut ids = CountedIds::default();
        for n in 0..=COUNTED_IDS_CAPACITY {
            ids.record(&format!("c{n}"));
        }
        assert_eq!(ids.len(), COUNTED_IDS_CAPACITY);
        assert!(!ids.contains("c0"));
        assert!(ids.contains(&format!("c{COUNTED_IDS_CAPACITY}")));
    }

    #[test]
    fn ledgers_never_affect_equality() {
        let mut recorded = CommentLedger::default();
        recorded.added.record("c1");
        assert_eq!(recorded, CommentLedger::default());
    }
}
