//! Cache of the current user's capabilities per feed.
//!
//! The cache is process-wide and shared by every facade. It is written
//! through by feed loads and batch capability fetches; entries whose value
//! changed are returned by [`CapabilityCache::save`] so the caller can
//! announce them to live state containers.

use feedsync_core::{FeedId, FeedOwnCapability};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Capabilities keyed by feed.
pub type CapabilityMap = BTreeMap<FeedId, BTreeSet<FeedOwnCapability>>;

/// Thread-safe capability cache.
#[derive(Debug, Default)]
pub struct CapabilityCache {
    entries: Mutex<HashMap<FeedId, BTreeSet<FeedOwnCapability>>>,
}

impl CapabilityCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the capabilities of one feed, if cached.
    pub fn get(&self, fid: &FeedId) -> Option<BTreeSet<FeedOwnCapability>> {
        self.entries.lock().get(fid).cloned()
    }

    /// Returns the capabilities of every feed in `fids`.
    ///
    /// All-or-nothing: `None` unless every requested feed is cached, so the
    /// caller issues a single batch fetch for the whole set.
    pub fn capabilities<'a>(
        &self,
        fids: impl IntoIterator<Item = &'a FeedId>,
    ) -> Option<CapabilityMap> {
        let entries = self.entries.lock();
        fids.into_iter()
            .map(|fid| entries.get(fid).map(|set| (fid.clone(), set.clone())))
            .collect()
    }

    /// Returns the feeds of `fids` with no cached entry.
    pub fn missing<'a>(&self, fids: impl IntoIterator<Item = &'a FeedId>) -> BTreeSet<FeedId> {
        let entries = self.entries.lock();
        fids.into_iter()
            .filter(|fid| !entries.contains_key(*fid))
            .cloned()
            .collect()
    }

    /// Merges `incoming` into the cache.
    ///
    /// Returns the entries that replaced a different cached value. First
    /// writes and unchanged values are not reported.
    pub fn save(&self, incoming: CapabilityMap) -> CapabilityMap {
        let mut entries = self.entries.lock();
        let mut changed = CapabilityMap::new();
        for (fid, capabilities) in incoming {
            match entries.insert(fid.clone(), capabilities.clone()) {
                Some(previous) if previous != capabilities => {
                    changed.insert(fid, capabilities);
                }
                _ => {}
            }
        }
        if !changed.is_empty() {
            debug!(feeds = changed.len(), "capabilities changed");
        }
        changed
    }

    /// Number of cached feeds.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(caps: &[FeedOwnCapability]) -> BTreeSet<FeedOwnCapability> {
        caps.iter().cloned().collect()
    }

    #[test]
    fn lookup_is_all_or_nothing() {
        let cache = CapabilityCache::new();
        let a = FeedId::new("user", "a");
        let b = FeedId::new("user", "b");
        cache.save(CapabilityMap::from([(a.clone(), set(&[FeedOwnCapability::Follow]))]));

        assert!(cache.capabilities([&a]).is_some());
        assert!(cache.capabilities([&a, &b]).is_none());
        assert_eq!(cache.missing([&a, &b]), BTreeSet::from([b]));
    }

    #[test]
    fn save_reports_only_changed_entries() {
        let cache = CapabilityCache::new();
        let a = FeedId::new("user", "a");
        let b = FeedId::new("user", "b");

        let first = cache.save(CapabilityMap::from([
            (a.clone(), set(&[FeedOwnCapability::Follow])),
            (b.clone(), set(&[FeedOwnCapability::ReadFeed])),
        ]));
        assert!(first.is_empty());

        let second = cache.save(CapabilityMap::from([
            (a.clone(), set(&[FeedOwnCapability::Unfollow])),
            (b.clone(), set(&[FeedOwnCapability::ReadFeed])),
        ]));
        assert_eq!(second.len(), 1);
        assert_eq!(second[&a], set(&[FeedOwnCapability::Unfollow]));
        assert_eq!(cache.get(&a), Some(set(&[FeedOwnCapability::Unfollow])));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn empty_request_is_satisfied() {
        let cache = CapabilityCache::new();
        assert_eq!(cache.capabilities(std::iter::empty()), Some(CapabilityMap::new()));
        assert!(cache.is_empty());
    }
}
