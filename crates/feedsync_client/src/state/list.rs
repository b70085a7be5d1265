//! Paginated, query-ordered collections.

use super::LoadPhase;
use feedsync_core::{
    sorted_merge, PaginationData, PaginationResult, QueryConfiguration, Queryable, SortedVec,
};

/// How a fetched page is folded into a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// First load or refresh: the page replaces the list.
    Replace,
    /// Load more: the page is merged into the loaded window.
    Append,
}

/// A list of models kept sorted by the query that loaded it.
///
/// Invariants:
/// - `items` is sorted by `query` and free of duplicate ids
/// - `pagination` and `query` describe the last applied page
#[derive(Debug, Clone)]
pub struct PaginatedList<M: Queryable> {
    items: Vec<M>,
    pagination: PaginationData,
    query: QueryConfiguration<M>,
    phase: LoadPhase,
}

impl<M: Queryable> PaginatedList<M> {
    /// Creates an empty, unloaded list ordered by `query`.
    pub fn new(query: QueryConfiguration<M>) -> Self {
        Self {
            items: Vec::new(),
            pagination: PaginationData::default(),
            query,
            phase: LoadPhase::Uninitialized,
        }
    }

    /// Loaded items in order.
    pub fn items(&self) -> &[M] {
        &self.items
    }

    /// Cursors of the last page.
    pub fn pagination(&self) -> &PaginationData {
        &self.pagination
    }

    /// Query the list is ordered and filtered by.
    pub fn query(&self) -> &QueryConfiguration<M> {
        &self.query
    }

    /// Load phase.
    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// Returns true if another page can be loaded.
    pub fn has_next(&self) -> bool {
        self.pagination.has_next()
    }

    /// Cursor of the next page.
    pub fn next_cursor(&self) -> Option<&str> {
        self.pagination.next.as_deref()
    }

    /// Number of loaded items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the item with `id`.
    pub fn get(&self, id: &M::Id) -> Option<&M> {
        self.items.iter().find(|item| item.id() == *id)
    }

    /// Returns true if an item with `id` is loaded.
    pub fn contains(&self, id: &M::Id) -> bool {
        self.items.contains_id(id)
    }

    /// Marks a fetch as started. Returns the phase to restore on failure.
    pub fn begin_load(&mut self) -> LoadPhase {
        let previous = self.phase;
        if previous == LoadPhase::Uninitialized {
            self.phase = LoadPhase::Loading;
        }
        previous
    }

    /// Marks a fetch as failed, restoring the phase it started from.
    pub fn fail_load(&mut self, previous: LoadPhase) {
        self.phase = previous;
    }

    /// Applies a fetched page and records its query and cursors.
    pub fn apply_page(
        &mut self,
        page: PaginationResult<M>,
        query: QueryConfiguration<M>,
        mode: PageMode,
    ) {
        let existing = match mode {
            PageMode::Replace => Vec::new(),
            PageMode::Append => std::mem::take(&mut self.items),
        };
        self.items = sorted_merge(existing, page.models, query.comparator());
        self.pagination = page.pagination;
        self.query = query;
        self.phase = LoadPhase::Populated;
    }

    /// Inserts a new item at its sorted position if it passes the filter.
    ///
    /// A known id is replaced. Returns true if the list changed.
    pub fn insert(&mut self, item: M) -> bool {
        if !self.query.matches(&item) {
            return false;
        }
        let query = &self.query;
        self.items.sorted_insert(item, |a, b| query.compare(a, b));
        true
    }

    /// Inserts or replaces `item`, or drops it when it no longer passes the
    /// filter. Returns true if the list changed.
    pub fn upsert(&mut self, item: M) -> bool {
        if self.query.matches(&item) {
            let query = &self.query;
            self.items.sorted_insert(item, |a, b| query.compare(a, b));
            true
        } else {
            self.items.sorted_remove(&item.id()).is_some()
        }
    }

    /// Replaces a known item. Returns false if the id is not loaded.
    pub fn replace(&mut self, item: M) -> bool {
        let query = &self.query;
        self.items.sorted_replace(item, |a, b| query.compare(a, b))
    }

    /// Removes the item with `id`.
    pub fn remove(&mut self, id: &M::Id) -> Option<M> {
        self.items.sorted_remove(id)
    }

    /// Applies `f` to every item matching `pred` and restores the order.
    ///
    /// `f` reports whether it changed the item. Returns true if any did.
    pub fn update_where<P, F>(&mut self, pred: P, mut f: F) -> bool
    where
        P: Fn(&M) -> bool,
        F: FnMut(&mut M) -> bool,
    {
        let mut changed = false;
        for item in self.items.iter_mut().filter(|item| pred(item)) {
            changed |= f(item);
        }
        if changed {
            self.resort();
        }
        changed
    }

    /// Keeps only the items for which `keep` returns true.
    pub fn retain<F>(&mut self, keep: F) -> bool
    where
        F: FnMut(&M) -> bool,
    {
        let before = self.items.len();
        self.items.retain(keep);
        self.items.len() != before
    }

    /// Mutable access to the items. Call [`resort`](Self::resort) after
    /// changing sort keys.
    pub(crate) fn items_mut(&mut self) -> &mut Vec<M> {
        &mut self.items
    }

    /// Restores query order after in-place edits.
    pub(crate) fn resort(&mut self) {
        let query = &self.query;
        self.items.sort_by(|a, b| query.compare(a, b));
    }

    /// Drops every item and cursor.
    pub fn clear(&mut self) {
        self.items.clear();
        self.pagination = PaginationData::default();
    }
}

impl<M: Queryable> Default for PaginatedList<M> {
    fn default() -> Self {
        Self::new(QueryConfiguration::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedsync_core::{ActivityData, ActivityFilterField, ActivitySortField, Filter, Sort};
    use chrono::DateTime;

    fn activity(id: &str, secs: i64, kind: &str) -> ActivityData {
        ActivityData {
            id: id.into(),
            kind: kind.into(),
            created_at: DateTime::from_timestamp(secs, 0).unwrap(),
            ..Default::default()
        }
    }

    fn page(models: Vec<ActivityData>, next: Option<&str>) -> PaginationResult<ActivityData> {
        PaginationResult::new(models, PaginationData::new(next.map(Into::into), None))
    }

    fn ids(list: &PaginatedList<ActivityData>) -> Vec<&str> {
        list.items().iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn load_phase_transitions() {
        let mut list = PaginatedList::<ActivityData>::default();
        assert_eq!(list.phase(), LoadPhase::Uninitialized);

        let previous = list.begin_load();
        assert_eq!(list.phase(), LoadPhase::Loading);
        list.fail_load(previous);
        assert_eq!(list.phase(), LoadPhase::Uninitialized);

        list.begin_load();
        list.apply_page(page(vec![activity("a", 1, "post")], None), QueryConfiguration::default(), PageMode::Replace);
        assert_eq!(list.phase(), LoadPhase::Populated);

        let previous = list.begin_load();
        assert_eq!(list.phase(), LoadPhase::Populated);
        list.fail_load(previous);
        assert_eq!(list.phase(), LoadPhase::Populated);
        assert_eq!(ids(&list), vec!["a"]);
    }

    #[test]
    fn replace_then_append() {
        let mut list = PaginatedList::<ActivityData>::default();
        list.apply_page(
            page(vec![activity("b", 2, "post"), activity("c", 3, "post")], Some("n1")),
            QueryConfiguration::default(),
            PageMode::Replace,
        );
        assert_eq!(ids(&list), vec!["c", "b"]);
        assert_eq!(list.next_cursor(), Some("n1"));

        list.apply_page(
            page(vec![activity("a", 1, "post"), activity("b", 2, "post")], None),
            QueryConfiguration::default(),
            PageMode::Append,
        );
        assert_eq!(ids(&list), vec!["c", "b", "a"]);
        assert!(!list.has_next());

        list.apply_page(page(vec![activity("z", 9, "post")], None), QueryConfiguration::default(), PageMode::Replace);
        assert_eq!(ids(&list), vec!["z"]);
    }

    #[test]
    fn inserts_respect_filter_and_order() {
        let query = QueryConfiguration::new(
            Some(Filter::equal(ActivityFilterField::Kind, "post")),
            vec![Sort::ascending(ActivitySortField::CreatedAt)],
        );
        let mut list = PaginatedList::new(query);
        assert!(list.insert(activity("b", 2, "post")));
        assert!(list.insert(activity("a", 1, "post")));
        assert!(!list.insert(activity("x", 0, "story")));
        assert_eq!(ids(&list), vec!["a", "b"]);

        let mut moved = activity("a", 1, "story");
        moved.text = Some("now a story".into());
        assert!(list.upsert(moved));
        assert_eq!(ids(&list), vec!["b"]);
    }

    #[test]
    fn update_where_resorts() {
        let query = QueryConfiguration::new(None, vec![Sort::descending(ActivitySortField::Popularity)]);
        let mut list = PaginatedList::new(query);
        let mut a = activity("a", 1, "post");
        a.popularity = 10;
        let mut b = activity("b", 2, "post");
        b.popularity = 5;
        list.insert(a);
        list.insert(b);
        assert_eq!(ids(&list), vec!["a", "b"]);

        assert!(list.update_where(|item| item.id == "b", |item| {
            item.popularity = 50;
            true
        }));
        assert_eq!(ids(&list), vec!["b", "a"]);
        assert!(!list.update_where(|item| item.id == "missing", |_| true));
    }

    #[test]
    fn replace_ignores_unknown_ids() {
        let mut list = PaginatedList::<ActivityData>::default();
        assert!(!list.replace(activity("a", 1, "post")));
        assert!(list.is_empty());
        list.insert(activity("a", 1, "post"));
        assert!(list.replace(activity("a", 1, "story")));
        assert_eq!(list.get(&"a".to_string()).unwrap().kind, "story");
        assert!(list.remove(&"a".to_string()).is_some());
        assert!(list.remove(&"a".to_string()).is_none());
    }
}
