//! Query configuration.
//!
//! A [`QueryConfiguration`] remembers the filter and sort used for the last
//! full or paginated fetch of a collection. Later real-time inserts and
//! "load more" pages reuse the same order, so a list sorted by popularity
//! stays sorted by popularity as new items stream in.

mod filter;
mod sort;

pub use filter::{Filter, FilterField, FilterValue};
pub use sort::{compare_chain, Sort, SortDirection, SortField};

use crate::sorted::Identifiable;
use std::cmp::Ordering;
use std::fmt;

/// A model that lives in a queried, sorted collection.
pub trait Queryable: Identifiable + Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Fields the collection can be sorted by.
    type SortField: SortField<Model = Self>;
    /// Fields the collection can be filtered by.
    type FilterField: FilterField<Model = Self>;

    /// Sort applied when no query has run yet and the caller gave none.
    fn default_sort() -> Vec<Sort<Self::SortField>>;
}

/// The (filter, sort) pair captured when a collection was last queried.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfiguration<M: Queryable> {
    /// Filter sent with the query, if any.
    pub filter: Option<Filter<M::FilterField>>,
    /// Sort sent with the query. Empty means the model's default sort.
    pub sort: Vec<Sort<M::SortField>>,
}

impl<M: Queryable> QueryConfiguration<M> {
    /// Creates a configuration.
    pub fn new(filter: Option<Filter<M::FilterField>>, sort: Vec<Sort<M::SortField>>) -> Self {
        Self { filter, sort }
    }

    /// A configuration with no filter and the model's default sort.
    pub fn default_for_model() -> Self {
        Self::new(None, M::default_sort())
    }

    /// Returns the sort in effect: the explicit one, or the model default.
    pub fn effective_sort(&self) -> Vec<Sort<M::SortField>> {
        if self.sort.is_empty() {
            M::default_sort()
        } else {
            self.sort.clone()
        }
    }

    /// Total order over models: the sort chain, then id as tie-breaker so
    /// repeated merges stay deterministic.
    pub fn compare(&self, lhs: &M, rhs: &M) -> Ordering {
        let ordering = if self.sort.is_empty() {
            compare_chain(&M::default_sort(), lhs, rhs)
        } else {
            compare_chain(&self.sort, lhs, rhs)
        };
        ordering.then_with(|| lhs.id().cmp(&rhs.id()))
    }

    /// Returns a comparator closure borrowing this configuration.
    pub fn comparator(&self) -> impl Fn(&M, &M) -> Ordering + '_ {
        move |lhs: &M, rhs: &M| self.compare(lhs, rhs)
    }

    /// Returns true if the model passes the filter (or there is none).
    pub fn matches(&self, model: &M) -> bool {
        self.filter
            .as_ref()
            .map_or(true, |filter| filter.matches(model))
    }
}

impl<M: Queryable> Default for QueryConfiguration<M> {
    fn default() -> Self {
        Self::default_for_model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityData, ActivityFilterField, ActivitySortField};
    use chrono::DateTime;

    fn activity(id: &str, millis: i64, popularity: i32) -> ActivityData {
        ActivityData {
            id: id.to_string(),
            created_at: DateTime::from_timestamp_millis(millis).unwrap(),
            popularity,
            ..Default::default()
        }
    }

    #[test]
    fn default_sort_is_newest_first() {
        let config = QueryConfiguration::<ActivityData>::default();
        let older = activity("a", 1_000, 0);
        let newer = activity("b", 2_000, 0);
        assert_eq!(config.compare(&newer, &older), Ordering::Less);
    }

    #[test]
    fn ties_break_by_id() {
        let config = QueryConfiguration::<ActivityData>::new(None, vec![]);
        let a = activity("a", 1_000, 0);
        let b = activity("b", 1_000, 0);
        assert_eq!(config.compare(&a, &b), Ordering::Less);
        assert_eq!(config.compare(&b, &a), Ordering::Greater);
        assert_eq!(config.compare(&a, &a), Ordering::Equal);
    }

    #[test]
    fn explicit_sort_wins_over_default() {
        let config = QueryConfiguration::<ActivityData>::new(
            None,
            vec![Sort::descending(ActivitySortField::Popularity)],
        );
        let popular_old = activity("a", 1_000, 50);
        let quiet_new = activity("b", 9_000, 1);
        assert_eq!(config.compare(&popular_old, &quiet_new), Ordering::Less);
        assert_eq!(config.effective_sort().len(), 1);
    }

    #[test]
    fn filter_matching() {
        let config = QueryConfiguration::<ActivityData>::new(
            Some(Filter::equal(ActivityFilterField::Kind, "poll")),
            vec![],
        );
        let mut post = activity("a", 1, 0);
        post.kind = "post".into();
        let mut poll = activity("b", 1, 0);
        poll.kind = "poll".into();
        assert!(!config.matches(&post));
        assert!(config.matches(&poll));
        assert!(QueryConfiguration::<ActivityData>::default().matches(&post));
    }
}
