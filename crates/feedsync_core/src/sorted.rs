//! Sorted-merge primitives.
//!
//! Every local collection in feedsync is a `Vec` kept in comparator order and
//! free of duplicate ids. The operations here are the only way state
//! containers touch those vectors:
//!
//! - [`SortedVec::sorted_insert`]: upsert at the comparator position
//! - [`SortedVec::sorted_remove`]: remove by id, no-op when absent
//! - [`SortedVec::sorted_replace`]: upsert only when the id is already known
//! - [`sorted_merge`]: union of a loaded window and a new page
//!
//! The unsorted helpers [`SortedVec::insert_by_id`] and
//! [`SortedVec::replace_by_id`] back the append-only "own" indices on entity
//! models (own reactions, own bookmarks, own votes).
//!
//! # Invariants
//!
//! - The vector is sorted by the comparator after every sorted operation
//! - No two items share an id
//! - Items comparing equal keep their relative order (first seen wins)

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

/// An item with a stable identity used for deduplication.
///
/// Some entities are not globally unique on their own (reactions, bookmarks)
/// and return a composite key here.
pub trait Identifiable {
    /// Identity type.
    type Id: Clone + Eq + Hash + Ord + fmt::Debug;

    /// Returns the identity of this item.
    fn id(&self) -> Self::Id;
}

/// Order-preserving, id-deduplicated operations on a vector.
pub trait SortedVec<T: Identifiable> {
    /// Inserts `item` at its comparator position.
    ///
    /// If an item with the same id exists it is replaced: in place when its
    /// sort key is unchanged, otherwise it is moved. Returns the replaced item.
    fn sorted_insert<C>(&mut self, item: T, cmp: C) -> Option<T>
    where
        C: Fn(&T, &T) -> Ordering;

    /// Removes the item with the given id. No-op if absent.
    fn sorted_remove(&mut self, id: &T::Id) -> Option<T>;

    /// Replaces the item with the same id, keeping the vector sorted.
    ///
    /// Unlike [`sorted_insert`](Self::sorted_insert) this never inserts:
    /// returns `false` and leaves the vector untouched if the id is unknown.
    fn sorted_replace<C>(&mut self, item: T, cmp: C) -> bool
    where
        C: Fn(&T, &T) -> Ordering;

    /// Appends `item` unless its id is present, in which case the existing
    /// entry is replaced in place. Returns `true` if the item was new.
    fn insert_by_id(&mut self, item: T) -> bool;

    /// Replaces the entry with the same id in place. Returns `false` if absent.
    fn replace_by_id(&mut self, item: T) -> bool;

    /// Applies `f` to the entry with the given id. Returns `false` if absent.
    ///
    /// Callers that change sort keys must re-sort; use
    /// [`sorted_replace`](Self::sorted_replace) instead when the order matters.
    fn update_by_id<F>(&mut self, id: &T::Id, f: F) -> bool
    where
        F: FnOnce(&mut T);

    /// Returns the position of the item with the given id.
    fn position_of(&self, id: &T::Id) -> Option<usize>;

    /// Returns true if an item with the given id is present.
    fn contains_id(&self, id: &T::Id) -> bool {
        self.position_of(id).is_some()
    }
}

/// Index at which `item` must be inserted to keep `items` sorted.
///
/// Items comparing equal to `item` stay in front of it.
fn insertion_index<T, C>(items: &[T], item: &T, cmp: &C) -> usize
where
    C: Fn(&T, &T) -> Ordering,
{
    items.partition_point(|existing| cmp(existing, item) != Ordering::Greater)
}

impl<T: Identifiable> SortedVec<T> for Vec<T> {
    fn sorted_insert<C>(&mut self, item: T, cmp: C) -> Option<T>
    where
        C: Fn(&T, &T) -> Ordering,
    {
        let id = item.id();
        if let Some(index) = self.position_of(&id) {
            if cmp(&self[index], &item) == Ordering::Equal {
                return Some(std::mem::replace(&mut self[index], item));
            }
            let previous = self.remove(index);
            let at = insertion_index(self, &item, &cmp);
            self.insert(at, item);
            return Some(previous);
        }

        let at = insertion_index(self, &item, &cmp);
        self.insert(at, item);
        None
    }

    fn sorted_remove(&mut self, id: &T::Id) -> Option<T> {
        self.position_of(id).map(|index| self.remove(index))
    }

    fn sorted_replace<C>(&mut self, item: T, cmp: C) -> bool
    where
        C: Fn(&T, &T) -> Ordering,
    {
        if !self.contains_id(&item.id()) {
            return false;
        }
        self.sorted_insert(item, cmp);
        true
    }

    fn insert_by_id(&mut self, item: T) -> bool {
        match self.position_of(&item.id()) {
            Some(index) => {
                self[index] = item;
                false
            }
            None => {
                self.push(item);
                true
            }
        }
    }

    fn replace_by_id(&mut self, item: T) -> bool {
        match self.position_of(&item.id()) {
            Some(index) => {
                self[index] = item;
                true
            }
            None => false,
        }
    }

    fn update_by_id<F>(&mut self, id: &T::Id, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        match self.iter_mut().find(|existing| existing.id() == *id) {
            Some(existing) => {
                f(existing);
                true
            }
            None => false,
        }
    }

    fn position_of(&self, id: &T::Id) -> Option<usize> {
        self.iter().position(|existing| existing.id() == *id)
    }
}

/// Merges a freshly fetched page into an already loaded window.
///
/// The result is the union of both inputs, deduplicated by id and sorted by
/// `cmp`. When an id appears in both, the incoming copy (fresher data) is
/// kept. The sort is stable and `existing` items are laid down first, so
/// items that compare equal keep the position they already had on screen.
pub fn sorted_merge<T, C>(existing: Vec<T>, incoming: Vec<T>, cmp: C) -> Vec<T>
where
    T: Identifiable,
    C: Fn(&T, &T) -> Ordering,
{
    let mut fresh: HashMap<T::Id, T> = HashMap::with_capacity(incoming.len());
    let mut fresh_order = Vec::with_capacity(incoming.len());
    for item in incoming {
        let id = item.id();
        if fresh.insert(id.clone(), item).is_none() {
            fresh_order.push(id);
        }
    }

    let mut seen = HashSet::with_capacity(existing.len() + fresh.len());
    let mut merged = Vec::with_capacity(existing.len() + fresh.len());
    for item in existing {
        let id = item.id();
        if !seen.insert(id.clone()) {
            continue;
        }
        match fresh.remove(&id) {
            Some(newer) => merged.push(newer),
            None => merged.push(item),
        }
    }
    for id in fresh_order {
        if let Some(item) = fresh.remove(&id) {
            if seen.insert(id) {
                merged.push(item);
            }
        }
    }

    merged.sort_by(|a, b| cmp(a, b));
    merged
}
