//! Sort descriptors.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Direction of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    #[default]
    Descending,
}

impl SortDirection {
    /// Wire representation (`1` ascending, `-1` descending).
    pub fn as_i32(&self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }

    /// Parses the wire representation.
    pub fn from_i32(value: i32) -> Self {
        if value < 0 {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }

    /// Orients an ascending comparison result.
    #[inline]
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// A field a model collection can be sorted by.
pub trait SortField: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Model the field belongs to.
    type Model;

    /// Name of the field in backend requests.
    fn remote_name(&self) -> &'static str;

    /// Compares two models by this field, ascending.
    fn compare(&self, lhs: &Self::Model, rhs: &Self::Model) -> Ordering;
}

/// A field plus a direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort<F> {
    /// Field to sort by.
    pub field: F,
    /// Direction.
    pub direction: SortDirection,
}

impl<F: SortField> Sort<F> {
    /// Creates a sort.
    pub fn new(field: F, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Ascending sort on `field`.
    pub fn ascending(field: F) -> Self {
        Self::new(field, SortDirection::Ascending)
    }

    /// Descending sort on `field`.
    pub fn descending(field: F) -> Self {
        Self::new(field, SortDirection::Descending)
    }

    /// Compares two models according to this sort.
    #[inline]
    pub fn compare(&self, lhs: &F::Model, rhs: &F::Model) -> Ordering {
        self.direction.apply(self.field.compare(lhs, rhs))
    }
}

/// Compares by each sort in turn, falling through on ties.
pub fn compare_chain<F: SortField>(sorts: &[Sort<F>], lhs: &F::Model, rhs: &F::Model) -> Ordering {
    sorts
        .iter()
        .map(|sort| sort.compare(lhs, rhs))
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Field {
        A,
        B,
    }

    impl SortField for Field {
        type Model = (i32, i32);

        fn remote_name(&self) -> &'static str {
            match self {
                Field::A => "a",
                Field::B => "b",
            }
        }

        fn compare(&self, lhs: &(i32, i32), rhs: &(i32, i32)) -> Ordering {
            match self {
                Field::A => lhs.0.cmp(&rhs.0),
                Field::B => lhs.1.cmp(&rhs.1),
            }
        }
    }

    #[test]
    fn direction_wire_form() {
        assert_eq!(SortDirection::Ascending.as_i32(), 1);
        assert_eq!(SortDirection::Descending.as_i32(), -1);
        assert_eq!(SortDirection::from_i32(-1), SortDirection::Descending);
        assert_eq!(SortDirection::from_i32(1), SortDirection::Ascending);
    }

    #[test]
    fn chain_falls_through_ties() {
        let sorts = vec![Sort::descending(Field::A), Sort::ascending(Field::B)];
        assert_eq!(compare_chain(&sorts, &(2, 9), &(1, 0)), Ordering::Less);
        assert_eq!(compare_chain(&sorts, &(1, 1), &(1, 2)), Ordering::Less);
        assert_eq!(compare_chain(&sorts, &(1, 2), &(1, 2)), Ordering::Equal);
        assert_eq!(Sort::descending(Field::B).field.remote_name(), "b");
    }
}
