//! Pagination cursors.

use serde::{Deserialize, Serialize};

/// Cursors returned with a page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaginationData {
    /// Cursor for the next (older) page.
    pub next: Option<String>,
    /// Cursor for the previous (newer) page.
    pub previous: Option<String>,
}

impl PaginationData {
    /// Creates pagination data.
    pub fn new(next: Option<String>, previous: Option<String>) -> Self {
        Self { next, previous }
    }

    /// Returns true if another page can be requested.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// One page of models plus its cursors.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationResult<T> {
    /// Models in server order.
    pub models: Vec<T>,
    /// Cursors.
    pub pagination: PaginationData,
}

impl<T> PaginationResult<T> {
    /// Creates a page.
    pub fn new(models: Vec<T>, pagination: PaginationData) -> Self {
        Self { models, pagination }
    }

    /// Maps the models, keeping the cursors.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginationResult<U> {
        PaginationResult {
            models: self.models.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
