//! Pagination types for repository queries.

use serde::{Deserialize, Serialize};

/// One page of results plus the authoritative total count.
///
/// `items` preserves server order. `total` is the server-reported count
/// across all pages and is what `has_more` is computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageOf<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> PageOf<T> {
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Map the items to a different type, keeping the total.
    pub fn map<U, F>(self, f: F) -> PageOf<U>
    where
        F: FnMut(T) -> U,
    {
        PageOf {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}
