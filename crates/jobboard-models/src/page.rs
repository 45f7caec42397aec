//! Canonical pagination type.

use serde::{Deserialize, Serialize};

/// One page of a server collection. Page indices are zero-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// A page holding every element of a non-paginated response.
    pub fn single(items: Vec<T>) -> Self {
        let len = items.len();
        Self {
            items,
            page: 0,
            size: len as u32,
            total_elements: len as u64,
            total_pages: if len == 0 { 0 } else { 1 },
        }
    }

    pub fn empty() -> Self {
        Self::single(Vec::new())
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}
