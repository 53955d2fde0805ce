//! Bookstore Domain Concerns

use thiserror::Error;

pub mod books;
pub mod carts;
pub mod orders;
pub mod pricing;
pub mod reviews;
pub mod stock;
pub mod users;

/// Default number of rows returned by list operations.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on rows returned by list operations.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Limit/offset window for list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    /// Build a page, clamping `limit` to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: offset.unwrap_or(0),
        }
    }

    pub(crate) fn limit_i64(self) -> i64 {
        i64::from(self.limit)
    }

    pub(crate) fn offset_i64(self) -> i64 {
        i64::from(self.offset)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// A stored or submitted enum discriminant that matches no known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
