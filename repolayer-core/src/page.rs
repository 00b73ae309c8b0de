//! Pagination parameters and paginated results.

use serde::{Deserialize, Serialize};

use crate::error::{RepositoryError, RepositoryResult};

/// Which slice of a result set to fetch. Pages are 1-indexed.
///
/// ```ignore
/// use repolayer_core::page::PageRequest;
///
/// let second = PageRequest::new(2, 50);
/// assert_eq!(second.offset(), 50);
///
/// let first = PageRequest::default(); // page 1, limit 10
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// The page number (1-indexed).
    pub page: u64,
    /// Maximum number of documents per page.
    pub limit: u64,
}

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> Self {
        Self { page, limit }
    }

    /// Number of matching documents to skip before this page starts.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.limit
    }

    /// Both `page` and `limit` must be at least 1.
    pub fn validate(&self) -> RepositoryResult<()> {
        if self.page == 0 || self.limit == 0 {
            return Err(RepositoryError::Validation(format!(
                "pagination requires page >= 1 and limit >= 1, got page={} limit={}",
                self.page, self.limit
            )));
        }
        Ok(())
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

/// One page of matches plus the size of the full matching set.
///
/// `total` always counts every document the filter matched, independent of the
/// pagination bounds, so callers can derive page counts from a single response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The documents on this page, at most `limit` of them.
    pub data: Vec<T>,
    /// Count of all matches ignoring pagination.
    pub total: u64,
    /// The page number that was fetched.
    pub page: u64,
    /// The limit that was applied.
    pub limit: u64,
}

impl<T> Page<T> {
    /// An empty page for the given request (zero matches).
    pub fn empty(request: &PageRequest) -> Self {
        Self {
            data: Vec::new(),
            total: 0,
            page: request.page,
            limit: request.limit,
        }
    }

    /// True when no later page would contain any documents.
    pub fn is_last(&self) -> bool {
        self.page * self.limit >= self.total
    }
}
