//! Pagination helper types for repository queries

use serde::{Deserialize, Serialize};

use crate::error::{LibraryError, Result};

/// Pagination request parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub page_size: u32,
}

impl PageRequest {
    /// Create a new page request
    ///
    /// # Errors
    ///
    /// `page` and `page_size` must both be at least 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_library::repositories::PageRequest;
    ///
    /// let request = PageRequest::new(3, 20).unwrap();
    /// assert_eq!(request.offset(), 40);
    /// assert!(PageRequest::new(0, 20).is_err());
    /// ```
    pub fn new(page: u32, page_size: u32) -> Result<Self> {
        if page == 0 {
            return Err(LibraryError::invalid("page", "must be at least 1"));
        }
        if page_size == 0 {
            return Err(LibraryError::invalid("limit", "must be at least 1"));
        }
        Ok(Self { page, page_size })
    }

    /// Calculate the SQL OFFSET value: `(page - 1) * page_size`
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// Get the LIMIT value (same as page_size)
    pub fn limit(&self) -> u32 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
        }
    }
}

/// Paginated response containing items and metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
        }
    }

    /// More items exist past this page: `offset + items.len() < total`.
    pub fn has_more(&self) -> bool {
        let offset = u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size);
        offset + (self.items.len() as u64) < self.total
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            0
        } else {
            self.total.div_ceil(u64::from(self.page_size))
        }
    }

    /// Map the items to a different type
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}
