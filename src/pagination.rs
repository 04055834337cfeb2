//! Offset pagination for listing queries.
//!
//! ```rust
//! use crudql::Page;
//!
//! // Page 3 with 25 items per page (1-indexed)
//! let page = Page::page(3, 25);
//! assert_eq!(page.skip, Some(50));
//! assert_eq!(page.take, Some(25));
//! assert_eq!(page.to_sql(), "LIMIT 25 OFFSET 50");
//!
//! // First N records
//! assert_eq!(Page::first(10).to_sql(), "LIMIT 10");
//! ```

use std::fmt::Write;

/// Skip/take pair for a paginated listing query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    /// Number of records to skip.
    pub skip: Option<u64>,
    /// Maximum number of records to take.
    pub take: Option<u64>,
}

impl Page {
    /// Create a page with no limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of records to skip.
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Set the maximum number of records to take.
    pub fn take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }

    /// Get pagination for the first N records.
    pub fn first(n: u64) -> Self {
        Self::new().take(n)
    }

    /// Get pagination for a page (1-indexed).
    ///
    /// The offset saturates instead of overflowing; `page` comes straight
    /// off the query string and may be any `u64`.
    pub fn page(page: u64, per_page: u64) -> Self {
        let skip = page.saturating_sub(1).saturating_mul(per_page);
        Self::new().skip(skip).take(per_page)
    }

    /// Check if pagination is specified.
    pub fn is_empty(&self) -> bool {
        self.skip.is_none() && self.take.is_none()
    }

    /// Generate the SQL LIMIT/OFFSET clause.
    pub fn to_sql(&self) -> String {
        let mut sql = String::with_capacity(32);
        self.write_sql(&mut sql);
        sql
    }

    /// Write the SQL LIMIT/OFFSET clause directly to a buffer.
    #[inline]
    pub fn write_sql(&self, buffer: &mut String) {
        if let Some(take) = self.take {
            let _ = write!(buffer, "LIMIT {}", take);
        }
        if let Some(skip) = self.skip {
            if self.take.is_some() {
                buffer.push(' ');
            }
            let _ = write!(buffer, "OFFSET {}", skip);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_skip_take() {
        let page = Page::new().skip(10).take(20);
        assert_eq!(page.to_sql(), "LIMIT 20 OFFSET 10");
    }

    #[test]
    fn test_first_page_skips_nothing() {
        let page = Page::page(1, 100);
        assert_eq!(page.skip, Some(0));
        assert_eq!(page.take, Some(100));
    }

    #[test]
    fn test_page_is_one_indexed() {
        let page = Page::page(3, 10);
        assert_eq!(page.skip, Some(20));
        assert_eq!(page.take, Some(10));
    }

    #[test]
    fn test_huge_page_number_saturates() {
        let page = Page::page(u64::MAX, 100);
        assert_eq!(page.skip, Some(u64::MAX));
        assert_eq!(page.take, Some(100));
    }

    #[test]
    fn test_empty() {
        assert!(Page::new().is_empty());
        assert!(!Page::first(10).is_empty());
        assert_eq!(Page::new().to_sql(), "");
    }
}
