//! Page request and pagination envelope primitives.
//!
//! Listing endpoints accept a one-based `page` and a `limit`, translate them
//! into an offset window, and answer with a [`Page`] envelope that reports the
//! total number of matching items and whether another page exists.
//!
//! ```
//! use pagination::{Page, PageRequest};
//!
//! let request = PageRequest::from_query(Some(2), Some(5)).expect("valid request");
//! assert_eq!(request.skip(), 5);
//!
//! let page = Page::new(vec!["a", "b"], request, 7);
//! assert!(!page.has_more());
//! ```

use serde::Serialize;

/// Page size used when a request omits `limit`.
pub const DEFAULT_LIMIT: u32 = 10;
/// Largest page size a request may ask for; larger values are clamped.
pub const MAX_LIMIT: u32 = 50;

/// Validation failures raised while building a [`PageRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PageRequestError {
    /// Pages are numbered from one.
    #[error("page must be at least 1")]
    ZeroPage,
    /// A page must hold at least one item.
    #[error("limit must be at least 1")]
    ZeroLimit,
}

/// A validated, one-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Build a request, clamping `limit` to [`MAX_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError`] when `page` or `limit` is zero.
    pub fn new(page: u32, limit: u32) -> Result<Self, PageRequestError> {
        if page == 0 {
            return Err(PageRequestError::ZeroPage);
        }
        if limit == 0 {
            return Err(PageRequestError::ZeroLimit);
        }
        Ok(Self {
            page,
            limit: limit.min(MAX_LIMIT),
        })
    }

    /// Build a request from optional query parameters, applying defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError`] when an explicit zero is supplied.
    pub fn from_query(page: Option<u32>, limit: Option<u32>) -> Result<Self, PageRequestError> {
        Self::new(page.unwrap_or(1), limit.unwrap_or(DEFAULT_LIMIT))
    }

    /// The first page with the default limit.
    #[must_use]
    pub const fn first() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Maximum number of items on this page.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of items preceding this page.
    #[must_use]
    pub const fn skip(&self) -> u64 {
        (self.page as u64).saturating_sub(1) * self.limit as u64
    }

    /// Copy the items of this window out of an already ordered slice.
    #[must_use]
    pub fn window<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let skip = usize::try_from(self.skip()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        items.iter().skip(skip).take(limit).cloned().collect()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// One page of results together with the totals needed for navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    items: Vec<T>,
    page: u32,
    limit: u32,
    total: u64,
    has_more: bool,
}

impl<T> Page<T> {
    /// Wrap `items` fetched for `request` out of `total` matches.
    ///
    /// `has_more` is true when `skip + items.len() < total`.
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        let returned = u64::try_from(items.len()).unwrap_or(u64::MAX);
        let has_more = request.skip().saturating_add(returned) < total;
        Self {
            items,
            page: request.page(),
            limit: request.limit(),
            total,
            has_more,
        }
    }

    /// Items on this page.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Consume the page and return its items.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Page size that was requested.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Total number of matching items across all pages.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Whether another page follows this one.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// Transform every item while keeping the navigation totals.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            has_more: self.has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit coverage for page windows and envelopes.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, 1, DEFAULT_LIMIT)]
    #[case(Some(3), Some(20), 3, 20)]
    #[case(Some(1), Some(500), 1, MAX_LIMIT)]
    fn from_query_applies_defaults_and_clamps(
        #[case] page: Option<u32>,
        #[case] limit: Option<u32>,
        #[case] expected_page: u32,
        #[case] expected_limit: u32,
    ) {
        let request = PageRequest::from_query(page, limit).expect("valid request");
        assert_eq!(request.page(), expected_page);
        assert_eq!(request.limit(), expected_limit);
    }

    #[rstest]
    #[case(0, 10, PageRequestError::ZeroPage)]
    #[case(1, 0, PageRequestError::ZeroLimit)]
    fn new_rejects_zero_values(
        #[case] page: u32,
        #[case] limit: u32,
        #[case] expected: PageRequestError,
    ) {
        assert_eq!(PageRequest::new(page, limit), Err(expected));
    }

    #[rstest]
    fn skip_is_offset_of_the_window() {
        let request = PageRequest::new(4, 25).expect("valid request");
        assert_eq!(request.skip(), 75);
    }

    #[rstest]
    fn window_slices_the_requested_page() {
        let items: Vec<u32> = (1..=12).collect();
        let request = PageRequest::new(2, 5).expect("valid request");
        assert_eq!(request.window(&items), vec![6, 7, 8, 9, 10]);

        let last = PageRequest::new(3, 5).expect("valid request");
        assert_eq!(last.window(&items), vec![11, 12]);
    }

    #[rstest]
    #[case(1, 5, 5, 12, true)]
    #[case(3, 5, 2, 12, false)]
    #[case(1, 10, 0, 0, false)]
    fn has_more_compares_window_end_with_total(
        #[case] page: u32,
        #[case] limit: u32,
        #[case] returned: usize,
        #[case] total: u64,
        #[case] expected: bool,
    ) {
        let request = PageRequest::new(page, limit).expect("valid request");
        let envelope = Page::new(vec![(); returned], request, total);
        assert_eq!(envelope.has_more(), expected);
    }

    #[rstest]
    fn page_serialises_in_camel_case() {
        let request = PageRequest::new(1, 2).expect("valid request");
        let envelope = Page::new(vec![1, 2], request, 3).map(|n| n * 10);
        let value = serde_json::to_value(&envelope).expect("serialise page");
        assert_eq!(value["items"], serde_json::json!([10, 20]));
        assert_eq!(value["hasMore"], serde_json::json!(true));
        assert_eq!(value["total"], serde_json::json!(3));
    }
}
