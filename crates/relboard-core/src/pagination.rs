//! Module: pagination
//! Responsibility: per-page window, filter and sort state for the read path.
//! Does not own: issuing requests or caching their results.
//! Boundary: turns view state into the range, filters and sorts of a `SelectRequest`.

use crate::{
    page::Page,
    query::{Conjunction, FilterSet, QueryExpression, RowRange, SelectRequest, Sort},
};
use std::ops::RangeInclusive;

///
/// PageView
///
/// Pagination state of one page. Page numbers are 1-based and the window
/// size is fixed by the display mode.
///
/// The total row count is only refreshed when filters or sorts change;
/// moving between pages reuses the last known count.
///

#[derive(Clone, Debug, PartialEq)]
pub struct PageView {
    window: u64,
    page_number: u64,
    filters: FilterSet,
    sorts: Vec<Sort>,
    total_count: u64,
}

impl PageView {
    #[must_use]
    pub const fn new(window: u64) -> Self {
        Self {
            window: if window == 0 { 1 } else { window },
            page_number: 1,
            filters: FilterSet::new(Conjunction::And, Vec::new()),
            sorts: Vec::new(),
            total_count: 0,
        }
    }

    #[must_use]
    pub const fn for_page(page: &Page) -> Self {
        Self::new(page.window_size())
    }

    #[must_use]
    pub const fn window_size(&self) -> u64 {
        self.window
    }

    #[must_use]
    pub const fn page_number(&self) -> u64 {
        self.page_number
    }

    #[must_use]
    pub const fn total_count(&self) -> u64 {
        self.total_count
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterSet {
        &self.filters
    }

    #[must_use]
    pub fn sorts(&self) -> &[Sort] {
        &self.sorts
    }

    /// Row window of the current page.
    #[must_use]
    pub const fn range(&self) -> RowRange {
        RowRange::window(self.page_number, self.window)
    }

    /// Move to page `number`; `0` is treated as the first page.
    pub const fn set_page(&mut self, number: u64) -> RowRange {
        self.page_number = if number == 0 { 1 } else { number };
        self.range()
    }

    /// Replace filters and sorts and return to the first page.
    pub fn set_filters(&mut self, filters: FilterSet, sorts: Vec<Sort>) -> RowRange {
        self.filters = filters;
        self.sorts = sorts;
        self.set_page(1)
    }

    pub const fn record_count(&mut self, count: u64) {
        self.total_count = count;
    }

    /// Number of pages, never less than one.
    #[must_use]
    pub const fn max_pagination(&self) -> u64 {
        let pages = self.total_count.div_ceil(self.window);
        if pages == 0 { 1 } else { pages }
    }

    /// Every selectable page number.
    #[must_use]
    pub const fn pagination_list(&self) -> RangeInclusive<u64> {
        1..=self.max_pagination()
    }

    /// Read request for the current window.
    ///
    /// `count` asks the backend for an exact total; pass it only when the
    /// filters changed.
    #[must_use]
    pub fn request(&self, table: &str, select: QueryExpression, count: bool) -> SelectRequest {
        let request = SelectRequest::new(table, select)
            .filter(self.filters.clone())
            .order_by(self.sorts.clone())
            .range(self.range());

        if count { request.with_count() } else { request }
    }
}

impl Default for PageView {
    fn default() -> Self {
        Self::new(1)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Filter, FilterOp};

    #[test]
    fn max_pagination_rounds_up_and_never_drops_below_one() {
        let mut view = PageView::new(20);
        assert_eq!(view.max_pagination(), 1);

        view.record_count(20);
        assert_eq!(view.max_pagination(), 1);

        view.record_count(41);
        assert_eq!(view.max_pagination(), 3);
        assert_eq!(view.pagination_list().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn set_page_moves_the_window() {
        let mut view = PageView::new(10);

        assert_eq!(view.set_page(3), RowRange { start: 20, end: 29 });
        assert_eq!(view.page_number(), 3);
        assert_eq!(view.set_page(0), RowRange { start: 0, end: 9 });
    }

    #[test]
    fn huge_page_numbers_saturate() {
        let mut view = PageView::new(20);

        let range = view.set_page(u64::MAX);

        assert_eq!(
            range,
            RowRange {
                start: u64::MAX,
                end: u64::MAX,
            }
        );
        assert_eq!(view.page_number(), u64::MAX);
    }

    #[test]
    fn changing_filters_returns_to_first_page() {
        let mut view = PageView::new(10);
        view.set_page(4);
        view.record_count(100);

        let range = view.set_filters(
            FilterSet::all(vec![Filter::new("rating", FilterOp::Eq, "R")]),
            vec![Sort::desc("title")],
        );

        assert_eq!(range, RowRange { start: 0, end: 9 });
        assert_eq!(view.page_number(), 1);
        // the stale count stays until the caller records a fresh one
        assert_eq!(view.total_count(), 100);
    }

    #[test]
    fn request_carries_view_state() {
        let mut view = PageView::new(20);
        view.set_filters(
            FilterSet::all(vec![Filter::eq("rating", "R")]),
            vec![Sort::asc("title")],
        );
        view.set_page(2);

        let request = view.request("films", QueryExpression::columns(["title"]), false);

        assert_eq!(request.range_header().as_deref(), Some("20-39"));
        assert_eq!(request.prefer_header(), None);
        assert_eq!(
            request.to_query_pairs(),
            vec![
                ("select".to_string(), "title".to_string()),
                ("rating".to_string(), "eq.R".to_string()),
                ("order".to_string(), "title.asc".to_string()),
            ]
        );
        assert!(
            view.request("films", QueryExpression::columns(["title"]), true)
                .count
        );
    }

    #[test]
    fn zero_window_is_clamped() {
        assert_eq!(PageView::new(0).window_size(), 1);
    }
}
