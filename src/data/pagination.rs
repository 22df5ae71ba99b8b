//! Pagination controller
//!
//! Slices a filtered view into pages and derives the windowed page-button
//! layout shown under the table.

use tracing::debug;

pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 25, 50, 100];
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Number of numbered buttons in the page window
const WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    current_page: usize,
    page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One element of the page-button bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageButton {
    Page { number: usize, current: bool },
    Ellipsis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLayout {
    pub buttons: Vec<PageButton>,
    pub total_pages: usize,
    pub current_page: usize,
    /// 1-based inclusive item range; (0, 0) when there is nothing to show
    pub first_item: usize,
    pub last_item: usize,
    pub total_items: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PageLayout {
    /// Range summary such as "26-50 de 112"
    pub fn summary(&self) -> String {
        format!("{}-{} de {}", self.first_item, self.last_item, self.total_items)
    }
}

pub fn total_pages(item_count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    item_count.div_ceil(page_size)
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Self {
            current_page: 1,
            page_size: normalize_page_size(page_size),
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Clamp the current page into the valid range for `item_count`
    pub fn clamp(&mut self, item_count: usize) {
        let pages = total_pages(item_count, self.page_size);
        let clamped = self.current_page.clamp(1, pages.max(1));
        if clamped != self.current_page {
            debug!("Clamping page {} -> {}", self.current_page, clamped);
            self.current_page = clamped;
        }
    }

    /// Move to `page`; returns false (and changes nothing) when out of range
    pub fn go_to(&mut self, page: usize, item_count: usize) -> bool {
        let pages = total_pages(item_count, self.page_size);
        if page < 1 || page > pages {
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn first_page(&mut self) {
        self.current_page = 1;
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = normalize_page_size(page_size);
        self.current_page = 1;
    }

    /// Index range of the current page within a view of `item_count` items
    pub fn range(&self, item_count: usize) -> std::ops::Range<usize> {
        let start = (self.current_page - 1) * self.page_size;
        let start = start.min(item_count);
        let end = (start + self.page_size).min(item_count);
        start..end
    }

    /// The items of the current page
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.range(items.len())]
    }

    pub fn layout(&self, item_count: usize) -> PageLayout {
        let total = total_pages(item_count, self.page_size);
        let current = self.current_page.clamp(1, total.max(1));
        let range = Pagination {
            current_page: current,
            page_size: self.page_size,
        }
        .range(item_count);

        let mut buttons = Vec::new();
        if total > 0 {
            let mut start = current.saturating_sub(2).max(1);
            let end = (start + WINDOW - 1).min(total);
            if end + 1 - start < WINDOW {
                start = (end + 1).saturating_sub(WINDOW).max(1);
            }

            if start > 1 {
                buttons.push(PageButton::Page { number: 1, current: false });
                if start > 2 {
                    buttons.push(PageButton::Ellipsis);
                }
            }
            for number in start..=end {
                buttons.push(PageButton::Page {
                    number,
                    current: number == current,
                });
            }
            if end < total {
                if end < total - 1 {
                    buttons.push(PageButton::Ellipsis);
                }
                buttons.push(PageButton::Page { number: total, current: false });
            }
        }

        PageLayout {
            buttons,
            total_pages: total,
            current_page: current,
            first_item: if range.is_empty() { 0 } else { range.start + 1 },
            last_item: range.end,
            total_items: item_count,
            has_previous: current > 1,
            has_next: current < total,
        }
    }
}

/// Unknown sizes fall back to the default option
pub fn normalize_page_size(page_size: usize) -> usize {
    if PAGE_SIZE_OPTIONS.contains(&page_size) {
        page_size
    } else {
        DEFAULT_PAGE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(layout: &PageLayout) -> Vec<Option<usize>> {
        layout
            .buttons
            .iter()
            .map(|b| match b {
                PageButton::Page { number, .. } => Some(*number),
                PageButton::Ellipsis => None,
            })
            .collect()
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 25), 0);
        assert_eq!(total_pages(1, 25), 1);
        assert_eq!(total_pages(25, 25), 1);
        assert_eq!(total_pages(26, 25), 2);
    }

    #[test]
    fn test_pages_partition_items() {
        let items: Vec<usize> = (0..103).collect();
        for size in PAGE_SIZE_OPTIONS {
            let mut p = Pagination::new(size);
            let mut seen = Vec::new();
            for page in 1..=total_pages(items.len(), size) {
                assert!(p.go_to(page, items.len()));
                let slice = p.slice(&items);
                assert!(slice.len() <= size);
                seen.extend_from_slice(slice);
            }
            assert_eq!(seen, items);
        }
    }

    #[test]
    fn test_out_of_range_navigation_is_ignored() {
        let mut p = Pagination::new(10);
        assert!(p.go_to(3, 50));
        assert!(!p.go_to(0, 50));
        assert!(!p.go_to(6, 50));
        assert_eq!(p.current_page(), 3);
    }

    #[test]
    fn test_clamp_after_shrink() {
        let mut p = Pagination::new(10);
        assert!(p.go_to(5, 50));
        p.clamp(12);
        assert_eq!(p.current_page(), 2);
        p.clamp(0);
        assert_eq!(p.current_page(), 1);
    }

    #[test]
    fn test_page_size_change_resets_page() {
        let mut p = Pagination::new(10);
        p.go_to(4, 100);
        p.set_page_size(50);
        assert_eq!(p.current_page(), 1);
        assert_eq!(p.page_size(), 50);
        p.set_page_size(7);
        assert_eq!(p.page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_layout_window_with_ellipses() {
        let mut p = Pagination::new(10);
        p.go_to(10, 200);
        let layout = p.layout(200);
        assert_eq!(
            numbers(&layout),
            vec![Some(1), None, Some(8), Some(9), Some(10), Some(11), Some(12), None, Some(20)]
        );
        assert_eq!(layout.summary(), "91-100 de 200");
    }

    #[test]
    fn test_layout_near_edges() {
        let p = Pagination::new(10);
        assert_eq!(
            numbers(&p.layout(200)),
            vec![Some(1), Some(2), Some(3), Some(4), Some(5), None, Some(20)]
        );

        let mut p = Pagination::new(10);
        p.go_to(20, 200);
        assert_eq!(
            numbers(&p.layout(200)),
            vec![Some(1), None, Some(16), Some(17), Some(18), Some(19), Some(20)]
        );

        let mut p = Pagination::new(10);
        p.go_to(4, 60);
        assert_eq!(
            numbers(&p.layout(60)),
            vec![Some(1), Some(2), Some(3), Some(4), Some(5), Some(6)]
        );
    }

    #[test]
    fn test_layout_empty() {
        let layout = Pagination::default().layout(0);
        assert!(layout.buttons.is_empty());
        assert_eq!(layout.total_pages, 0);
        assert_eq!(layout.current_page, 1);
        assert_eq!(layout.summary(), "0-0 de 0");
        assert!(!layout.has_next);
    }
}
