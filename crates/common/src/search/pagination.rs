//! Fixed-size page cursor

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 24;

/// Offset/limit cursor; the offset is always a multiple of the limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Paginator {
    offset: usize,
    limit: usize,
}

/// One rendered page plus its navigation state
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub page_number: usize,
    pub total_pages: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Paginator {
    /// A zero limit is treated as one
    pub fn new(limit: usize) -> Self {
        Self {
            offset: 0,
            limit: limit.max(1),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn page_number(&self) -> usize {
        self.offset / self.limit + 1
    }

    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.limit)
    }

    fn last_offset(&self, total: usize) -> usize {
        self.total_pages(total).saturating_sub(1) * self.limit
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }

    pub fn first(&mut self) {
        self.offset = 0;
    }

    pub fn prev(&mut self) {
        self.offset = self.offset.saturating_sub(self.limit);
    }

    pub fn next(&mut self, total: usize) {
        let next = self.offset + self.limit;
        if next <= self.last_offset(total) {
            self.offset = next;
        }
    }

    pub fn last(&mut self, total: usize) {
        self.offset = self.last_offset(total);
    }

    /// Pull the offset back inside the list after it shrank
    pub fn clamp(&mut self, total: usize) {
        self.offset = self.offset.min(self.last_offset(total));
    }

    /// Slice the current page out of `items`
    pub fn page<T: Clone>(&self, items: &[T]) -> Page<T> {
        let total = items.len();
        let offset = self.offset.min(self.last_offset(total));
        let end = (offset + self.limit).min(total);

        Page {
            items: items[offset..end].to_vec(),
            total,
            offset,
            limit: self.limit,
            page_number: offset / self.limit + 1,
            total_pages: self.total_pages(total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_bounds() {
        let mut pager = Paginator::new(24);
        assert_eq!(pager.total_pages(50), 3);

        pager.last(50);
        assert_eq!(pager.offset(), 48);
        assert_eq!(pager.page_number(), 3);

        pager.next(50);
        assert_eq!(pager.offset(), 48);

        pager.prev();
        assert_eq!(pager.offset(), 24);
        pager.first();
        pager.prev();
        assert_eq!(pager.offset(), 0);
    }

    #[test]
    fn test_empty_list() {
        let mut pager = Paginator::default();
        assert_eq!(pager.total_pages(0), 0);
        pager.next(0);
        pager.last(0);
        assert_eq!(pager.offset(), 0);

        let page = pager.page::<u8>(&[]);
        assert!(page.items.is_empty());
        assert_eq!(page.page_number, 1);
    }

    #[test]
    fn test_page_slices_and_clamps() {
        let items: Vec<usize> = (0..50).collect();
        let mut pager = Paginator::new(24);
        pager.last(50);

        let page = pager.page(&items);
        assert_eq!(page.items, vec![48, 49]);
        assert_eq!(page.total_pages, 3);

        pager.clamp(10);
        assert_eq!(pager.offset(), 0);
    }

    #[test]
    fn test_exact_multiple() {
        let mut pager = Paginator::new(24);
        pager.last(48);
        assert_eq!(pager.offset(), 24);
        pager.next(48);
        assert_eq!(pager.offset(), 24);
    }
}
