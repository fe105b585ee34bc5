//! Page requests and paged results used by repository queries.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Upper bound on a single page.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub index: usize,
    pub size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { index: 0, size: 20 }
    }
}

impl PageRequest {
    /// Build a request, rejecting empty pages and capping oversized ones.
    pub fn new(index: usize, size: usize) -> DomainResult<Self> {
        if size == 0 {
            return Err(DomainError::validation("page size must be greater than zero"));
        }
        Ok(Self {
            index,
            size: size.min(MAX_PAGE_SIZE),
        })
    }

    /// Number of rows skipped before this page.
    pub fn offset(&self) -> usize {
        self.index.saturating_mul(self.size)
    }
}

/// One page of an ordered result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub index: usize,
    pub size: usize,
    pub total_count: usize,
}

impl<T> Page<T> {
    /// Cut a page out of an already ordered sequence.
    pub fn from_ordered<I>(ordered: I, request: PageRequest) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut total_count = 0usize;
        let mut items = Vec::with_capacity(request.size.min(64));
        let offset = request.offset();
        for (position, item) in ordered.into_iter().enumerate() {
            total_count += 1;
            if position >= offset && items.len() < request.size {
                items.push(item);
            }
        }
        Self {
            items,
            index: request.index,
            size: request.size,
            total_count,
        }
    }

    pub fn total_pages(&self) -> usize {
        if self.size == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.size)
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.total_pages()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            index: self.index,
            size: self.size,
            total_count: self.total_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_size_is_rejected() {
        match PageRequest::new(0, 0) {
            Err(DomainError::Validation(_)) => {}
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn oversized_request_is_capped() {
        let req = PageRequest::new(0, 50_000).unwrap();
        assert_eq!(req.size, MAX_PAGE_SIZE);
    }

    #[test]
    fn middle_page_holds_expected_window() {
        let page = Page::from_ordered(1..=25, PageRequest::new(1, 10).unwrap());
        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total_count, 25);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_previous());
        assert!(page.has_next());
    }

    #[test]
    fn last_page_is_partial() {
        let page = Page::from_ordered(1..=25, PageRequest::new(2, 10).unwrap());
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert!(!page.has_next());
    }

    #[test]
    fn page_past_the_end_is_empty_but_counts() {
        let page = Page::from_ordered(1..=5, PageRequest::new(3, 10).unwrap());
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 5);
        assert_eq!(page.total_pages(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Concatenating every page reproduces the ordered input.
        #[test]
        fn pages_partition_the_sequence(total in 0usize..200, size in 1usize..30) {
            let all: Vec<usize> = (0..total).collect();
            let first = Page::from_ordered(all.clone(), PageRequest::new(0, size).unwrap());
            let pages = first.total_pages().max(1);

            let mut collected = Vec::new();
            for index in 0..pages {
                let page = Page::from_ordered(all.clone(), PageRequest::new(index, size).unwrap());
                prop_assert!(page.items.len() <= size);
                prop_assert_eq!(page.total_count, total);
                collected.extend(page.items);
            }
            prop_assert_eq!(collected, all);
        }
    }
}
