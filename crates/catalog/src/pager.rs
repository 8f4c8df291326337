//! Page slicing and "load more" accumulation.

use std::num::NonZeroUsize;

use shared::{domain::Product, error::DashboardError};

/// Products per page used by the dashboard grid.
pub const DEFAULT_PAGE_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize(NonZeroUsize);

impl PageSize {
    pub fn new(size: usize) -> Result<Self, DashboardError> {
        NonZeroUsize::new(size)
            .map(Self)
            .ok_or_else(|| DashboardError::Validation("page size must be positive".into()))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(NonZeroUsize::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN))
    }
}

/// Items in `[index * size, (index + 1) * size)`, clipped; empty past the end.
pub fn page(products: &[Product], size: PageSize, index: usize) -> &[Product] {
    let start = index.saturating_mul(size.get()).min(products.len());
    let end = start.saturating_add(size.get()).min(products.len());
    &products[start..end]
}

pub fn has_more(products: &[Product], size: PageSize, index: usize) -> bool {
    index.saturating_add(1).saturating_mul(size.get()) < products.len()
}

pub fn page_count(len: usize, size: PageSize) -> usize {
    len.div_ceil(size.get())
}

/// Accumulated prefix of a sorted result, grown one page at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    page_size: PageSize,
    current_page: usize,
    accumulated: Vec<Product>,
}

impl PageState {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            current_page: 0,
            accumulated: Vec::new(),
        }
    }

    /// Back to page 0 over `sorted`.
    pub fn reset(&mut self, sorted: &[Product]) {
        self.current_page = 0;
        self.accumulated = page(sorted, self.page_size, 0).to_vec();
    }

    /// Appends the next page of `sorted`. Returns `false` without touching state
    /// when nothing is left.
    pub fn load_more(&mut self, sorted: &[Product]) -> bool {
        if !has_more(sorted, self.page_size, self.current_page) {
            return false;
        }
        let next = self.current_page + 1;
        self.accumulated
            .extend_from_slice(page(sorted, self.page_size, next));
        self.current_page = next;
        true
    }

    pub fn has_more(&self, sorted: &[Product]) -> bool {
        has_more(sorted, self.page_size, self.current_page)
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn accumulated(&self) -> &[Product] {
        &self.accumulated
    }
}
