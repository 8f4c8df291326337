//! Client-side product pipeline: store, filter, sort and paginate.

use shared::domain::{Criteria, Product};
use tracing::debug;

pub mod filter;
pub mod pager;
pub mod sort;

pub use filter::filter_products;
pub use pager::{has_more, page, page_count, PageSize, PageState, DEFAULT_PAGE_SIZE};
pub use sort::sort_products;

/// The full product list for a session. Replaced wholesale on (re)load.
#[derive(Debug, Clone, Default)]
pub struct ProductStore {
    products: Vec<Product>,
}

impl ProductStore {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn replace(&mut self, products: Vec<Product>) {
        self.products = products;
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for product in &self.products {
            if !seen.contains(&product.category) {
                seen.push(product.category.clone());
            }
        }
        seen
    }
}

/// Filtered and sorted result for one set of criteria, plus its page state.
#[derive(Debug, Clone)]
pub struct Pipeline {
    matches: Vec<Product>,
    pages: PageState,
}

impl Pipeline {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            matches: Vec::new(),
            pages: PageState::new(page_size),
        }
    }

    /// Runs filter then sort over `store` and resets pagination to page 0.
    pub fn recompute(&mut self, store: &ProductStore, criteria: &Criteria) {
        let filtered = filter_products(store.products(), &criteria.query, &criteria.category);
        self.matches = sort_products(&filtered, criteria.sort_key);
        self.pages.reset(&self.matches);
        debug!(
            query = %criteria.query,
            category = %criteria.category,
            sort = %criteria.sort_key,
            total = store.len(),
            matches = self.matches.len(),
            "recomputed product pipeline"
        );
    }

    pub fn load_more(&mut self) -> bool {
        self.pages.load_more(&self.matches)
    }

    pub fn displayed(&self) -> &[Product] {
        self.pages.accumulated()
    }

    pub fn has_more(&self) -> bool {
        self.pages.has_more(&self.matches)
    }

    pub fn matches(&self) -> &[Product] {
        &self.matches
    }

    pub fn total_matches(&self) -> usize {
        self.matches.len()
    }

    pub fn current_page(&self) -> usize {
        self.pages.current_page()
    }

    pub fn page_size(&self) -> PageSize {
        self.pages.page_size()
    }

    pub fn page_count(&self) -> usize {
        page_count(self.matches.len(), self.pages.page_size())
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod tests_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/property_tests.rs"]
mod property_tests;
