//! Text and category predicates over the product list.

use shared::domain::{Product, CATEGORY_ALL};

/// Keeps products matching both the text query and the category, in input order.
///
/// An empty `query` matches everything. Otherwise the lowercased query must occur
/// in the title, description, category or brand. A `category` of `"all"` matches
/// everything; any other value must equal the product category exactly.
pub fn filter_products(products: &[Product], query: &str, category: &str) -> Vec<Product> {
    let needle = query.to_lowercase();
    products
        .iter()
        .filter(|product| matches_query(product, &needle) && matches_category(product, category))
        .cloned()
        .collect()
}

/// `needle` must already be lowercased.
pub fn matches_query(product: &Product, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    [
        product.title.as_str(),
        product.description.as_str(),
        product.category.as_str(),
        product.brand.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

pub fn matches_category(product: &Product, category: &str) -> bool {
    category == CATEGORY_ALL || product.category == category
}
