//! Maps remote JSON onto the internal product schema.
//!
//! Parsing fails closed: a single bad product rejects the whole response with
//! [`DashboardError::MalformedResponse`] instead of passing partial data on.

use std::collections::HashSet;

use serde::Deserialize;
use shared::{
    domain::{Product, ProductId},
    error::{DashboardError, DashboardResult},
    protocol::{CategoryEntry, ProductsPage},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProduct {
    id: i64,
    title: String,
    #[serde(default)]
    description: String,
    price: f64,
    #[serde(default)]
    discount_percentage: f64,
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    stock: u32,
    #[serde(default)]
    brand: String,
    category: String,
    #[serde(default)]
    thumbnail: String,
    #[serde(default)]
    images: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawProductsPage {
    products: Vec<RawProduct>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    skip: u64,
    #[serde(default)]
    limit: Option<u64>,
}

pub fn parse_products_page(body: &[u8]) -> DashboardResult<ProductsPage> {
    let raw: RawProductsPage = serde_json::from_slice(body)
        .map_err(|err| DashboardError::MalformedResponse(format!("products payload: {err}")))?;

    let mut seen = HashSet::with_capacity(raw.products.len());
    let mut products = Vec::with_capacity(raw.products.len());
    for product in raw.products {
        if !seen.insert(product.id) {
            return Err(DashboardError::MalformedResponse(format!(
                "duplicate product id {}",
                product.id
            )));
        }
        products.push(validate_product(product)?);
    }

    let count = products.len() as u64;
    Ok(ProductsPage {
        total: raw.total.unwrap_or(count),
        skip: raw.skip,
        limit: raw.limit.unwrap_or(count),
        products,
    })
}

pub fn parse_categories(body: &[u8]) -> DashboardResult<Vec<String>> {
    let entries: Vec<CategoryEntry> = serde_json::from_slice(body)
        .map_err(|err| DashboardError::MalformedResponse(format!("categories payload: {err}")))?;

    let mut categories = Vec::with_capacity(entries.len());
    for entry in entries {
        let slug = entry.into_slug();
        if slug.trim().is_empty() {
            return Err(DashboardError::MalformedResponse(
                "category with empty slug".into(),
            ));
        }
        if !categories.contains(&slug) {
            categories.push(slug);
        }
    }
    Ok(categories)
}

fn validate_product(raw: RawProduct) -> DashboardResult<Product> {
    let malformed =
        |detail: String| DashboardError::MalformedResponse(format!("product {}: {detail}", raw.id));

    if raw.title.trim().is_empty() {
        return Err(malformed("empty title".into()));
    }
    if raw.category.trim().is_empty() {
        return Err(malformed("empty category".into()));
    }
    if !raw.price.is_finite() || raw.price < 0.0 {
        return Err(malformed(format!("invalid price {}", raw.price)));
    }
    if !(0.0..=100.0).contains(&raw.discount_percentage) {
        return Err(malformed(format!(
            "discount {} outside 0-100",
            raw.discount_percentage
        )));
    }
    if !(0.0..=5.0).contains(&raw.rating) {
        return Err(malformed(format!("rating {} outside 0-5", raw.rating)));
    }

    Ok(Product {
        id: ProductId(raw.id),
        title: raw.title,
        description: raw.description,
        price: raw.price,
        discount_percentage: raw.discount_percentage,
        rating: raw.rating,
        stock: raw.stock,
        brand: raw.brand,
        category: raw.category,
        thumbnail: raw.thumbnail,
        images: raw.images,
    })
}

#[cfg(test)]
#[path = "tests/adapter_tests.rs"]
mod tests;
