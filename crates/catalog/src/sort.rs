//! Stable ordering of products by a [`SortKey`].

use std::cmp::Ordering;

use shared::domain::{Product, SortKey};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Returns a new sequence ordered by `key`. Equal elements keep their input order.
pub fn sort_products(products: &[Product], key: SortKey) -> Vec<Product> {
    let mut sorted = products.to_vec();
    // `sort_by` is a stable merge sort.
    sorted.sort_by(|a, b| compare(a, b, key));
    sorted
}

pub fn compare(a: &Product, b: &Product, key: SortKey) -> Ordering {
    match key {
        SortKey::NameAsc => collate(&a.title, &b.title),
        SortKey::NameDesc => collate(&b.title, &a.title),
        SortKey::PriceAsc => compare_numbers(a.price, b.price),
        SortKey::PriceDesc => compare_numbers(b.price, a.price),
        SortKey::RatingDesc => compare_numbers(b.rating, a.rating),
    }
}

fn compare_numbers(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Title collation in the manner of a root-locale `localeCompare`: base
/// letters first (accents and case folded away), then accents, then case with
/// lowercase ahead of uppercase.
pub fn collate(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(primary_key(b))
        .then_with(|| secondary_key(a).cmp(secondary_key(b)))
        .then_with(|| tertiary(a, b))
}

fn primary_key(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

fn secondary_key(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfkd().flat_map(char::to_lowercase)
}

fn tertiary(a: &str, b: &str) -> Ordering {
    for (left, right) in a.nfkd().zip(b.nfkd()) {
        if left == right {
            continue;
        }
        return match (left.is_lowercase(), right.is_lowercase()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => left.cmp(&right),
        };
    }
    a.nfkd().count().cmp(&b.nfkd().count())
}
