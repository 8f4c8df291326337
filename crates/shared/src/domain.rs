use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ProductId);
id_newtype!(UserId);

/// Category sentinel that disables the category predicate.
pub const CATEGORY_ALL: &str = "all";

/// Demo currency symbol used by the product card.
pub const DEFAULT_CURRENCY: &str = "$";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub discount_percentage: f64,
    pub rating: f64,
    pub stock: u32,
    pub brand: String,
    pub category: String,
    pub thumbnail: String,
    pub images: Vec<String>,
}

impl Product {
    /// Price after applying `discount_percentage`.
    pub fn discounted_price(&self) -> f64 {
        self.price * (1.0 - self.discount_percentage / 100.0)
    }

    pub fn has_discount(&self) -> bool {
        self.discount_percentage > 0.0
    }
}

pub fn format_price(amount: f64, currency: &str) -> String {
    format!("{currency}{amount:.2}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    #[serde(rename = "name-asc", alias = "name")]
    NameAsc,
    #[serde(rename = "name-desc")]
    NameDesc,
    #[serde(rename = "price-asc", alias = "price")]
    PriceAsc,
    #[serde(rename = "price-desc")]
    PriceDesc,
    #[serde(rename = "rating-desc", alias = "rating")]
    RatingDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::NameAsc,
        SortKey::NameDesc,
        SortKey::PriceAsc,
        SortKey::PriceDesc,
        SortKey::RatingDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::NameAsc => "name-asc",
            SortKey::NameDesc => "name-desc",
            SortKey::PriceAsc => "price-asc",
            SortKey::PriceDesc => "price-desc",
            SortKey::RatingDesc => "rating-desc",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::NameAsc => "Name (A-Z)",
            SortKey::NameDesc => "Name (Z-A)",
            SortKey::PriceAsc => "Price (Low to High)",
            SortKey::PriceDesc => "Price (High to Low)",
            SortKey::RatingDesc => "Rating (Highest)",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = DashboardError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "name" | "name-asc" => Ok(SortKey::NameAsc),
            "name-desc" => Ok(SortKey::NameDesc),
            "price" | "price-asc" => Ok(SortKey::PriceAsc),
            "price-desc" => Ok(SortKey::PriceDesc),
            "rating" | "rating-desc" => Ok(SortKey::RatingDesc),
            other => Err(DashboardError::Validation(format!(
                "unknown sort key '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    pub query: String,
    pub category: String,
    pub sort_key: SortKey,
}

impl Default for Criteria {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: CATEGORY_ALL.to_string(),
            sort_key: SortKey::default(),
        }
    }
}

impl Criteria {
    pub fn is_unfiltered(&self) -> bool {
        self.query.is_empty() && self.category == CATEGORY_ALL
    }
}
