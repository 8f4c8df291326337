use serde::{Deserialize, Serialize};

use crate::domain::{Product, UserId};

/// One validated page of products as returned by the listing endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductsPage {
    pub products: Vec<Product>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryEntry {
    Slug(String),
    Described {
        slug: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl CategoryEntry {
    pub fn into_slug(self) -> String {
        match self {
            CategoryEntry::Slug(slug) | CategoryEntry::Described { slug, .. } => slug,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in_mins: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub image: String,
    #[serde(alias = "accessToken")]
    pub token: String,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        if self.first_name.trim().is_empty() {
            "User"
        } else {
            &self.first_name
        }
    }
}
