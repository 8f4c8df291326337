use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shared::{
    domain::{Product, ProductId, UserId},
    error::{DashboardError, DashboardResult},
    protocol::{LoginRequest, ProductsPage, UserProfile},
};

use crate::api::CatalogApi;

pub fn product(id: i64, title: &str, price: f64, category: &str) -> Product {
    Product {
        id: ProductId(id),
        title: title.to_string(),
        description: format!("{title} for testing"),
        price,
        discount_percentage: 0.0,
        rating: 4.0,
        stock: 5,
        brand: "Acme".to_string(),
        category: category.to_string(),
        thumbnail: String::new(),
        images: Vec::new(),
    }
}

pub fn numbered(count: i64) -> Vec<Product> {
    (0..count)
        .map(|id| product(id, &format!("Item {id:02}"), 1.0 + id as f64, "misc"))
        .collect()
}

/// Scripted [`CatalogApi`] that records calls and bearer tokens.
pub struct StubApi {
    pub products: Mutex<DashboardResult<Vec<Product>>>,
    pub categories: Mutex<DashboardResult<Vec<String>>>,
    pub login_result: Mutex<DashboardResult<UserProfile>>,
    pub tokens: Mutex<Vec<Option<String>>>,
    pub product_calls: Mutex<Vec<(u32, u32, Option<String>)>>,
    pub login_calls: Mutex<Vec<String>>,
}

impl StubApi {
    pub fn with_products(products: Vec<Product>) -> Arc<Self> {
        Arc::new(Self {
            products: Mutex::new(Ok(products)),
            categories: Mutex::new(Ok(vec!["smartphones".into(), "laptops".into()])),
            login_result: Mutex::new(Err(DashboardError::AuthFailure(
                "Invalid credentials".into(),
            ))),
            tokens: Mutex::new(Vec::new()),
            product_calls: Mutex::new(Vec::new()),
            login_calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        let api = Self::with_products(Vec::new());
        *api.products.lock().expect("lock") =
            Err(DashboardError::FetchFailure("connection refused".into()));
        *api.categories.lock().expect("lock") =
            Err(DashboardError::FetchFailure("connection refused".into()));
        api
    }

    pub fn set_products(&self, result: DashboardResult<Vec<Product>>) {
        *self.products.lock().expect("lock") = result;
    }

    pub fn accept_login(&self, profile: UserProfile) {
        *self.login_result.lock().expect("lock") = Ok(profile);
    }
}

#[async_trait]
impl CatalogApi for StubApi {
    async fn fetch_products(
        &self,
        limit: u32,
        offset: u32,
        query: Option<&str>,
    ) -> DashboardResult<ProductsPage> {
        self.product_calls
            .lock()
            .expect("lock")
            .push((limit, offset, query.map(str::to_string)));
        let products = self.products.lock().expect("lock").clone()?;
        Ok(ProductsPage {
            total: products.len() as u64,
            skip: u64::from(offset),
            limit: u64::from(limit),
            products,
        })
    }

    async fn fetch_products_by_category(
        &self,
        category: &str,
        limit: u32,
        offset: u32,
    ) -> DashboardResult<ProductsPage> {
        let mut page = self.fetch_products(limit, offset, None).await?;
        page.products.retain(|p| p.category == category);
        Ok(page)
    }

    async fn fetch_categories(&self) -> DashboardResult<Vec<String>> {
        self.categories.lock().expect("lock").clone()
    }

    async fn login(&self, request: &LoginRequest) -> DashboardResult<UserProfile> {
        self.login_calls
            .lock()
            .expect("lock")
            .push(request.username.clone());
        self.login_result.lock().expect("lock").clone()
    }

    fn set_bearer_token(&self, token: Option<&str>) {
        self.tokens
            .lock()
            .expect("lock")
            .push(token.map(str::to_string));
    }
}

pub fn remote_profile(token: &str) -> UserProfile {
    UserProfile {
        id: UserId(1),
        username: "emilys".into(),
        email: "emily@example.test".into(),
        first_name: "Emily".into(),
        last_name: "Johnson".into(),
        gender: "female".into(),
        image: String::new(),
        token: token.into(),
    }
}
