use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use shared::{
    error::{ApiError, DashboardError, DashboardResult},
    protocol::{LoginRequest, ProductsPage, UserProfile},
};
use tracing::{debug, warn};
use url::Url;

use crate::adapter::{parse_categories, parse_products_page};

pub const DEFAULT_API_URL: &str = "https://dummyjson.com";

/// Remote catalog and login endpoints.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn fetch_products(
        &self,
        limit: u32,
        offset: u32,
        query: Option<&str>,
    ) -> DashboardResult<ProductsPage>;
    async fn fetch_products_by_category(
        &self,
        category: &str,
        limit: u32,
        offset: u32,
    ) -> DashboardResult<ProductsPage>;
    async fn fetch_categories(&self) -> DashboardResult<Vec<String>>;
    async fn login(&self, request: &LoginRequest) -> DashboardResult<UserProfile>;

    /// Bearer token attached to subsequent requests. Ignored by default.
    fn set_bearer_token(&self, _token: Option<&str>) {}
}

#[derive(Serialize)]
struct ListProductsQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    q: Option<&'a str>,
    limit: u32,
    skip: u32,
}

pub struct HttpCatalogApi {
    http: Client,
    base_url: Url,
    token: RwLock<Option<String>>,
}

impl HttpCatalogApi {
    pub fn new(base_url: &str) -> DashboardResult<Self> {
        Ok(Self::with_client(Client::new(), parse_base_url(base_url)?))
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            token: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> DashboardResult<Url> {
        self.base_url.join(path).map_err(|err| {
            DashboardError::Validation(format!("invalid endpoint path '{path}': {err}"))
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.token.read().unwrap_or_else(PoisonError::into_inner);
        match token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_body(&self, url: Url, query: Option<&ListProductsQuery<'_>>) -> DashboardResult<Vec<u8>> {
        let path = url.path().to_string();
        let mut request = self.http.get(url);
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|err| DashboardError::FetchFailure(format!("GET {path}: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%path, %status, "catalog request rejected");
            return Err(DashboardError::FetchFailure(format!(
                "GET {path} returned {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| DashboardError::FetchFailure(format!("GET {path}: {err}")))?;
        debug!(%path, bytes = body.len(), "catalog response received");
        Ok(body.to_vec())
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn fetch_products(
        &self,
        limit: u32,
        offset: u32,
        query: Option<&str>,
    ) -> DashboardResult<ProductsPage> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let url = match query {
            Some(_) => self.endpoint("products/search")?,
            None => self.endpoint("products")?,
        };
        let params = ListProductsQuery {
            q: query,
            limit,
            skip: offset,
        };
        let body = self.get_body(url, Some(&params)).await?;
        parse_products_page(&body)
    }

    async fn fetch_products_by_category(
        &self,
        category: &str,
        limit: u32,
        offset: u32,
    ) -> DashboardResult<ProductsPage> {
        let mut url = self.endpoint("products/category/")?;
        url.path_segments_mut()
            .map_err(|_| DashboardError::Validation("api url cannot hold a path".into()))?
            .pop_if_empty()
            .push(category);
        let params = ListProductsQuery {
            q: None,
            limit,
            skip: offset,
        };
        let body = self.get_body(url, Some(&params)).await?;
        parse_products_page(&body)
    }

    async fn fetch_categories(&self) -> DashboardResult<Vec<String>> {
        let url = self.endpoint("products/categories")?;
        let body = self.get_body(url, None).await?;
        parse_categories(&body)
    }

    async fn login(&self, request: &LoginRequest) -> DashboardResult<UserProfile> {
        let url = self.endpoint("auth/login")?;
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|err| DashboardError::AuthFailure(format!("login request failed: {err}")))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let message = response
                .json::<ApiError>()
                .await
                .map(|body| body.message)
                .unwrap_or_else(|_| "Invalid username or password".to_string());
            return Err(DashboardError::AuthFailure(message));
        }
        if !status.is_success() {
            return Err(DashboardError::AuthFailure(format!(
                "login returned {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| DashboardError::AuthFailure(format!("login response: {err}")))?;
        serde_json::from_slice(&body)
            .map_err(|err| DashboardError::MalformedResponse(format!("login payload: {err}")))
    }

    fn set_bearer_token(&self, token: Option<&str>) {
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *guard = token.map(str::to_string);
    }
}

/// Parses `raw` and makes sure its path ends with `/` so endpoints join beneath it.
pub fn parse_base_url(raw: &str) -> DashboardResult<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|err| DashboardError::Validation(format!("invalid api url '{raw}': {err}")))?;
    if url.cannot_be_a_base() {
        return Err(DashboardError::Validation(format!(
            "api url '{raw}' cannot be a base"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
