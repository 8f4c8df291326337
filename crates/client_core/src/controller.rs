//! Dashboard view controller: owns the criteria, drives the product pipeline
//! and publishes the displayed subset.

use std::{sync::Arc, time::Duration};

use catalog::{PageSize, Pipeline, ProductStore};
use shared::{
    domain::{Criteria, Product, ProductId, SortKey, CATEGORY_ALL},
    error::{DashboardError, DashboardResult},
    protocol::UserProfile,
};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::{
    api::CatalogApi,
    auth::{AuthService, Credentials, SessionRestore},
    debounce::{Clock, Debouncer, SEARCH_DEBOUNCE},
};

/// Products requested for the initial client-side catalog.
pub const DEFAULT_FETCH_LIMIT: u32 = 100;

const FALLBACK_CATEGORIES: [&str; 4] = ["electronics", "clothing", "furniture", "other"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Loading,
    Ready,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    StateChanged(ViewState),
    Notice { level: NoticeLevel, message: String },
    ViewUpdated {
        displayed: usize,
        total_matches: usize,
        has_more: bool,
    },
}

/// What the presentation layer renders.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub displayed_products: Vec<Product>,
    pub is_loading: bool,
    pub has_more: bool,
    pub total_matches: usize,
    pub criteria: Criteria,
    pub degraded: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct DashboardOptions {
    pub page_size: PageSize,
    pub search_debounce: Duration,
    pub fetch_limit: u32,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::default(),
            search_debounce: SEARCH_DEBOUNCE,
            fetch_limit: DEFAULT_FETCH_LIMIT,
        }
    }
}

pub struct DashboardController {
    api: Arc<dyn CatalogApi>,
    session: Arc<AuthService>,
    fetch_limit: u32,
    state: ViewState,
    store: ProductStore,
    pipeline: Pipeline,
    criteria: Criteria,
    categories: Vec<String>,
    search: Debouncer<String>,
    degraded: bool,
    last_error: Option<DashboardError>,
    events: broadcast::Sender<DashboardEvent>,
}

impl DashboardController {
    pub fn new(
        options: DashboardOptions,
        api: Arc<dyn CatalogApi>,
        session: Arc<AuthService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            api,
            session,
            fetch_limit: options.fetch_limit,
            state: ViewState::Idle,
            store: ProductStore::default(),
            pipeline: Pipeline::new(options.page_size),
            criteria: Criteria::default(),
            categories: vec![CATEGORY_ALL.to_string()],
            search: Debouncer::new(options.search_debounce, clock),
            degraded: false,
            last_error: None,
            events,
        }
    }

    /// Mount or reload: fetches products and categories concurrently and
    /// applies both results. Skipped while logged out.
    pub async fn load(&mut self) {
        if !self.session.is_authenticated() {
            info!("not authenticated; skipping catalog fetch");
            return;
        }

        if let Some(greeting) = self.session.welcome_message().await {
            self.notify(NoticeLevel::Success, greeting);
        }

        self.begin_load();
        let api = Arc::clone(&self.api);
        let (products, categories) = futures::join!(
            api.fetch_products(self.fetch_limit, 0, None),
            api.fetch_categories()
        );
        self.finish_products(products.map(|page| page.products));
        self.finish_categories(categories);
    }

    /// Picks up a stored session, announcing one that has expired.
    pub async fn restore_session(&self) -> SessionRestore {
        let outcome = self.session.restore().await;
        if outcome == SessionRestore::Expired {
            self.notify(
                NoticeLevel::Info,
                "Your session has expired. Please log in again.",
            );
        }
        outcome
    }

    pub async fn login(&self, credentials: &Credentials) -> DashboardResult<UserProfile> {
        let result = self.session.login(credentials).await;
        match &result {
            Ok(_) => self.notify(NoticeLevel::Success, "Login successful!"),
            Err(_) => self.notify(
                NoticeLevel::Error,
                "Login failed. Please check your credentials.",
            ),
        }
        result
    }

    /// Ends the session and drops the catalog and criteria.
    pub async fn logout(&mut self) {
        self.session.logout().await;
        self.search.cancel();
        self.store.replace(Vec::new());
        self.criteria = Criteria::default();
        self.degraded = false;
        self.last_error = None;
        self.pipeline.recompute(&self.store, &self.criteria);
        self.set_state(ViewState::Idle);
        self.notify(NoticeLevel::Info, "You have been logged out");
    }

    /// Refetches the catalog, keeping the current criteria.
    pub async fn reload(&mut self) {
        info!(criteria = ?self.criteria, "reloading catalog");
        self.load().await;
    }

    pub fn begin_load(&mut self) {
        self.set_state(ViewState::Loading);
    }

    /// Applies a product fetch completion. Completions are not matched to the
    /// request that started them, so the last one to arrive wins.
    pub fn finish_products(&mut self, result: DashboardResult<Vec<Product>>) {
        match result {
            Ok(products) => {
                info!(count = products.len(), "products loaded");
                self.store.replace(products);
                self.degraded = false;
                self.last_error = None;
            }
            Err(err) => {
                error!(error = %err, "product fetch failed; using placeholder catalog");
                self.set_state(ViewState::Error);
                let message = match &err {
                    DashboardError::MalformedResponse(_) => {
                        "Received invalid product data from server."
                    }
                    _ => "Failed to fetch products. Please try again.",
                };
                self.notify(NoticeLevel::Error, message);
                self.store.replace(placeholder_products());
                self.degraded = true;
                self.last_error = Some(err);
            }
        }
        self.set_state(ViewState::Ready);
        self.recompute();
    }

    pub fn finish_categories(&mut self, result: DashboardResult<Vec<String>>) {
        let fetched = match result {
            Ok(categories) => categories,
            Err(err) => {
                warn!(error = %err, "category fetch failed; using defaults");
                FALLBACK_CATEGORIES.iter().map(|c| c.to_string()).collect()
            }
        };
        self.categories = std::iter::once(CATEGORY_ALL.to_string())
            .chain(
                fetched
                    .into_iter()
                    .filter(|c| !c.trim().is_empty() && c != CATEGORY_ALL),
            )
            .collect();
        debug!(count = self.categories.len(), "categories updated");
    }

    /// Debounced search: the query is applied by a later [`tick`](Self::tick).
    pub fn on_search(&mut self, query: &str) {
        self.search.push(query.to_string());
    }

    pub fn on_search_immediate(&mut self, query: &str) {
        self.search.cancel();
        self.apply_query(query.to_string());
    }

    /// Applies a settled search query, if any. Returns whether one was applied.
    pub fn tick(&mut self) -> bool {
        match self.search.poll() {
            Some(query) => {
                self.apply_query(query);
                true
            }
            None => false,
        }
    }

    /// Time until a pending search settles.
    pub fn pending_search(&self) -> Option<Duration> {
        self.search.remaining()
    }

    pub fn on_category_change(&mut self, category: &str) {
        let category = match category.trim() {
            "" => CATEGORY_ALL,
            other => other,
        };
        if !self.categories.iter().any(|c| c == category) {
            warn!(%category, "category is not in the known list");
        }
        if self.criteria.category != category {
            self.criteria.category = category.to_string();
            self.criteria_changed();
        }
    }

    pub fn on_sort_change(&mut self, sort_key: SortKey) {
        if self.criteria.sort_key != sort_key {
            self.criteria.sort_key = sort_key;
            self.criteria_changed();
        }
    }

    /// Appends the next page. No-op outside `Ready` or when exhausted.
    pub fn on_load_more(&mut self) -> bool {
        if self.state != ViewState::Ready {
            debug!(state = ?self.state, "load more ignored");
            return false;
        }
        let grew = self.pipeline.load_more();
        if grew {
            self.publish_view();
        }
        grew
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            displayed_products: self.pipeline.displayed().to_vec(),
            is_loading: self.is_loading(),
            has_more: self.state == ViewState::Ready && self.pipeline.has_more(),
            total_matches: self.pipeline.total_matches(),
            criteria: self.criteria.clone(),
            degraded: self.degraded,
        }
    }

    pub fn displayed_products(&self) -> &[Product] {
        self.pipeline.displayed()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, ViewState::Idle | ViewState::Loading)
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn catalog_size(&self) -> usize {
        self.store.len()
    }

    /// Pages shown so far, counting from 1.
    pub fn pages_shown(&self) -> usize {
        if self.pipeline.displayed().is_empty() {
            0
        } else {
            self.pipeline.current_page() + 1
        }
    }

    pub fn page_count(&self) -> usize {
        self.pipeline.page_count()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn last_error(&self) -> Option<&DashboardError> {
        self.last_error.as_ref()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    fn apply_query(&mut self, query: String) {
        if self.criteria.query != query {
            self.criteria.query = query;
            self.criteria_changed();
        }
    }

    fn criteria_changed(&mut self) {
        if self.state == ViewState::Ready {
            self.recompute();
        } else {
            debug!(state = ?self.state, "criteria recorded; pipeline not ready");
        }
    }

    fn recompute(&mut self) {
        self.pipeline.recompute(&self.store, &self.criteria);
        self.publish_view();
    }

    fn publish_view(&self) {
        let _ = self.events.send(DashboardEvent::ViewUpdated {
            displayed: self.pipeline.displayed().len(),
            total_matches: self.pipeline.total_matches(),
            has_more: self.pipeline.has_more(),
        });
    }

    fn set_state(&mut self, state: ViewState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "dashboard state change");
            self.state = state;
            let _ = self.events.send(DashboardEvent::StateChanged(state));
        }
    }

    fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        let _ = self.events.send(DashboardEvent::Notice {
            level,
            message: message.into(),
        });
    }
}

/// Catalog shown when the product fetch fails.
pub fn placeholder_products() -> Vec<Product> {
    (1..=6)
        .map(|index: i64| Product {
            id: ProductId(index),
            title: format!("Sample Product {index}"),
            description: "This is a sample product for demonstration".to_string(),
            price: 100.0 + (index - 1) as f64 * 10.0,
            discount_percentage: 5.0,
            rating: 4.5,
            stock: 100,
            brand: "Demo Brand".to_string(),
            category: "electronics".to_string(),
            thumbnail: format!("https://via.placeholder.com/150?text=Product+{index}"),
            images: vec![format!(
                "https://via.placeholder.com/640x360?text=Product+{index}"
            )],
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
