pub mod adapter;
pub mod api;
pub mod auth;
pub mod controller;
pub mod debounce;

pub use api::{CatalogApi, HttpCatalogApi, DEFAULT_API_URL};
pub use auth::{AuthOptions, AuthService, Credentials, SessionRestore};
pub use controller::{
    DashboardController, DashboardEvent, DashboardOptions, DashboardView, NoticeLevel, ViewState,
    DEFAULT_FETCH_LIMIT,
};
pub use debounce::{Clock, Debouncer, ManualClock, SystemClock, SEARCH_DEBOUNCE};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod tests_support;
