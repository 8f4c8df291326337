use super::*;
use crate::{
    auth::{AuthOptions, Credentials, SessionRestore},
    debounce::ManualClock,
    tests_support::{numbered, product, StubApi},
};
use storage::{KeyValueStore, MemoryStore};
use tokio::sync::broadcast::error::TryRecvError;

async fn signed_in(api: Arc<StubApi>) -> Arc<AuthService> {
    let auth = Arc::new(AuthService::new(
        Arc::new(MemoryStore::new()),
        api,
        AuthOptions::default(),
    ));
    auth.login(&Credentials::demo()).await.expect("demo login");
    auth
}

async fn controller(api: Arc<StubApi>, clock: &ManualClock) -> DashboardController {
    let session = signed_in(api.clone()).await;
    DashboardController::new(
        DashboardOptions::default(),
        api,
        session,
        Arc::new(clock.clone()),
    )
}

fn drain(rx: &mut broadcast::Receiver<DashboardEvent>) -> Vec<DashboardEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            Err(TryRecvError::Lagged(_)) => continue,
        }
    }
    events
}

#[tokio::test]
async fn load_reaches_ready_with_first_page() {
    let clock = ManualClock::new();
    let api = StubApi::with_products(numbered(20));
    let mut dashboard = controller(api.clone(), &clock).await;
    assert_eq!(dashboard.state(), ViewState::Idle);
    assert!(dashboard.view().is_loading);

    dashboard.load().await;

    let view = dashboard.view();
    assert_eq!(dashboard.state(), ViewState::Ready);
    assert!(!view.is_loading);
    assert_eq!(view.displayed_products.len(), 12);
    assert!(view.has_more);
    assert_eq!(view.total_matches, 20);
    assert_eq!(
        dashboard.categories(),
        &["all".to_string(), "smartphones".into(), "laptops".into()]
    );
    assert_eq!(
        *api.product_calls.lock().expect("lock"),
        vec![(DEFAULT_FETCH_LIMIT, 0, None)]
    );

    assert!(dashboard.on_load_more());
    let view = dashboard.view();
    assert_eq!(view.displayed_products.len(), 20);
    assert!(!view.has_more);
    assert!(!dashboard.on_load_more(), "exhausted load more is a no-op");
    assert_eq!(dashboard.displayed_products().len(), 20);
}

#[tokio::test]
async fn logged_out_dashboard_stays_idle() {
    let clock = ManualClock::new();
    let api = StubApi::with_products(numbered(3));
    let session = Arc::new(AuthService::new(
        Arc::new(MemoryStore::new()),
        api.clone(),
        AuthOptions::default(),
    ));
    let mut dashboard = DashboardController::new(
        DashboardOptions::default(),
        api.clone(),
        session,
        Arc::new(clock),
    );

    dashboard.load().await;
    assert_eq!(dashboard.state(), ViewState::Idle);
    assert!(api.product_calls.lock().expect("lock").is_empty());
    assert!(!dashboard.on_load_more());
}

#[tokio::test]
async fn fetch_failure_degrades_to_placeholders() {
    let clock = ManualClock::new();
    let mut dashboard = controller(StubApi::failing(), &clock).await;
    let mut events = dashboard.subscribe_events();

    dashboard.load().await;

    assert_eq!(dashboard.state(), ViewState::Ready);
    assert!(dashboard.is_degraded());
    assert!(matches!(
        dashboard.last_error(),
        Some(DashboardError::FetchFailure(_))
    ));
    let view = dashboard.view();
    assert_eq!(view.displayed_products.len(), 6);
    assert_eq!(view.displayed_products[0].title, "Sample Product 1");
    assert_eq!(view.displayed_products[5].price, 150.0);
    assert_eq!(
        dashboard.categories(),
        &["all", "electronics", "clothing", "furniture", "other"].map(String::from)
    );

    let events = drain(&mut events);
    assert!(events.contains(&DashboardEvent::StateChanged(ViewState::Loading)));
    assert!(events.contains(&DashboardEvent::StateChanged(ViewState::Error)));
    assert!(events.contains(&DashboardEvent::Notice {
        level: NoticeLevel::Error,
        message: "Failed to fetch products. Please try again.".into(),
    }));
    assert_eq!(
        events.last(),
        Some(&DashboardEvent::ViewUpdated {
            displayed: 6,
            total_matches: 6,
            has_more: false,
        })
    );
}

#[tokio::test]
async fn malformed_response_is_treated_as_fetch_failure() {
    let clock = ManualClock::new();
    let api = StubApi::with_products(Vec::new());
    api.set_products(Err(DashboardError::MalformedResponse("bad shape".into())));
    let mut dashboard = controller(api, &clock).await;

    dashboard.load().await;
    assert!(dashboard.is_degraded());
    assert_eq!(dashboard.view().displayed_products.len(), 6);
}

#[tokio::test]
async fn reload_replaces_the_store_and_clears_degradation() {
    let clock = ManualClock::new();
    let api = StubApi::failing();
    let mut dashboard = controller(api.clone(), &clock).await;
    dashboard.load().await;
    assert!(dashboard.is_degraded());

    api.set_products(Ok(numbered(3)));
    dashboard.load().await;
    assert!(!dashboard.is_degraded());
    assert!(dashboard.last_error().is_none());
    assert_eq!(dashboard.catalog_size(), 3);
}

#[tokio::test]
async fn last_completion_wins() {
    let clock = ManualClock::new();
    let mut dashboard = controller(StubApi::with_products(Vec::new()), &clock).await;

    dashboard.begin_load();
    dashboard.begin_load();
    dashboard.finish_products(Ok(numbered(2)));
    dashboard.finish_products(Ok(numbered(5)));
    assert_eq!(dashboard.catalog_size(), 5);
    assert_eq!(dashboard.view().total_matches, 5);
}

#[tokio::test]
async fn search_is_debounced_and_resets_paging() {
    let clock = ManualClock::new();
    let mut products = numbered(30);
    products.push(product(100, "iPhone 13", 999.0, "smartphones"));
    products.push(product(101, "Desk Lamp", 25.0, "home-decoration"));
    let mut dashboard = controller(StubApi::with_products(products), &clock).await;
    dashboard.load().await;
    assert!(dashboard.on_load_more());
    assert_eq!(dashboard.view().displayed_products.len(), 24);

    dashboard.on_search("p");
    clock.advance(Duration::from_millis(200));
    dashboard.on_search("ph");
    clock.advance(Duration::from_millis(200));
    dashboard.on_search("phone");
    assert!(!dashboard.tick());
    assert_eq!(dashboard.criteria().query, "");
    assert_eq!(dashboard.pending_search(), Some(SEARCH_DEBOUNCE));

    clock.advance(SEARCH_DEBOUNCE);
    assert!(dashboard.tick());
    assert!(!dashboard.tick());

    let view = dashboard.view();
    assert_eq!(view.criteria.query, "phone");
    assert_eq!(view.total_matches, 1);
    assert_eq!(view.displayed_products[0].title, "iPhone 13");
    assert!(!view.has_more);
}

#[tokio::test]
async fn category_and_sort_recompute_synchronously() {
    let clock = ManualClock::new();
    let products = vec![
        product(1, "Cheap Phone", 10.0, "smartphones"),
        product(2, "Lamp", 30.0, "home-decoration"),
        product(3, "Fancy Phone", 30.0, "smartphones"),
        product(4, "Mid Phone", 20.0, "smartphones"),
    ];
    let mut dashboard = controller(StubApi::with_products(products), &clock).await;
    dashboard.load().await;

    dashboard.on_sort_change(SortKey::PriceDesc);
    let prices: Vec<f64> = dashboard
        .displayed_products()
        .iter()
        .map(|p| p.price)
        .collect();
    assert_eq!(prices, vec![30.0, 30.0, 20.0, 10.0]);
    assert_eq!(dashboard.displayed_products()[0].id.0, 2, "ties keep input order");

    dashboard.on_category_change("smartphones");
    let ids: Vec<i64> = dashboard
        .displayed_products()
        .iter()
        .map(|p| p.id.0)
        .collect();
    assert_eq!(ids, vec![3, 4, 1]);

    dashboard.on_category_change("");
    assert_eq!(dashboard.criteria().category, CATEGORY_ALL);
    assert_eq!(dashboard.displayed_products().len(), 4);
}

#[tokio::test]
async fn criteria_set_before_load_apply_on_ready() {
    let clock = ManualClock::new();
    let products = vec![
        product(1, "iPhone 13", 999.0, "smartphones"),
        product(2, "Desk Lamp", 25.0, "home-decoration"),
    ];
    let mut dashboard = controller(StubApi::with_products(products), &clock).await;

    dashboard.on_search_immediate("lamp");
    dashboard.on_sort_change(SortKey::NameDesc);
    assert!(dashboard.displayed_products().is_empty());
    assert!(!dashboard.on_load_more());

    dashboard.load().await;
    let view = dashboard.view();
    assert_eq!(view.total_matches, 1);
    assert_eq!(view.displayed_products[0].title, "Desk Lamp");
    assert_eq!(view.criteria.sort_key, SortKey::NameDesc);
}

fn notices(events: &[DashboardEvent]) -> Vec<(NoticeLevel, &str)> {
    events
        .iter()
        .filter_map(|event| match event {
            DashboardEvent::Notice { level, message } => Some((*level, message.as_str())),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn session_changes_are_announced() {
    let clock = ManualClock::new();
    let api = StubApi::with_products(numbered(20));
    let session = Arc::new(AuthService::new(
        Arc::new(MemoryStore::new()),
        api.clone(),
        AuthOptions::default(),
    ));
    let mut dashboard = DashboardController::new(
        DashboardOptions::default(),
        api,
        session.clone(),
        Arc::new(clock),
    );
    let mut events = dashboard.subscribe_events();

    assert_eq!(dashboard.restore_session().await, SessionRestore::Anonymous);
    let rejected = Credentials::new("kminchelle", "wrong").expect("form");
    assert!(dashboard.login(&rejected).await.is_err());
    dashboard.login(&Credentials::demo()).await.expect("login");
    dashboard.load().await;
    dashboard.on_search_immediate("item");
    dashboard.logout().await;

    let events = drain(&mut events);
    assert_eq!(
        notices(&events),
        vec![
            (NoticeLevel::Error, "Login failed. Please check your credentials."),
            (NoticeLevel::Success, "Login successful!"),
            (NoticeLevel::Success, "Welcome back, Jeanne!"),
            (NoticeLevel::Info, "You have been logged out"),
        ]
    );
    assert!(!session.is_authenticated());
    assert_eq!(dashboard.state(), ViewState::Idle);
    assert!(dashboard.displayed_products().is_empty());
    assert_eq!(dashboard.criteria(), &Criteria::default());
    assert_eq!(dashboard.catalog_size(), 0);
}

#[tokio::test]
async fn expired_session_is_announced_on_restore() {
    let store = Arc::new(MemoryStore::new());
    store
        .set(crate::auth::keys::USER, "{}")
        .await
        .expect("set");
    // exp = 1 (1970-01-01T00:00:01Z), unsigned
    store
        .set(
            crate::auth::keys::TOKEN,
            "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJleHAiOjF9.c2ln",
        )
        .await
        .expect("set");
    let api = StubApi::with_products(Vec::new());
    let session = Arc::new(AuthService::new(store, api.clone(), AuthOptions::default()));
    let dashboard = DashboardController::new(
        DashboardOptions::default(),
        api,
        session,
        Arc::new(ManualClock::new()),
    );
    let mut events = dashboard.subscribe_events();

    assert_eq!(dashboard.restore_session().await, SessionRestore::Expired);
    assert_eq!(
        notices(&drain(&mut events)),
        vec![(
            NoticeLevel::Info,
            "Your session has expired. Please log in again."
        )]
    );
}

#[tokio::test]
async fn malformed_catalog_gets_its_own_notice() {
    let clock = ManualClock::new();
    let api = StubApi::with_products(Vec::new());
    api.set_products(Err(DashboardError::MalformedResponse("products".into())));
    let mut dashboard = controller(api, &clock).await;
    let mut events = dashboard.subscribe_events();

    dashboard.load().await;
    assert!(notices(&drain(&mut events)).contains(&(
        NoticeLevel::Error,
        "Received invalid product data from server."
    )));
}

#[tokio::test]
async fn pages_shown_tracks_load_more() {
    let clock = ManualClock::new();
    let mut dashboard = controller(StubApi::with_products(numbered(30)), &clock).await;
    assert_eq!(dashboard.pages_shown(), 0);

    dashboard.load().await;
    assert_eq!((dashboard.pages_shown(), dashboard.page_count()), (1, 3));
    dashboard.on_load_more();
    dashboard.on_load_more();
    assert_eq!((dashboard.pages_shown(), dashboard.page_count()), (3, 3));

    dashboard.on_search_immediate("nothing matches this");
    assert_eq!((dashboard.pages_shown(), dashboard.page_count()), (0, 0));
}
