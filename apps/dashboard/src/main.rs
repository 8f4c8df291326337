mod config;

use std::{io::Write, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use catalog::PageSize;
use clap::Parser;
use client_core::{
    auth::{DEMO_PASSWORD, DEMO_USERNAME},
    AuthOptions, AuthService, Credentials, DashboardController, DashboardEvent, DashboardOptions,
    HttpCatalogApi, NoticeLevel, SessionRestore, SystemClock,
};
use shared::domain::{format_price, Product, SortKey, DEFAULT_CURRENCY};
use storage::{KeyValueStore, MemoryStore, Storage};
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines, Stdin},
    sync::broadcast::{self, error::TryRecvError},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type InputLines = Lines<BufReader<Stdin>>;

const TICK_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "dashboard", about = "Terminal product dashboard")]
struct Args {
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[arg(long, default_value = "dashboard.toml")]
    config: PathBuf,
    /// Accept any credentials and use the demo profile.
    #[arg(long)]
    demo: bool,
}

enum Flow {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = config::load_settings(&args.config)?;
    if let Some(api_url) = &args.api_url {
        settings.api_url = api_url.clone();
    }
    if args.demo {
        settings.demo_mode = true;
    }
    info!(
        api_url = %settings.api_url,
        demo_mode = settings.demo_mode,
        "starting dashboard"
    );

    let store = open_session_store(&settings.session_database_url).await;
    let api = Arc::new(HttpCatalogApi::new(&settings.api_url)?);
    let auth = Arc::new(AuthService::new(
        store,
        api.clone(),
        AuthOptions {
            demo_mode: settings.demo_mode,
            remote_login: settings.auth_enabled,
        },
    ));

    let options = DashboardOptions {
        page_size: PageSize::new(settings.page_size)?,
        search_debounce: Duration::from_millis(settings.search_debounce_ms),
        fetch_limit: settings.fetch_limit,
    };
    let mut dashboard = DashboardController::new(options, api, auth, Arc::new(SystemClock));
    let mut events = dashboard.subscribe_events();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let restored = dashboard.restore_session().await == SessionRestore::Restored;
    print_notices(&mut events);
    if !restored && !sign_in(&dashboard, &args, &mut lines, &mut events).await? {
        return Ok(());
    }

    dashboard.load().await;
    print_notices(&mut events);
    render(&dashboard);
    print_help();

    run_repl(&mut dashboard, &mut lines, &mut events).await
}

/// The SQLite session store, or an in-memory one when it cannot be opened.
async fn open_session_store(database_url: &str) -> Arc<dyn KeyValueStore> {
    let storage = Storage::new(database_url)
        .await
        .context("failed to open session store");
    match storage {
        Ok(storage) => {
            if let Err(err) = storage.health_check().await {
                warn!(error = %err, "session store is unhealthy");
            }
            Arc::new(storage)
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "sessions will not persist across restarts");
            Arc::new(MemoryStore::new())
        }
    }
}

async fn sign_in(
    dashboard: &DashboardController,
    args: &Args,
    lines: &mut InputLines,
    events: &mut broadcast::Receiver<DashboardEvent>,
) -> Result<bool> {
    let mut username = args.username.clone();
    let mut password = args.password.clone();
    if username.is_none() {
        println!("Demo credentials: {DEMO_USERNAME} / {DEMO_PASSWORD}");
    }

    loop {
        let user = match username.take() {
            Some(user) => user,
            None => match prompt("username: ", lines).await? {
                Some(user) => user,
                None => return Ok(false),
            },
        };
        let pass = match password.take() {
            Some(pass) => pass,
            None => match prompt("password: ", lines).await? {
                Some(pass) => pass,
                None => return Ok(false),
            },
        };

        let credentials = match Credentials::new(&user, &pass) {
            Ok(credentials) => credentials,
            Err(err) => {
                println!("{}", err.message());
                continue;
            }
        };
        let result = dashboard.login(&credentials).await;
        print_notices(events);
        match result {
            Ok(profile) => {
                info!(username = %profile.username, "signed in");
                return Ok(true);
            }
            Err(err) => println!("{}", err.message()),
        }
    }
}

async fn prompt(label: &str, lines: &mut InputLines) -> Result<Option<String>> {
    print!("{label}");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?)
}

async fn run_repl(
    dashboard: &mut DashboardController,
    lines: &mut InputLines,
    events: &mut broadcast::Receiver<DashboardEvent>,
) -> Result<()> {
    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let flow = handle_command(dashboard, line.trim()).await;
                print_notices(events);
                if let Flow::Quit = flow {
                    break;
                }
            }
            _ = ticker.tick() => {
                if dashboard.tick() {
                    render(dashboard);
                }
            }
        }
    }
    Ok(())
}

async fn handle_command(dashboard: &mut DashboardController, line: &str) -> Flow {
    let (command, rest) = line
        .split_once(char::is_whitespace)
        .map(|(command, rest)| (command, rest.trim()))
        .unwrap_or((line, ""));

    match command {
        "" => {}
        "search" => dashboard.on_search(rest),
        "category" => {
            dashboard.on_category_change(rest);
            render(dashboard);
        }
        "categories" => println!("{}", dashboard.categories().join(", ")),
        "sort" => match rest.parse::<SortKey>() {
            Ok(key) => {
                dashboard.on_sort_change(key);
                render(dashboard);
            }
            Err(err) => {
                let keys: Vec<&str> = SortKey::ALL.iter().map(|key| key.as_str()).collect();
                println!("{}; expected one of: {}", err.message(), keys.join(", "));
            }
        },
        "more" => {
            if dashboard.on_load_more() {
                render(dashboard);
            } else {
                println!("No more products.");
            }
        }
        "reload" => {
            dashboard.reload().await;
            render(dashboard);
        }
        "logout" => {
            dashboard.logout().await;
            return Flow::Quit;
        }
        "quit" | "exit" => return Flow::Quit,
        "help" => print_help(),
        other => println!("unknown command '{other}', type 'help'"),
    }
    Flow::Continue
}

fn render(dashboard: &DashboardController) {
    let view = dashboard.view();
    if view.degraded {
        println!("(showing sample products, the catalog could not be fetched)");
    }
    println!(
        "{} of {} products | category: {} | sort: {} | search: '{}'",
        view.displayed_products.len(),
        view.total_matches,
        view.criteria.category,
        view.criteria.sort_key.label(),
        view.criteria.query
    );
    if view.displayed_products.is_empty() {
        println!("No products found.");
    }
    for product in &view.displayed_products {
        println!("{}", product_line(product));
    }
    println!(
        "-- page {} of {}{} --",
        dashboard.pages_shown(),
        dashboard.page_count(),
        if view.has_more { ", 'more' to load more" } else { "" }
    );
}

fn product_line(product: &Product) -> String {
    let price = if product.has_discount() {
        format!(
            "{} (was {}, -{:.0}%)",
            format_price(product.discounted_price(), DEFAULT_CURRENCY),
            format_price(product.price, DEFAULT_CURRENCY),
            product.discount_percentage
        )
    } else {
        format_price(product.price, DEFAULT_CURRENCY)
    };
    format!(
        "{:>4}  {:<36} {:<30} {:.1}*  {}",
        product.id.0, product.title, price, product.rating, product.category
    )
}

fn print_notices(events: &mut broadcast::Receiver<DashboardEvent>) {
    loop {
        match events.try_recv() {
            Ok(DashboardEvent::Notice { level, message }) => {
                let tag = match level {
                    NoticeLevel::Info => "info",
                    NoticeLevel::Success => "ok",
                    NoticeLevel::Error => "error",
                };
                println!("[{tag}] {message}");
            }
            Ok(_) => {}
            Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "dashboard events dropped"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

fn print_help() {
    println!(
        "commands: search <text> | category <slug> | categories | sort <{}> | more | reload | logout | quit",
        SortKey::ALL
            .iter()
            .map(|key| key.as_str())
            .collect::<Vec<_>>()
            .join("|")
    );
}
