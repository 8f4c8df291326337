use std::{fs, io::ErrorKind, path::Path};

use anyhow::Context;
use catalog::DEFAULT_PAGE_SIZE;
use client_core::{DEFAULT_API_URL, DEFAULT_FETCH_LIMIT, SEARCH_DEBOUNCE};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub demo_mode: bool,
    pub auth_enabled: bool,
    pub page_size: usize,
    pub search_debounce_ms: u64,
    pub fetch_limit: u32,
    pub session_database_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            demo_mode: false,
            auth_enabled: true,
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce_ms: SEARCH_DEBOUNCE.as_millis() as u64,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            session_database_url: "sqlite://./data/session.db".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    api_url: Option<String>,
    demo_mode: Option<bool>,
    auth_enabled: Option<bool>,
    page_size: Option<usize>,
    search_debounce_ms: Option<u64>,
    fetch_limit: Option<u32>,
    session_database_url: Option<String>,
}

/// Defaults, then `path` if it exists, then the process environment.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?,
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

pub fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file.api_url {
        settings.api_url = v;
    }
    if let Some(v) = file.demo_mode {
        settings.demo_mode = v;
    }
    if let Some(v) = file.auth_enabled {
        settings.auth_enabled = v;
    }
    if let Some(v) = file.page_size {
        settings.page_size = v;
    }
    if let Some(v) = file.search_debounce_ms {
        settings.search_debounce_ms = v;
    }
    if let Some(v) = file.fetch_limit {
        settings.fetch_limit = v;
    }
    if let Some(v) = file.session_database_url {
        settings.session_database_url = v;
    }
    Ok(())
}

/// Environment overrides. Unparseable numbers and flags are ignored.
pub fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = lookup("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = lookup("DEMO_MODE").as_deref().and_then(parse_flag) {
        settings.demo_mode = v;
    }
    if let Some(v) = lookup("AUTH_ENABLED").as_deref().and_then(parse_flag) {
        settings.auth_enabled = v;
    }

    if let Some(v) = lookup("PAGE_SIZE") {
        if let Ok(parsed) = v.trim().parse() {
            settings.page_size = parsed;
        }
    }
    if let Some(v) = lookup("SEARCH_DEBOUNCE_MS") {
        if let Ok(parsed) = v.trim().parse() {
            settings.search_debounce_ms = parsed;
        }
    }
    if let Some(v) = lookup("FETCH_LIMIT") {
        if let Ok(parsed) = v.trim().parse() {
            settings.fetch_limit = parsed;
        }
    }

    if let Some(v) = lookup("SESSION_DATABASE_URL") {
        settings.session_database_url = v;
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
