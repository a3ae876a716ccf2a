use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::Url;

pub const DEFAULT_ENDPOINT: &str = "https://cricwidget-graphql-u2sv.vercel.app/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_POLL_SECS: u64 = 60;
pub const DEFAULT_NEWS_TOPIC: &str = "cricket";
const LOG_DIR: &str = "cricwidget";
const LOG_FILE: &str = "cricwidget.log";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub endpoint: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub news_topic: String,
    pub demo: bool,
    pub fetch_threads: usize,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            news_topic: DEFAULT_NEWS_TOPIC.to_string(),
            demo: false,
            fetch_threads: 4,
            log_file: None,
        }
    }
}

impl Config {
    /// Reads `.env.local`, then `.env`, then the process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let endpoint = lookup("CRICWIDGET_GRAPHQL_URL")
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let parsed = Url::parse(&endpoint)
            .with_context(|| format!("CRICWIDGET_GRAPHQL_URL is not a valid url: {endpoint}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("CRICWIDGET_GRAPHQL_URL must be http or https, got {}", parsed.scheme());
        }

        let timeout_secs = lookup("CRICWIDGET_TIMEOUT_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(1, 120);
        let poll_secs = lookup("CRICWIDGET_POLL_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_POLL_SECS)
            .max(5);
        let news_topic = lookup("CRICWIDGET_NEWS_TOPIC")
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or_else(|| DEFAULT_NEWS_TOPIC.to_string());
        let demo = lookup("CRICWIDGET_DEMO")
            .map(|val| matches!(val.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let fetch_threads = lookup("CRICWIDGET_FETCH_THREADS")
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(4)
            .clamp(1, 16);
        let log_file = lookup("CRICWIDGET_LOG_FILE")
            .filter(|val| !val.trim().is_empty())
            .map(PathBuf::from)
            .or_else(|| default_log_path(&lookup));

        Ok(Self {
            endpoint,
            request_timeout: Duration::from_secs(timeout_secs),
            poll_interval: Duration::from_secs(poll_secs),
            news_topic,
            demo,
            fetch_threads,
            log_file,
        })
    }
}

fn default_log_path(lookup: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(base) = lookup("XDG_STATE_HOME").filter(|v| !v.trim().is_empty()) {
        return Some(PathBuf::from(base).join(LOG_DIR).join(LOG_FILE));
    }
    let home = lookup("HOME").filter(|v| !v.trim().is_empty())?;
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("state")
            .join(LOG_DIR)
            .join(LOG_FILE),
    )
}
