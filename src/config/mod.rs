//! Runtime configuration, read once from the environment at startup.
//!
//! Required: `TELEGRAM_BOT_TOKEN`, `TELEGRAM_CHAT_ID`, `SUBREDDITS`.
//! Everything else has a default. See `AppConfig::from_vars` for the full list.

pub mod sources;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, ensure, Context, Result};

use crate::dedup;
use crate::ingest::providers::reddit;
use crate::ingest::types::SourceSpec;
use crate::notify::telegram;
use crate::retry::RetryPolicy;

pub const DEFAULT_SCORE_THRESHOLD: i64 = 1000;
pub const DEFAULT_POSTS_LIMIT: usize = 50;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_token: String,
    pub chat_id: String,
    /// Processed in this order.
    pub sources: Vec<SourceSpec>,
    pub default_threshold: i64,
    pub posts_limit: usize,
    pub dedup_path: PathBuf,
    pub user_agent: String,
    pub http_timeout: Duration,
    pub retry: RetryPolicy,
    /// Log captions instead of sending them.
    pub dry_run: bool,
    pub metrics_textfile: Option<PathBuf>,
    pub reddit_base_url: String,
    pub telegram_api_base: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup (the process env in production, a map in tests).
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |k: &str| get(k).ok_or_else(|| anyhow!("missing required env var {k}"));

        let telegram_token = require("TELEGRAM_BOT_TOKEN")?;
        let chat_id = require("TELEGRAM_CHAT_ID")?;

        let default_threshold = parse_or("SCORE_THRESHOLD", get("SCORE_THRESHOLD"), DEFAULT_SCORE_THRESHOLD)?;
        let sources = sources::parse_sources(&require("SUBREDDITS")?, default_threshold)
            .context("parsing SUBREDDITS")?;

        let posts_limit = parse_or("POSTS_LIMIT", get("POSTS_LIMIT"), DEFAULT_POSTS_LIMIT)?;
        let http_timeout_secs = parse_or(
            "HTTP_TIMEOUT_SECS",
            get("HTTP_TIMEOUT_SECS"),
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?;
        ensure!(posts_limit > 0, "POSTS_LIMIT must be at least 1");
        ensure!(http_timeout_secs > 0, "HTTP_TIMEOUT_SECS must be at least 1");

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy::new(
            parse_or("RETRY_MAX_ATTEMPTS", get("RETRY_MAX_ATTEMPTS"), defaults.max_attempts)?,
            Duration::from_millis(parse_or(
                "RETRY_BASE_DELAY_MS",
                get("RETRY_BASE_DELAY_MS"),
                defaults.base_delay.as_millis() as u64,
            )?),
        );

        let dry_run = get("DRY_RUN").is_some_and(|v| {
            matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
        });

        Ok(Self {
            telegram_token,
            chat_id,
            sources,
            default_threshold,
            posts_limit,
            dedup_path: get("SENT_POSTS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(dedup::DEFAULT_PATH)),
            user_agent: get("REDDIT_USER_AGENT")
                .unwrap_or_else(|| reddit::DEFAULT_USER_AGENT.to_string()),
            http_timeout: Duration::from_secs(http_timeout_secs),
            retry,
            dry_run,
            metrics_textfile: get("METRICS_TEXTFILE").map(PathBuf::from),
            reddit_base_url: get("REDDIT_BASE_URL")
                .unwrap_or_else(|| reddit::DEFAULT_BASE_URL.to_string()),
            telegram_api_base: get("TELEGRAM_API_BASE")
                .unwrap_or_else(|| telegram::DEFAULT_API_BASE.to_string()),
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        None => Ok(default),
        Some(v) => v
            .parse::<T>()
            .with_context(|| format!("invalid value {v:?} for {key}")),
    }
}
