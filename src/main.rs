//! Binary entrypoint for reddit-top-relay.
//! One batch pass per invocation; schedule it with cron or a systemd timer.

use anyhow::Context;
use reddit_top_relay::metrics::Metrics;
use reddit_top_relay::AppConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact human logs by default, JSON lines with `LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("reddit_top_relay=info,dry_run=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env locally; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::from_env().context("loading configuration")?;
    tracing::info!(
        sources = cfg.sources.len(),
        limit = cfg.posts_limit,
        dedup_file = %cfg.dedup_path.display(),
        "relay starting"
    );

    let metrics = match &cfg.metrics_textfile {
        Some(_) => Some(Metrics::init()?),
        None => None,
    };

    let report = reddit_top_relay::run(&cfg).await?;

    let failed = report.failed_sources();
    tracing::info!(
        delivered = report.delivered_count(),
        failed_sources = failed.len(),
        "relay finished"
    );
    if !failed.is_empty() {
        tracing::warn!(sources = ?failed, "some sources were cut short by delivery failures");
    }
    match serde_json::to_string(&report) {
        Ok(json) => tracing::debug!(report = %json, "run report"),
        Err(e) => tracing::warn!(error = %e, "run report not serializable"),
    }

    if let (Some(m), Some(path)) = (&metrics, &cfg.metrics_textfile) {
        if let Err(e) = m.write_textfile(path).await {
            tracing::warn!(error = ?e, "metrics textfile not written");
        }
    }

    Ok(())
}
