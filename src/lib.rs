// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod dedup;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod pipeline;
pub mod retry;

pub use crate::config::AppConfig;
pub use crate::dedup::{DedupSet, DedupStore};
pub use crate::ingest::{CandidateItem, MediaRef, SourceProvider, SourceSpec};
pub use crate::notify::{Deliverer, Notifier};
pub use crate::pipeline::RunReport;
pub use crate::retry::RetryPolicy;

use crate::ingest::providers::reddit::RedditProvider;
use crate::notify::log::LogNotifier;
use crate::notify::telegram::TelegramNotifier;

/// One full relay pass: load the dedup file, run every source, save the file
/// if anything new went out.
pub async fn run(cfg: &AppConfig) -> anyhow::Result<RunReport> {
    let provider = RedditProvider::new(cfg.user_agent.clone())
        .with_base_url(cfg.reddit_base_url.clone())
        .with_timeout(cfg.http_timeout);

    let notifier: Box<dyn Notifier> = if cfg.dry_run {
        tracing::info!("DRY_RUN set, captions are logged instead of sent");
        Box::new(LogNotifier)
    } else {
        Box::new(
            TelegramNotifier::new(cfg.telegram_token.clone(), cfg.chat_id.clone())
                .with_api_base(cfg.telegram_api_base.clone())
                .with_timeout(cfg.http_timeout),
        )
    };
    let deliverer = Deliverer::new(notifier, cfg.retry);

    let store = DedupStore::new(&cfg.dedup_path);
    let now = chrono::Utc::now().timestamp();
    Ok(run_with(cfg, &provider, &deliverer, &store, now).await)
}

/// [`run`] with every collaborator injected.
pub async fn run_with<N: Notifier>(
    cfg: &AppConfig,
    provider: &dyn SourceProvider,
    deliverer: &Deliverer<N>,
    store: &DedupStore,
    now: i64,
) -> RunReport {
    let mut seen = store.load().await;
    let report = pipeline::run_sources(
        &cfg.sources,
        cfg.posts_limit,
        provider,
        deliverer,
        &mut seen,
        now,
    )
    .await;
    store.commit(&seen).await;
    report
}
