//! # Relay pipeline
//! Fetch → screen (dedup, recency, threshold) → deliver, one source at a time.
//!
//! Sources run in configured order and candidates in the order the source
//! ranked them; nothing runs concurrently. A send that still
//! fails after its retries stops the rest of *that* source only; the next
//! source still runs and ids already delivered are kept.

use metrics::{counter, gauge};
use serde::Serialize;

use crate::dedup::DedupSet;
use crate::ingest::filter::{screen, Screen};
use crate::ingest::types::{SourceProvider, SourceSpec};
use crate::notify::{Deliverer, Notifier};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub fetched: usize,
    pub delivered: Vec<String>,
    pub already_seen: usize,
    pub stale: usize,
    pub below_threshold: usize,
    /// Set when a send exhausted its retries and the source was cut short.
    pub aborted: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub sources: Vec<SourceReport>,
}

impl RunReport {
    pub fn delivered(&self) -> impl Iterator<Item = &str> {
        self.sources
            .iter()
            .flat_map(|s| s.delivered.iter().map(String::as_str))
    }

    pub fn delivered_count(&self) -> usize {
        self.sources.iter().map(|s| s.delivered.len()).sum()
    }

    pub fn failed_sources(&self) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|s| s.aborted.is_some())
            .map(|s| s.source.as_str())
            .collect()
    }
}

pub async fn process_source<N: Notifier>(
    spec: &SourceSpec,
    limit: usize,
    provider: &dyn SourceProvider,
    deliverer: &Deliverer<N>,
    seen: &mut DedupSet,
    now: i64,
) -> SourceReport {
    let mut report = SourceReport {
        source: spec.name.clone(),
        ..Default::default()
    };

    let items = provider.fetch(&spec.name, limit).await;
    report.fetched = items.len();
    counter!("relay_candidates_total", "source" => spec.name.clone()).increment(items.len() as u64);

    for item in &items {
        let verdict = screen(item, spec, seen, now);
        match verdict {
            Screen::AlreadySeen => report.already_seen += 1,
            Screen::Stale => report.stale += 1,
            Screen::BelowThreshold => report.below_threshold += 1,
            Screen::Pass => {}
        }
        if verdict != Screen::Pass {
            tracing::debug!(source = %spec.name, id = %item.id, score = item.score, reason = verdict.as_str(), "skipped");
            counter!("relay_skipped_total", "reason" => verdict.as_str()).increment(1);
            continue;
        }

        match deliverer.deliver(item).await {
            Ok(()) => {
                seen.insert(item.id.clone());
                report.delivered.push(item.id.clone());
                counter!("relay_delivered_total", "source" => spec.name.clone()).increment(1);
                tracing::info!(source = %spec.name, id = %item.id, score = item.score, "delivered");
            }
            Err(e) => {
                counter!("relay_delivery_failures_total", "source" => spec.name.clone())
                    .increment(1);
                tracing::error!(
                    source = %spec.name,
                    id = %item.id,
                    error = ?e,
                    "delivery failed after retries, skipping rest of source"
                );
                report.aborted = Some(format!("{}: {e:#}", item.id));
                break;
            }
        }
    }

    report
}

/// Run every source in order against the shared dedup set.
pub async fn run_sources<N: Notifier>(
    sources: &[SourceSpec],
    limit: usize,
    provider: &dyn SourceProvider,
    deliverer: &Deliverer<N>,
    seen: &mut DedupSet,
    now: i64,
) -> RunReport {
    crate::metrics::ensure_metrics_described();

    let mut run = RunReport::default();
    for spec in sources {
        let report = process_source(spec, limit, provider, deliverer, seen, now).await;
        tracing::info!(
            source = %report.source,
            fetched = report.fetched,
            delivered = report.delivered.len(),
            already_seen = report.already_seen,
            stale = report.stale,
            below_threshold = report.below_threshold,
            aborted = report.aborted.is_some(),
            "source done"
        );
        run.sources.push(report);
    }

    gauge!("relay_last_run_ts").set(now as f64);
    run
}
