use std::path::Path;

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metric descriptions (so series carry help text in the export).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("relay_candidates_total", "Posts fetched per source.");
        describe_counter!("relay_skipped_total", "Posts dropped by screening, by reason.");
        describe_counter!("relay_delivered_total", "Posts sent to the chat.");
        describe_counter!(
            "relay_delivery_failures_total",
            "Sends that failed after all retries."
        );
        describe_counter!("relay_fetch_errors_total", "Source fetch/parse failures.");
        describe_counter!("relay_send_retries_total", "Failed attempts that were retried.");
        describe_histogram!("relay_fetch_ms", "Source fetch + parse time in milliseconds.");
        describe_gauge!("relay_last_run_ts", "Unix ts when the relay last finished a run.");
    });
}

/// Prometheus recorder for a batch process: nothing scrapes us, so the
/// exposition is written to a file for the node-exporter textfile collector.
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("installing prometheus recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Write via temp file + rename so the collector never reads a partial file.
    pub async fn write_textfile(&self, path: &Path) -> Result<()> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        tokio::fs::write(&tmp, self.render())
            .await
            .with_context(|| format!("writing metrics to {}", path.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }
}
