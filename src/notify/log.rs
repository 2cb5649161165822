use anyhow::Result;

use super::Notifier;

/// Dry-run sink: logs what would have been sent and always succeeds.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send_text(&self, html: &str, link_preview: bool) -> Result<()> {
        tracing::info!(target: "dry_run", link_preview, "send_text:\n{html}");
        Ok(())
    }

    async fn send_photo(&self, photo_url: &str, caption_html: &str) -> Result<()> {
        tracing::info!(target: "dry_run", photo_url, "send_photo:\n{caption_html}");
        Ok(())
    }
}
