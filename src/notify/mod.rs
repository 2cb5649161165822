// src/notify/mod.rs
pub mod format;
pub mod log;
pub mod telegram;

use anyhow::Result;

use crate::ingest::types::{CandidateItem, MediaRef};
use crate::retry::RetryPolicy;

/// A chat-style sink that accepts HTML-formatted messages.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, html: &str, link_preview: bool) -> Result<()>;
    async fn send_photo(&self, photo_url: &str, caption_html: &str) -> Result<()>;
}

#[async_trait::async_trait]
impl<N: Notifier + ?Sized> Notifier for Box<N> {
    async fn send_text(&self, html: &str, link_preview: bool) -> Result<()> {
        (**self).send_text(html, link_preview).await
    }

    async fn send_photo(&self, photo_url: &str, caption_html: &str) -> Result<()> {
        (**self).send_photo(photo_url, caption_html).await
    }
}

/// How one item goes out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendPlan {
    Photo { url: String, caption: String },
    Text { html: String, link_preview: bool },
}

/// Videos and galleries have no single uploadable URL, so they go out as text
/// and let the link preview carry the media.
pub fn plan(item: &CandidateItem) -> SendPlan {
    let caption = format::caption(item);
    match &item.media {
        MediaRef::Image { url } => SendPlan::Photo {
            url: url.clone(),
            caption,
        },
        MediaRef::Video { .. } | MediaRef::Gallery | MediaRef::None => SendPlan::Text {
            html: caption,
            link_preview: true,
        },
    }
}

/// Formats items and pushes them through a [`Notifier`], retrying each send.
pub struct Deliverer<N> {
    notifier: N,
    retry: RetryPolicy,
}

impl<N: Notifier> Deliverer<N> {
    pub fn new(notifier: N, retry: RetryPolicy) -> Self {
        Self { notifier, retry }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Send one item. An error here means every retry failed.
    pub async fn deliver(&self, item: &CandidateItem) -> Result<()> {
        let label = format!("deliver {}", item.id);
        match plan(item) {
            SendPlan::Photo { url, caption } => {
                self.retry
                    .run(&label, || self.notifier.send_photo(&url, &caption))
                    .await
            }
            SendPlan::Text { html, link_preview } => {
                self.retry
                    .run(&label, || self.notifier.send_text(&html, link_preview))
                    .await
            }
        }
    }
}
