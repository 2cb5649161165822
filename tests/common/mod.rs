// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reddit_top_relay::{CandidateItem, Notifier, SourceProvider};

/// Canned candidates per source name; records every fetch.
#[derive(Default)]
pub struct MockProvider {
    pub items: HashMap<String, Vec<CandidateItem>>,
    pub fetches: Mutex<Vec<(String, usize)>>,
}

impl MockProvider {
    pub fn with(mut self, source: &str, items: Vec<CandidateItem>) -> Self {
        self.items.insert(source.to_string(), items);
        self
    }

    pub fn fetched_sources(&self) -> Vec<String> {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .map(|(s, _)| s.clone())
            .collect()
    }
}

#[async_trait]
impl SourceProvider for MockProvider {
    async fn fetch(&self, source: &str, limit: usize) -> Vec<CandidateItem> {
        self.fetches.lock().unwrap().push((source.to_string(), limit));
        self.items
            .get(source)
            .map(|v| v.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    fn name(&self) -> &'static str {
        "MockProvider"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text { html: String, link_preview: bool },
    Photo { url: String, caption: String },
}

impl Sent {
    pub fn body(&self) -> &str {
        match self {
            Sent::Text { html, .. } => html,
            Sent::Photo { caption, .. } => caption,
        }
    }
}

/// Records successful sends. Fails the first `fail_first` calls, and any call
/// whose body contains one of `poison`.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Sent>>,
    pub attempts: Mutex<usize>,
    pub fail_first: usize,
    pub poison: Vec<String>,
}

impl RecordingNotifier {
    pub fn failing_first(n: usize) -> Self {
        Self {
            fail_first: n,
            ..Default::default()
        }
    }

    pub fn poisoned(marker: &str) -> Self {
        Self {
            poison: vec![marker.to_string()],
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    fn gate(&self, body: &str) -> Result<()> {
        let mut n = self.attempts.lock().unwrap();
        *n += 1;
        if *n <= self.fail_first {
            return Err(anyhow!("transient failure #{n}"));
        }
        if self.poison.iter().any(|p| body.contains(p.as_str())) {
            return Err(anyhow!("rejected by sink"));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_text(&self, html: &str, link_preview: bool) -> Result<()> {
        self.gate(html)?;
        self.sent.lock().unwrap().push(Sent::Text {
            html: html.to_string(),
            link_preview,
        });
        Ok(())
    }

    async fn send_photo(&self, photo_url: &str, caption_html: &str) -> Result<()> {
        self.gate(caption_html)?;
        self.sent.lock().unwrap().push(Sent::Photo {
            url: photo_url.to_string(),
            caption: caption_html.to_string(),
        });
        Ok(())
    }
}
