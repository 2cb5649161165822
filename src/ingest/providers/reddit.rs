// src/ingest/providers/reddit.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::ingest::media::{self, MediaHints};
use crate::ingest::types::{CandidateItem, SourceProvider};

pub const DEFAULT_BASE_URL: &str = "https://www.reddit.com";
pub const DEFAULT_USER_AGENT: &str = "telegram-reddit-bot/0.1";

/// Accept whatever the field holds; anything that does not fit `T` becomes
/// `T::default()` instead of failing the whole listing.
fn lenient<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let v = serde_json::Value::deserialize(d)?;
    Ok(T::deserialize(v).unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
struct Listing {
    #[serde(default, deserialize_with = "lenient")]
    data: ListingData,
}

#[derive(Debug, Default, Deserialize)]
struct ListingData {
    #[serde(default, deserialize_with = "lenient")]
    children: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Child {
    #[serde(default, deserialize_with = "lenient")]
    data: RawPost,
}

#[derive(Debug, Default, Deserialize)]
struct RawPost {
    #[serde(default, deserialize_with = "lenient")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    score: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    hide_score: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    ups: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    upvote_ratio: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    permalink: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    url_overridden_by_dest: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    is_video: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    is_gallery: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    media: Option<RawMedia>,
    #[serde(default, deserialize_with = "lenient")]
    preview: Option<RawPreview>,
    #[serde(default, deserialize_with = "lenient")]
    link_flair_text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    link_flair_richtext: Vec<FlairSegment>,
    #[serde(default, deserialize_with = "lenient")]
    created_utc: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMedia {
    #[serde(default, deserialize_with = "lenient")]
    reddit_video: Option<RawVideo>,
}

#[derive(Debug, Default, Deserialize)]
struct RawVideo {
    #[serde(default, deserialize_with = "lenient")]
    fallback_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPreview {
    #[serde(default, deserialize_with = "lenient")]
    images: Vec<RawPreviewImage>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPreviewImage {
    #[serde(default, deserialize_with = "lenient")]
    source: Option<RawImageSource>,
}

#[derive(Debug, Default, Deserialize)]
struct RawImageSource {
    #[serde(default, deserialize_with = "lenient")]
    url: Option<String>,
}

/// One `link_flair_richtext` segment: `{"e":"text","t":"..."}` or
/// `{"e":"emoji","a":":name:","u":"..."}`.
#[derive(Debug, Default, Deserialize)]
struct FlairSegment {
    #[serde(default, deserialize_with = "lenient")]
    e: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    t: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    a: Option<String>,
}

/// Sanitised upvote ratio: anything outside (0, 1] or missing becomes 1.0.
fn sanitize_ratio(ratio: Option<f64>) -> f64 {
    match ratio {
        Some(r) if r.is_finite() && r > 0.0 => r.min(1.0),
        _ => 1.0,
    }
}

/// Approximate net score from upvotes and upvote ratio, for posts whose score
/// is hidden.
///
/// This is a heuristic, not a vote count: Reddit fuzzes both inputs and the
/// ratio is rounded to two decimals, so the result is only good for display.
pub fn reconstruct_score(upvotes: u64, ratio: f64) -> i64 {
    let ratio = sanitize_ratio(Some(ratio));
    let ups = upvotes as f64;
    let total = (ups / ratio).round();
    let downvotes = (total - ups).max(0.0);
    (ups - downvotes) as i64
}

fn resolve_flair(text: Option<&str>, rich: &[FlairSegment]) -> Option<String> {
    if let Some(t) = text.map(str::trim).filter(|t| !t.is_empty()) {
        return Some(t.to_string());
    }
    let mut out = String::new();
    for seg in rich {
        match seg.e.as_deref() {
            Some("emoji") => {
                if let Some(name) = seg.a.as_deref().map(|a| a.trim_matches(':')) {
                    if !name.is_empty() {
                        out.push(':');
                        out.push_str(name);
                        out.push(':');
                    }
                }
            }
            _ => {
                if let Some(t) = seg.t.as_deref() {
                    out.push_str(t);
                }
            }
        }
    }
    let out = out.trim();
    (!out.is_empty()).then(|| out.to_string())
}

impl RawPost {
    fn into_candidate(self) -> Option<CandidateItem> {
        let id = self.id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())?;

        let upvotes = self.ups.filter(|u| u.is_finite()).map(|u| u.max(0.0) as u64);
        let ratio = sanitize_ratio(self.upvote_ratio);
        let has_vote_breakdown = upvotes.is_some() && self.upvote_ratio.is_some();

        let score_hidden = self.hide_score.unwrap_or(false);
        let score = match (self.score.filter(|s| s.is_finite()), upvotes) {
            (Some(s), _) if !score_hidden => s as i64,
            (_, Some(ups)) => reconstruct_score(ups, ratio),
            (Some(s), None) => s as i64,
            (None, None) => 0,
        };

        let url = self
            .url_overridden_by_dest
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .or(self.url.as_deref());
        let video_url = self
            .media
            .as_ref()
            .and_then(|m| m.reddit_video.as_ref())
            .and_then(|v| v.fallback_url.as_deref());
        let preview_url = self
            .preview
            .as_ref()
            .and_then(|p| {
                p.images
                    .iter()
                    .find_map(|i| i.source.as_ref().and_then(|s| s.url.as_deref()))
            });

        let media = media::classify(&MediaHints {
            url,
            is_video: self.is_video.unwrap_or(false),
            is_gallery: self.is_gallery.unwrap_or(false),
            video_url,
            preview_url,
        });

        let flair = resolve_flair(self.link_flair_text.as_deref(), &self.link_flair_richtext);

        Some(CandidateItem {
            id,
            title: self.title.unwrap_or_else(|| "No Title".to_string()),
            score,
            upvotes: upvotes.unwrap_or(0),
            ratio,
            has_vote_breakdown,
            permalink: self.permalink.unwrap_or_default(),
            created_at: self
                .created_utc
                .filter(|t| t.is_finite())
                .map(|t| t as i64)
                .unwrap_or(0),
            flair,
            media,
        })
    }
}

/// Parse a `top.json` listing body. Entries that are not objects or carry no
/// id are dropped; every other missing field gets its default.
pub fn parse_listing(body: &str) -> Result<Vec<CandidateItem>> {
    let listing: Listing = serde_json::from_str(body).context("parsing reddit listing json")?;
    let mut out = Vec::with_capacity(listing.data.children.len());
    for raw in listing.data.children {
        let child: Child = match serde_json::from_value(raw) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed listing child");
                continue;
            }
        };
        match child.data.into_candidate() {
            Some(item) => out.push(item),
            None => tracing::debug!("skipping listing child without id"),
        }
    }
    Ok(out)
}

/// Fetches "top of day" listings from Reddit's public JSON endpoint.
#[derive(Clone)]
pub struct RedditProvider {
    base_url: String,
    user_agent: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl RedditProvider {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: user_agent.into(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn top_url(&self, source: &str) -> String {
        format!("{}/r/{}/top.json", self.base_url, source)
    }

    /// Same as [`SourceProvider::fetch`] but surfaces the failure.
    pub async fn try_fetch(&self, source: &str, limit: usize) -> Result<Vec<CandidateItem>> {
        let t0 = std::time::Instant::now();

        let rsp = self
            .client
            .get(self.top_url(source))
            .query(&[("limit", limit.to_string()), ("t", "day".to_string())])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("requesting top posts for r/{source}"))?;

        let status = rsp.status();
        if !status.is_success() {
            anyhow::bail!("reddit returned status {status} for r/{source}");
        }

        let body = rsp
            .text()
            .await
            .with_context(|| format!("reading listing body for r/{source}"))?;
        let items = parse_listing(&body)?;

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("relay_fetch_ms").record(ms);
        if items.is_empty() {
            tracing::info!(source, "no posts in listing");
        }
        Ok(items)
    }
}

#[async_trait]
impl SourceProvider for RedditProvider {
    async fn fetch(&self, source: &str, limit: usize) -> Vec<CandidateItem> {
        match self.try_fetch(source, limit).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(provider = self.name(), source, error = ?e, "source fetch failed");
                counter!("relay_fetch_errors_total", "source" => source.to_string()).increment(1);
                Vec::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "reddit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::MediaRef;

    #[test]
    fn reconstruct_matches_hand_computation() {
        // 900 ups at 90% ⇒ ~1000 votes ⇒ 100 down ⇒ 800 net.
        assert_eq!(reconstruct_score(900, 0.9), 800);
        assert_eq!(reconstruct_score(42, 1.0), 42);
        // A zero ratio is treated as 1.0 instead of dividing by zero.
        assert_eq!(reconstruct_score(42, 0.0), 42);
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let body = r#"{"data":{"children":[{"data":{"id":"x1"}}]}}"#;
        let items = parse_listing(body).unwrap();
        assert_eq!(items.len(), 1);
        let it = &items[0];
        assert_eq!(it.title, "No Title");
        assert_eq!(it.score, 0);
        assert_eq!(it.permalink, "");
        assert_eq!(it.created_at, 0);
        assert_eq!(it.ratio, 1.0);
        assert!(!it.has_vote_breakdown);
        assert_eq!(it.media, MediaRef::None);
    }

    #[test]
    fn mistyped_fields_fall_back_instead_of_failing() {
        let body = r#"{"data":{"children":[
            {"data":{"id":"a","title":7,"score":"lots","created_utc":"yesterday","is_video":"no"}},
            "not an object",
            {"data":{"title":"no id here"}},
            {"data":{"id":"b","score":12.0,"created_utc":1700000000.0}}
        ]}}"#;
        let items = parse_listing(body).unwrap();
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(items[0].title, "No Title");
        assert_eq!(items[0].score, 0);
        assert_eq!(items[1].score, 12);
        assert_eq!(items[1].created_at, 1_700_000_000);
    }

    #[test]
    fn hidden_score_is_reconstructed() {
        let body = r#"{"data":{"children":[
            {"data":{"id":"h","score":1,"hide_score":true,"ups":900,"upvote_ratio":0.9}}
        ]}}"#;
        let items = parse_listing(body).unwrap();
        assert_eq!(items[0].score, 800);
        assert!(items[0].has_vote_breakdown);
        assert_eq!(items[0].upvoted_percent(), Some(90));
    }

    #[test]
    fn flair_text_then_richtext() {
        let seg = |e: &str, t: Option<&str>, a: Option<&str>| FlairSegment {
            e: Some(e.to_string()),
            t: t.map(str::to_string),
            a: a.map(str::to_string),
        };
        let rich = vec![
            seg("emoji", None, Some(":snoo:")),
            seg("text", Some(" Discussion"), None),
        ];
        assert_eq!(
            resolve_flair(Some("Plain"), &rich).as_deref(),
            Some("Plain")
        );
        assert_eq!(
            resolve_flair(Some("   "), &rich).as_deref(),
            Some(":snoo: Discussion")
        );
        assert_eq!(resolve_flair(None, &[]), None);
    }

    #[test]
    fn preview_skips_images_without_a_source_url() {
        let body = r#"{"data":{"children":[{"data":{"id":"p","preview":{"images":[
            {"source":{"width":640}},
            {"source":{"url":"https://preview.redd.it/second.png?s=1"}}
        ]}}}]}}"#;
        let items = parse_listing(body).unwrap();
        assert_eq!(
            items[0].media,
            MediaRef::Image {
                url: "https://preview.redd.it/second.png?s=1".into()
            }
        );
    }

    #[test]
    fn not_json_is_an_error() {
        assert!(parse_listing("<html>rate limited</html>").is_err());
    }
}
