// src/ingest/types.rs

/// What kind of media a post carries, and the URL to show for it when there is one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MediaRef {
    #[default]
    None,
    Image {
        url: String,
    },
    /// `url` is `None` when only the `is_video` flag was known.
    Video {
        url: Option<String>,
    },
    /// Multi-image post; no single embeddable URL.
    Gallery,
}

impl MediaRef {
    pub fn icon(&self) -> Option<&'static str> {
        match self {
            MediaRef::Video { .. } => Some("🎬"),
            MediaRef::Gallery => Some("📸"),
            MediaRef::None | MediaRef::Image { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateItem {
    pub id: String,
    pub title: String,
    pub score: i64,
    pub upvotes: u64,
    /// Upvote ratio in (0, 1]; 1.0 when the source reported nothing usable.
    pub ratio: f64,
    /// True when both `ups` and `upvote_ratio` came from the source.
    pub has_vote_breakdown: bool,
    pub permalink: String,
    pub created_at: i64, // unix seconds
    pub flair: Option<String>,
    pub media: MediaRef,
}

impl CandidateItem {
    /// Minimal item for tests and tooling; vote stats unknown, no media.
    pub fn new(id: impl Into<String>, title: impl Into<String>, score: i64, created_at: i64) -> Self {
        let id = id.into();
        Self {
            permalink: format!("/comments/{id}/"),
            id,
            title: title.into(),
            score,
            upvotes: score.max(0) as u64,
            ratio: 1.0,
            has_vote_breakdown: false,
            created_at,
            flair: None,
            media: MediaRef::None,
        }
    }

    /// Rounded upvote percentage, only when the source gave a real breakdown.
    pub fn upvoted_percent(&self) -> Option<u32> {
        self.has_vote_breakdown
            .then(|| (self.ratio * 100.0).round().clamp(0.0, 100.0) as u32)
    }
}

/// One configured source and the score a post needs to be relayed from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub name: String,
    pub score_threshold: i64,
}

impl SourceSpec {
    pub fn new(name: impl Into<String>, score_threshold: i64) -> Self {
        Self {
            name: name.into(),
            score_threshold,
        }
    }
}

/// A ranked-content feed. Implementations swallow their own faults: a broken
/// source just yields nothing for this run.
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch(&self, source: &str, limit: usize) -> Vec<CandidateItem>;
    fn name(&self) -> &'static str;
}
