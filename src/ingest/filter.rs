// src/ingest/filter.rs
use crate::dedup::DedupSet;
use crate::ingest::types::{CandidateItem, SourceSpec};

/// Posts older than this (inclusive boundary) are not relayed.
pub const MAX_AGE_SECS: i64 = 24 * 3600;

/// Outcome of screening one candidate. Checks run in declaration order and the
/// first failing one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    AlreadySeen,
    Stale,
    BelowThreshold,
    Pass,
}

impl Screen {
    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::AlreadySeen => "already_seen",
            Screen::Stale => "stale",
            Screen::BelowThreshold => "below_threshold",
            Screen::Pass => "pass",
        }
    }
}

pub fn is_recent(item: &CandidateItem, now: i64) -> bool {
    now.saturating_sub(item.created_at) <= MAX_AGE_SECS
}

pub fn meets_threshold(item: &CandidateItem, spec: &SourceSpec) -> bool {
    item.score >= spec.score_threshold
}

/// Dedup → recency → threshold. The order is fixed.
pub fn screen(item: &CandidateItem, spec: &SourceSpec, seen: &DedupSet, now: i64) -> Screen {
    if seen.contains(&item.id) {
        Screen::AlreadySeen
    } else if !is_recent(item, now) {
        Screen::Stale
    } else if !meets_threshold(item, spec) {
        Screen::BelowThreshold
    } else {
        Screen::Pass
    }
}
