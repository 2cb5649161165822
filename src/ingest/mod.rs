// src/ingest/mod.rs
pub mod filter;
pub mod media;
pub mod providers;
pub mod types;

pub use filter::{is_recent, meets_threshold, screen, Screen};
pub use types::{CandidateItem, MediaRef, SourceProvider, SourceSpec};
