//! Persistent set of post ids that were already relayed.
//!
//! The file is a flat JSON array of strings. A missing file is the normal
//! first-run state. A corrupt one is logged and treated as empty, so old posts
//! may be sent again.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;

pub const DEFAULT_PATH: &str = "state/sent_posts.json";

/// Ids delivered so far. Ids are only ever added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupSet {
    ids: BTreeSet<String>,
    changed: bool,
}

impl DedupSet {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns true if the id was new.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let fresh = self.ids.insert(id.into());
        self.changed |= fresh;
        fresh
    }

    /// True once anything was added since load.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for DedupSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
            changed: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DedupStore {
    path: PathBuf,
}

impl DedupStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> DedupSet {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no dedup file yet, starting empty");
                return DedupSet::default();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "dedup file unreadable, starting empty");
                return DedupSet::default();
            }
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => {
                let set: DedupSet = ids.into_iter().collect();
                tracing::debug!(path = %self.path.display(), ids = set.len(), "dedup set loaded");
                set
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "dedup file corrupt, starting empty");
                DedupSet::default()
            }
        }
    }

    /// Write the whole set, sorted. Goes through a sibling temp file and a
    /// rename so a crash mid-write leaves the previous file intact.
    pub async fn persist(&self, set: &DedupSet) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let ids: Vec<&str> = set.iter().collect();
        let body = serde_json::to_vec_pretty(&ids).context("serializing dedup set")?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, body)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    /// Persist only if the set changed. Failures are logged, not returned:
    /// the worst case is a repeat delivery next run.
    pub async fn commit(&self, set: &DedupSet) {
        if !set.is_changed() {
            tracing::debug!("dedup set unchanged, not writing");
            return;
        }
        match self.persist(set).await {
            Ok(()) => tracing::info!(path = %self.path.display(), ids = set.len(), "dedup set saved"),
            Err(e) => tracing::warn!(path = %self.path.display(), error = ?e, "saving dedup set failed"),
        }
    }
}
