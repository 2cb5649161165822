// src/config/sources.rs
use anyhow::{anyhow, bail, Context, Result};

use crate::ingest::types::SourceSpec;

/// Parse `"rust, programming:500, r/linux"` into specs, keeping the written
/// order. Entries without `:threshold` get `default_threshold`. Blank entries
/// are ignored; a repeated name keeps its first occurrence.
pub fn parse_sources(raw: &str, default_threshold: i64) -> Result<Vec<SourceSpec>> {
    let mut out: Vec<SourceSpec> = Vec::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let (name, threshold) = match entry.split_once(':') {
            Some((name, t)) => {
                let t = t.trim();
                let threshold = t
                    .parse::<i64>()
                    .with_context(|| format!("invalid threshold {t:?} for source {name:?}"))?;
                (name, threshold)
            }
            None => (entry, default_threshold),
        };

        let name = name.trim();
        let name = name
            .strip_prefix("/r/")
            .or_else(|| name.strip_prefix("r/"))
            .unwrap_or(name)
            .trim_end_matches('/');
        if name.is_empty() {
            bail!("empty source name in entry {entry:?}");
        }
        if name.contains(['/', '?', '#', ' ']) {
            return Err(anyhow!("invalid source name {name:?}"));
        }

        if out.iter().any(|s| s.name.eq_ignore_ascii_case(name)) {
            tracing::warn!(source = name, "duplicate source ignored");
            continue;
        }
        out.push(SourceSpec::new(name, threshold));
    }

    if out.is_empty() {
        bail!("source list is empty");
    }
    Ok(out)
}
