// src/notify/format.rs
use crate::ingest::types::CandidateItem;

/// Prefix that turns a permalink into a clickable post URL.
pub const POST_URL_PREFIX: &str = "https://www.reddit.com";

pub fn post_url(permalink: &str) -> String {
    if permalink.starts_with("http://") || permalink.starts_with("https://") {
        return permalink.to_string();
    }
    let sep = if permalink.starts_with('/') || permalink.is_empty() {
        ""
    } else {
        "/"
    };
    format!("{POST_URL_PREFIX}{sep}{permalink}")
}

/// Telegram HTML caption, one part per line:
/// title (with media icon), flair, link, vote stats.
pub fn caption(item: &CandidateItem) -> String {
    let title = html_escape::encode_text(&item.title);
    let mut lines = Vec::with_capacity(4);

    lines.push(match item.media.icon() {
        Some(icon) => format!("{icon} <b>{title}</b>"),
        None => format!("<b>{title}</b>"),
    });

    if let Some(flair) = &item.flair {
        lines.push(format!("🏷 {}", html_escape::encode_text(flair)));
    }

    let href = post_url(&item.permalink);
    lines.push(format!(
        "<a href=\"{}\">Open on Reddit</a>",
        html_escape::encode_double_quoted_attribute(&href)
    ));

    lines.push(match item.upvoted_percent() {
        Some(pct) => format!("👍 {} · {pct}% upvoted", item.score),
        None => format!("👍 {}", item.score),
    });

    lines.join("\n")
}
