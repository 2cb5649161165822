//! Media classification for Reddit posts.
//!
//! Precedence is fixed: gallery, then video, then a direct image link, then
//! the preview image, then nothing. Extension checks look only at the URL path
//! (query string and fragment are ignored) and are case-insensitive.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::types::MediaRef;

static RE_VIDEO_EXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(mp4|webm|mov|mkv|gifv)$").expect("static regex"));
static RE_IMAGE_EXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(jpe?g|png|gif|webp)$").expect("static regex"));

const VIDEO_HOSTS: &[&str] = &[
    "v.redd.it",
    "youtube.com",
    "youtu.be",
    "streamable.com",
    "vimeo.com",
    "clips.twitch.tv",
];

const GALLERY_MARKER: &str = "/gallery/";

/// Everything the classifier looks at, already pulled out of the raw post.
#[derive(Debug, Default, Clone, Copy)]
pub struct MediaHints<'a> {
    /// `url_overridden_by_dest`, falling back to `url`.
    pub url: Option<&'a str>,
    pub is_video: bool,
    pub is_gallery: bool,
    /// `media.reddit_video.fallback_url`
    pub video_url: Option<&'a str>,
    /// First `preview.images[].source.url`, still HTML-escaped.
    pub preview_url: Option<&'a str>,
}

pub fn classify(hints: &MediaHints<'_>) -> MediaRef {
    let url = hints.url.map(str::trim).filter(|u| !u.is_empty());

    if hints.is_gallery || url.is_some_and(|u| u.contains(GALLERY_MARKER)) {
        return MediaRef::Gallery;
    }

    let url_is_video = url.is_some_and(|u| has_video_ext(u) || is_video_host(u));
    if hints.is_video || url_is_video {
        let resolved = hints
            .video_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .or(url.filter(|_| url_is_video))
            .map(str::to_string);
        return MediaRef::Video { url: resolved };
    }

    if let Some(u) = url.filter(|u| has_image_ext(u)) {
        return MediaRef::Image { url: u.to_string() };
    }

    if let Some(p) = hints.preview_url.map(str::trim).filter(|p| !p.is_empty()) {
        // Reddit escapes `&` in preview URLs; the signed query breaks otherwise.
        return MediaRef::Image {
            url: html_escape::decode_html_entities(p).into_owned(),
        };
    }

    MediaRef::None
}

fn url_path(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

fn has_video_ext(url: &str) -> bool {
    RE_VIDEO_EXT.is_match(url_path(url))
}

fn has_image_ext(url: &str) -> bool {
    RE_IMAGE_EXT.is_match(url_path(url))
}

fn is_video_host(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    VIDEO_HOSTS.iter().any(|h| lower.contains(h))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_url(url: &str) -> MediaHints<'_> {
        MediaHints {
            url: Some(url),
            ..Default::default()
        }
    }

    #[test]
    fn gallery_wins_over_everything() {
        let h = MediaHints {
            url: Some("https://i.redd.it/a.jpg"),
            is_gallery: true,
            is_video: true,
            ..Default::default()
        };
        assert_eq!(classify(&h), MediaRef::Gallery);
        assert_eq!(
            classify(&with_url("https://www.reddit.com/gallery/abc123")),
            MediaRef::Gallery
        );
    }

    #[test]
    fn video_flag_prefers_fallback_url() {
        let h = MediaHints {
            url: Some("https://v.redd.it/xyz"),
            is_video: true,
            video_url: Some("https://v.redd.it/xyz/DASH_720.mp4?source=fallback"),
            ..Default::default()
        };
        assert_eq!(
            classify(&h),
            MediaRef::Video {
                url: Some("https://v.redd.it/xyz/DASH_720.mp4?source=fallback".into())
            }
        );
    }

    #[test]
    fn video_flag_alone_has_no_url() {
        let h = MediaHints {
            url: Some("https://www.reddit.com/r/x/comments/1/"),
            is_video: true,
            ..Default::default()
        };
        assert_eq!(classify(&h), MediaRef::Video { url: None });
    }

    #[test]
    fn video_by_extension_or_host() {
        assert_eq!(
            classify(&with_url("https://i.imgur.com/clip.GIFV")),
            MediaRef::Video {
                url: Some("https://i.imgur.com/clip.GIFV".into())
            }
        );
        assert_eq!(
            classify(&with_url("https://youtu.be/dQw4w9WgXcQ")),
            MediaRef::Video {
                url: Some("https://youtu.be/dQw4w9WgXcQ".into())
            }
        );
    }

    #[test]
    fn image_extension_ignores_query() {
        assert_eq!(
            classify(&with_url("https://i.redd.it/pic.JPG?width=640")),
            MediaRef::Image {
                url: "https://i.redd.it/pic.JPG?width=640".into()
            }
        );
    }

    #[test]
    fn preview_fallback_unescapes_ampersands() {
        let h = MediaHints {
            url: Some("https://example.com/article"),
            preview_url: Some("https://preview.redd.it/p.png?width=1&amp;s=abc"),
            ..Default::default()
        };
        assert_eq!(
            classify(&h),
            MediaRef::Image {
                url: "https://preview.redd.it/p.png?width=1&s=abc".into()
            }
        );
    }

    #[test]
    fn plain_link_is_none() {
        assert_eq!(
            classify(&with_url("https://example.com/story.html")),
            MediaRef::None
        );
        assert_eq!(classify(&MediaHints::default()), MediaRef::None);
    }
}
