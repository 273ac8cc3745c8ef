//! Media URL helpers: YouTube id extraction and thumbnail derivation,
//! upload size limits, and Media Host asset-key parsing.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Largest file accepted by the upload flow (100 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Base URL for derived YouTube thumbnails.
const YOUTUBE_THUMBNAIL_BASE: &str = "https://img.youtube.com/vi";

/// Matches the video id in every YouTube URL shape the upload form accepts:
/// `youtu.be/ID`, `watch?v=ID`, `/embed/ID`, `/v/ID` and `/shorts/ID`.
static YOUTUBE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.|m\.|music\.)?(?:youtu\.be/|youtube(?:-nocookie)?\.com/(?:watch\?(?:[^#]*&)?v=|embed/|v/|shorts/|live/))([A-Za-z0-9_-]+)",
    )
    .expect("valid regex")
});

/// A version segment in a Media Host delivery path, e.g. `v1712345678`.
static VERSION_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v\d+$").expect("valid regex"));

/// A transformation segment, e.g. `c_fill,w_300` or `q_auto`.
static TRANSFORMATION_SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]{1,3}_[^,/]+(?:,[a-z]{1,3}_[^,/]+)*$").expect("valid regex")
});

/// Delivery types that precede the asset path.
const DELIVERY_TYPES: &[&str] = &["upload", "authenticated", "private"];

// ---------------------------------------------------------------------------
// URL shape checks
// ---------------------------------------------------------------------------

/// Whether `url` is an absolute `http://` or `https://` URL with a host.
pub fn is_absolute_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            !host.is_empty() && !url.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Whether `thumbnail` can be rendered: an absolute URL, or an inline image
/// captured client-side from an uploaded video frame.
pub fn is_resolvable_thumbnail(thumbnail: &str) -> bool {
    is_absolute_http_url(thumbnail) || thumbnail.starts_with("data:image/")
}

// ---------------------------------------------------------------------------
// YouTube
// ---------------------------------------------------------------------------

/// Extract the video id from a YouTube URL.
pub fn youtube_video_id(url: &str) -> Option<&str> {
    YOUTUBE_ID_RE
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Derive the preview image URL for a YouTube link.
///
/// Fails with a validation error when the link is not a recognisable
/// YouTube URL.
pub fn youtube_thumbnail_url(url: &str) -> Result<String, CoreError> {
    let id = youtube_video_id(url)
        .ok_or_else(|| CoreError::Validation(format!("Invalid YouTube URL: '{url}'")))?;
    Ok(format!("{YOUTUBE_THUMBNAIL_BASE}/{id}/maxresdefault.jpg"))
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

/// Reject files above [`MAX_UPLOAD_BYTES`] and empty files.
pub fn validate_upload_size(size_bytes: u64) -> Result<(), CoreError> {
    if size_bytes == 0 {
        return Err(CoreError::Validation("Uploaded file is empty".into()));
    }
    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(CoreError::Validation(
            "File size must be less than 100MB".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Hosted asset keys
// ---------------------------------------------------------------------------

/// Storage key of an asset on the Media Host, parsed from its delivery URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedAssetKey {
    pub cloud_name: String,
    /// `image`, `video` or `raw`.
    pub resource_type: String,
    /// Folder-qualified asset id without file extension.
    pub public_id: String,
}

impl HostedAssetKey {
    /// Parse a delivery URL of the form
    /// `https://host/{cloud}/{resource_type}/upload/[transforms/][v123/]{public_id}.{ext}`.
    ///
    /// Returns `None` when the URL does not follow that layout.
    pub fn from_url(url: &str) -> Option<Self> {
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))?;
        let rest = rest.split(['?', '#']).next()?;
        let mut segments = rest.split('/').filter(|s| !s.is_empty());
        let _host = segments.next()?;
        let segments: Vec<&str> = segments.collect();

        let delivery_idx = segments
            .iter()
            .position(|s| DELIVERY_TYPES.contains(s))?;
        if delivery_idx < 2 {
            return None;
        }
        let cloud_name = segments[delivery_idx - 2];
        let resource_type = segments[delivery_idx - 1];
        let after = &segments[delivery_idx + 1..];

        let asset_path: &[&str] = match after
            .iter()
            .position(|s| VERSION_SEGMENT_RE.is_match(s))
        {
            Some(version_idx) => &after[version_idx + 1..],
            None => {
                // The final segment is always the asset itself.
                let skip = after[..after.len().saturating_sub(1)]
                    .iter()
                    .take_while(|s| TRANSFORMATION_SEGMENT_RE.is_match(s))
                    .count();
                &after[skip..]
            }
        };

        let (last, folders) = asset_path.split_last()?;
        let stem = match last.rsplit_once('.') {
            Some((stem, _ext)) if !stem.is_empty() => stem,
            _ => last,
        };

        let mut public_id = folders.join("/");
        if !public_id.is_empty() {
            public_id.push('/');
        }
        public_id.push_str(stem);

        Some(Self {
            cloud_name: cloud_name.to_string(),
            resource_type: resource_type.to_string(),
            public_id,
        })
    }
}
