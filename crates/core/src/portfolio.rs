//! Portfolio record model, create/patch DTOs and the Record Store row shape.
//!
//! [`PortfolioRecord`] is the store-owned entity. Its media field is the
//! [`MediaReference`] enum so that "exactly one media reference" holds by
//! construction; on the wire the Record Store keeps the two nullable columns
//! `youtube_url` / `cloudinary_url` plus an `upload_type` tag, and
//! [`PortfolioRow`] converts between the two shapes.

use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::media;
use crate::types::{RecordId, Timestamp};

/// Record Store table holding portfolio rows.
pub const PORTFOLIO_TABLE: &str = "portfolio_items";

// ---------------------------------------------------------------------------
// Media reference
// ---------------------------------------------------------------------------

/// How a record's media was provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadType {
    /// External video link (YouTube).
    Link,
    /// Binary asset uploaded to the Media Host.
    File,
}

/// The single media reference carried by a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "url", rename_all = "lowercase")]
pub enum MediaReference {
    /// External video link, e.g. `https://youtu.be/abc`.
    Link(String),
    /// Durable URL of an asset stored on the Media Host.
    Hosted(String),
}

impl MediaReference {
    pub fn url(&self) -> &str {
        match self {
            Self::Link(url) | Self::Hosted(url) => url,
        }
    }

    pub fn upload_type(&self) -> UploadType {
        match self {
            Self::Link(_) => UploadType::Link,
            Self::Hosted(_) => UploadType::File,
        }
    }

    /// Whether deleting the record should also clean up a Media Host asset.
    pub fn is_hosted(&self) -> bool {
        matches!(self, Self::Hosted(_))
    }
}

// ---------------------------------------------------------------------------
// PortfolioRecord
// ---------------------------------------------------------------------------

/// A persisted showcase entry owned by the Record Store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PortfolioRow", into = "PortfolioRow")]
pub struct PortfolioRecord {
    pub id: RecordId,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub media: MediaReference,
    pub thumbnail: String,
    pub views: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PortfolioRecord {
    pub fn upload_type(&self) -> UploadType {
        self.media.upload_type()
    }
}

/// Wire shape of a `portfolio_items` row as the Record Store returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioRow {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: RecordId,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub youtube_url: Option<String>,
    #[serde(default)]
    pub cloudinary_url: Option<String>,
    pub thumbnail: String,
    #[serde(default)]
    pub views: Option<String>,
    pub upload_type: UploadType,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<PortfolioRow> for PortfolioRecord {
    type Error = CoreError;

    fn try_from(row: PortfolioRow) -> Result<Self, Self::Error> {
        let link = non_blank(row.youtube_url);
        let hosted = non_blank(row.cloudinary_url);

        // The populated column decides; `upload_type` is derived from it.
        let media = match (link, hosted) {
            (Some(url), None) => MediaReference::Link(url),
            (None, Some(url)) => MediaReference::Hosted(url),
            (Some(_), Some(_)) => {
                return Err(CoreError::Validation(format!(
                    "Record {} has both a video link and a hosted media URL",
                    row.id
                )))
            }
            (None, None) => {
                return Err(CoreError::Validation(format!(
                    "Record {} has no media reference",
                    row.id
                )))
            }
        };

        Ok(Self {
            id: row.id,
            title: row.title,
            category: row.category,
            description: non_blank(row.description),
            media,
            thumbnail: row.thumbnail,
            views: non_blank(row.views),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<PortfolioRecord> for PortfolioRow {
    fn from(record: PortfolioRecord) -> Self {
        let upload_type = record.upload_type();
        let (youtube_url, cloudinary_url) = split_media(record.media);
        Self {
            id: record.id,
            title: record.title,
            category: record.category,
            description: record.description,
            youtube_url,
            cloudinary_url,
            thumbnail: record.thumbnail,
            views: record.views,
            upload_type,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Hosted databases expose either UUID or BIGSERIAL keys; accept both.
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<RecordId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Create candidate
// ---------------------------------------------------------------------------

/// A candidate record submitted by the upload flow.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewPortfolioItem {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 64))]
    pub category: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub media: MediaReference,
    pub thumbnail: String,
    #[validate(length(max = 64))]
    pub views: Option<String>,
}

impl NewPortfolioItem {
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        media: MediaReference,
        thumbnail: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            description: None,
            media,
            thumbnail: thumbnail.into(),
            views: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_views(mut self, views: impl Into<String>) -> Self {
        self.views = Some(views.into());
        self
    }

    /// Trim every text field and collapse blank optionals to `None`.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            category: self.category.trim().to_string(),
            description: non_blank(self.description),
            media: match self.media {
                MediaReference::Link(url) => MediaReference::Link(url.trim().to_string()),
                MediaReference::Hosted(url) => MediaReference::Hosted(url.trim().to_string()),
            },
            thumbnail: self.thumbnail.trim().to_string(),
            views: non_blank(self.views),
        }
    }

    /// Check the persisted-record invariants before anything is written.
    ///
    /// Call on a [`normalized`](Self::normalized) candidate.
    pub fn validate_candidate(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(format!("Invalid portfolio item: {e}")))?;

        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("Title must not be blank".into()));
        }
        if self.category.trim().is_empty() {
            return Err(CoreError::Validation("Category must not be blank".into()));
        }
        if !media::is_absolute_http_url(self.media.url()) {
            return Err(CoreError::Validation(format!(
                "Media URL must be an absolute http(s) URL, got '{}'",
                self.media.url()
            )));
        }
        if !media::is_resolvable_thumbnail(&self.thumbnail) {
            return Err(CoreError::Validation(
                "Thumbnail must be an http(s) URL or an inline image".into(),
            ));
        }
        Ok(())
    }

    /// JSON body for the Record Store insert call.
    pub fn to_insert_row(&self) -> NewPortfolioRow {
        let (youtube_url, cloudinary_url) = split_media(self.media.clone());
        NewPortfolioRow {
            title: self.title.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            youtube_url,
            cloudinary_url,
            thumbnail: self.thumbnail.clone(),
            views: self.views.clone(),
            upload_type: self.media.upload_type(),
        }
    }
}

/// Insert payload; `id` and timestamps are assigned by the Record Store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPortfolioRow {
    pub title: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloudinary_url: Option<String>,
    pub thumbnail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<String>,
    pub upload_type: UploadType,
}

// ---------------------------------------------------------------------------
// Partial update
// ---------------------------------------------------------------------------

/// Admin edit payload. Media fields are immutable after creation and so are
/// not representable here.
///
/// A blank `description` or `views` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 64))]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 64))]
    pub views: Option<String>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.views.is_none()
    }

    pub fn validate_patch(&self) -> Result<(), CoreError> {
        if self.is_empty() {
            return Err(CoreError::Validation("Update has no fields".into()));
        }
        self.validate()
            .map_err(|e| CoreError::Validation(format!("Invalid update: {e}")))?;
        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            return Err(CoreError::Validation("Title must not be blank".into()));
        }
        if matches!(&self.category, Some(c) if c.trim().is_empty()) {
            return Err(CoreError::Validation("Category must not be blank".into()));
        }
        Ok(())
    }

    /// JSON body for the Record Store update call, including a refreshed
    /// `updated_at`.
    pub fn to_update_body(&self, now: Timestamp) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        if let Some(title) = &self.title {
            body.insert("title".into(), title.trim().into());
        }
        if let Some(category) = &self.category {
            body.insert("category".into(), category.trim().into());
        }
        if let Some(description) = &self.description {
            body.insert("description".into(), nullable(description));
        }
        if let Some(views) = &self.views {
            body.insert("views".into(), nullable(views));
        }
        body.insert("updated_at".into(), serde_json::json!(now));
        serde_json::Value::Object(body)
    }

    /// Apply the patch in place. Used by stores that hold records directly.
    pub fn apply_to(&self, record: &mut PortfolioRecord, now: Timestamp) {
        if let Some(title) = &self.title {
            record.title = title.trim().to_string();
        }
        if let Some(category) = &self.category {
            record.category = category.trim().to_string();
        }
        if let Some(description) = &self.description {
            record.description = non_blank(Some(description.clone()));
        }
        if let Some(views) = &self.views {
            record.views = non_blank(Some(views.clone()));
        }
        record.updated_at = now;
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn nullable(value: &str) -> serde_json::Value {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        serde_json::Value::Null
    } else {
        trimmed.into()
    }
}

fn split_media(media: MediaReference) -> (Option<String>, Option<String>) {
    match media {
        MediaReference::Link(url) => (Some(url), None),
        MediaReference::Hosted(url) => (None, Some(url)),
    }
}
