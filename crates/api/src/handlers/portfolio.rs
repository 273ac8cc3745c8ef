//! Handlers for the `/portfolio` resource.
//!
//! Every handler here sits behind the admin gate. A mutation that succeeds
//! publishes on the server's refresh context so open browser contexts
//! re-fetch the catalog.

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use creativestalk_core::catalog::{ensure_mutable, is_read_only};
use creativestalk_core::categories::resolve_category;
use creativestalk_core::error::CoreError;
use creativestalk_core::export::{backup_filename, backup_json};
use creativestalk_core::media::youtube_thumbnail_url;
use creativestalk_core::portfolio::{MediaReference, NewPortfolioItem, PortfolioRecord, RecordPatch};
use creativestalk_core::types::RecordId;
use creativestalk_store::{DeletionOutcome, MediaUpload};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::admin::AdminUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of the link-item form.
#[derive(Debug, Deserialize)]
pub struct AddLinkRequest {
    pub title: String,
    /// One of the suggested categories (or any existing one).
    pub category: Option<String>,
    /// A new category; overrides `category` when non-blank.
    pub custom_category: Option<String>,
    pub description: Option<String>,
    pub youtube_url: String,
    /// Explicit thumbnail; derived from the YouTube video id when absent.
    pub thumbnail: Option<String>,
    pub views: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateResult {
    pub id: RecordId,
    pub updated: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteResult {
    pub id: RecordId,
    #[serde(flatten)]
    pub outcome: DeletionOutcome,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<RecordId>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub succeeded: Vec<RecordId>,
    pub failed: Vec<RecordId>,
    /// Built-in entries, which cannot be deleted.
    pub skipped: Vec<RecordId>,
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/v1/portfolio
///
/// Add a YouTube link item.
pub async fn add_link_item(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(body): Json<AddLinkRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<PortfolioRecord>>)> {
    let category = resolve_category(body.category.as_deref(), body.custom_category.as_deref())?;
    let derived = youtube_thumbnail_url(&body.youtube_url)?;
    let thumbnail = non_blank(body.thumbnail).unwrap_or(derived);

    let mut candidate = NewPortfolioItem::new(
        body.title,
        category,
        MediaReference::Link(body.youtube_url),
        thumbnail,
    );
    if let Some(description) = body.description {
        candidate = candidate.with_description(description);
    }
    if let Some(views) = body.views {
        candidate = candidate.with_views(views);
    }

    let record = state.access.add(candidate).await?;
    state.announce_change();
    Ok((StatusCode::CREATED, Json(DataResponse::new(record))))
}

/// Text fields collected from the upload form.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<MediaUpload>,
    title: Option<String>,
    category: Option<String>,
    custom_category: Option<String>,
    description: Option<String>,
    views: Option<String>,
    thumbnail: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
        {
            let name = field.name().map(str::to_string).unwrap_or_default();
            if name == "file" {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file: {e}")))?;
                let mut upload = MediaUpload::new(bytes.to_vec(), filename);
                if let Some(content_type) = content_type {
                    upload = upload.with_content_type(content_type);
                }
                form.file = Some(upload);
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Invalid field '{name}': {e}")))?;
            let slot = match name.as_str() {
                "title" => &mut form.title,
                "category" => &mut form.category,
                "custom_category" => &mut form.custom_category,
                "description" => &mut form.description,
                "views" => &mut form.views,
                "thumbnail" => &mut form.thumbnail,
                other => {
                    tracing::debug!(field = %other, "Ignoring unknown upload field");
                    continue;
                }
            };
            *slot = Some(value);
        }
        Ok(form)
    }
}

/// POST /api/v1/portfolio/upload
///
/// Multipart form: `file` plus `title`, `category` / `custom_category`,
/// and optional `description`, `views` and `thumbnail`. The file goes to
/// the Media Host first; the record is written only if that succeeds.
pub async fn upload_item(
    _admin: AdminUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<PortfolioRecord>>)> {
    let form = UploadForm::read(multipart).await?;

    let upload = form
        .file
        .ok_or_else(|| CoreError::Validation("A file is required".into()))?;
    let title = non_blank(form.title)
        .ok_or_else(|| CoreError::Validation("Title is required".into()))?;
    let category = resolve_category(form.category.as_deref(), form.custom_category.as_deref())?;

    let asset = state.access.upload_media(upload).await?;

    let thumbnail = non_blank(form.thumbnail)
        .or_else(|| asset.thumbnail_url.clone())
        .unwrap_or_else(|| asset.secure_url.clone());
    let mut candidate = NewPortfolioItem::new(
        title,
        category,
        MediaReference::Hosted(asset.secure_url.clone()),
        thumbnail,
    );
    if let Some(description) = form.description {
        candidate = candidate.with_description(description);
    }
    if let Some(views) = form.views {
        candidate = candidate.with_views(views);
    }

    let record = match state.access.add(candidate).await {
        Ok(record) => record,
        Err(e) => {
            state.access.discard_media(&asset).await;
            return Err(e.into());
        }
    };
    state.announce_change();
    Ok((StatusCode::CREATED, Json(DataResponse::new(record))))
}

// ---------------------------------------------------------------------------
// Update / delete
// ---------------------------------------------------------------------------

/// PATCH /api/v1/portfolio/{id}
///
/// Edit title, category, description or views. Built-in entries are
/// rejected with 403; an unknown id is 404. A database record that reuses a
/// built-in id is editable.
pub async fn update_item(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(patch): Json<RecordPatch>,
) -> AppResult<Json<DataResponse<UpdateResult>>> {
    reject_builtin(&state, &id).await?;

    if !state.access.try_update(&id, &patch).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "PortfolioItem",
            id,
        }));
    }

    state.announce_change();
    Ok(Json(DataResponse::new(UpdateResult { id, updated: true })))
}

/// DELETE /api/v1/portfolio/{id}
///
/// Succeeds only once the record is confirmed absent. Deleting an id that
/// does not exist succeeds with outcome `already_absent`.
pub async fn delete_item(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> AppResult<Json<DataResponse<DeleteResult>>> {
    reject_builtin(&state, &id).await?;

    let outcome = state.access.remove_detailed(&id).await;
    if !outcome.is_success() {
        return Err(AppError::Deletion { id, outcome });
    }

    if outcome == DeletionOutcome::Deleted {
        state.announce_change();
    }
    Ok(Json(DataResponse::new(DeleteResult { id, outcome })))
}

/// POST /api/v1/portfolio/bulk-delete
///
/// Remove several records in turn. Built-in ids are reported as `skipped`;
/// every other id ends up in exactly one of `succeeded` or `failed`.
pub async fn bulk_delete(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(body): Json<BulkDeleteRequest>,
) -> AppResult<Json<DataResponse<BulkDeleteResponse>>> {
    if body.ids.is_empty() {
        return Err(AppError::BadRequest("ids must not be empty".into()));
    }

    let merged = state.catalog.get_merged().await;
    let (skipped, removable): (Vec<RecordId>, Vec<RecordId>) = body
        .ids
        .into_iter()
        .partition(|id| is_read_only(&merged, id));

    let removal = state.access.bulk_remove(&removable).await;
    if !removal.succeeded.is_empty() {
        state.announce_change();
    }

    Ok(Json(DataResponse::new(BulkDeleteResponse {
        succeeded: removal.succeeded,
        failed: removal.failed,
        skipped,
    })))
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// GET /api/v1/portfolio/export
///
/// Download every record plus the built-in entries as
/// `portfolio-backup-YYYY-MM-DD.json`. Test data is not filtered out.
pub async fn export_backup(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let entries = state.catalog.get_complete().await;
    let now = Utc::now();
    let body = backup_json(&entries, now)?;
    let filename = backup_filename(now.date_naive());

    tracing::info!(count = entries.len(), %filename, "Portfolio backup exported");
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Built-in entries live in the binary and cannot be edited or deleted.
async fn reject_builtin(state: &AppState, id: &str) -> Result<(), CoreError> {
    match state.catalog.find(id).await {
        Some(entry) => ensure_mutable(&entry),
        None => Ok(()),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
