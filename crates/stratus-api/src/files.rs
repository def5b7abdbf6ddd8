use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use stratus_blob::presign;
use stratus_core::CoreError;
use stratus_core::files::NewFile;
use stratus_types::api::{Claims, DownloadUrlResponse, RenameRequest};
use stratus_types::models::FileEntry;

use crate::AppState;
use crate::error::ApiError;

/// 50 MB cap per uploaded file.
const MAX_FILE_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Absent or empty: files at the root level. Set: files in that folder.
    #[serde(default, deserialize_with = "crate::empty_as_none")]
    pub folder: Option<Uuid>,
}

/// POST /files/upload — multipart form with a `file` part and an optional
/// `folder` part carrying the target folder id.
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut folder_id: Option<Uuid> = None;
    let mut file: Option<(String, String, bytes::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("malformed multipart body"))?
    {
        let part = field.name().unwrap_or_default().to_string();
        match part.as_str() {
            "folder" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| ApiError::bad_request("could not read folder field"))?;
                if !value.is_empty() {
                    folder_id = Some(
                        value
                            .parse()
                            .map_err(|_| ApiError::bad_request("folder must be a UUID"))?,
                    );
                }
            }
            "file" => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::bad_request("could not read file contents"))?;
                file = Some((name, mime_type, data));
            }
            _ => {}
        }
    }

    let (name, mime_type, data) =
        file.ok_or_else(|| ApiError::bad_request("a `file` part is required"))?;
    if data.is_empty() {
        return Err(ApiError::bad_request("uploaded file is empty"));
    }
    if data.len() > MAX_FILE_BYTES {
        return Err(ApiError::PayloadTooLarge);
    }

    let entry = state
        .files
        .store(
            claims.sub,
            NewFile {
                name,
                mime_type,
                folder_id,
                data,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /files?folder={id} — one level of the caller's files.
pub async fn list_files(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<FileEntry>>, ApiError> {
    let files = state.files.list(claims.sub, query.folder)?;
    Ok(Json(files))
}

/// PATCH /files/{id} — rename. A missing or empty name keeps the current
/// one.
pub async fn rename_file(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<FileEntry>, ApiError> {
    let entry = state
        .files
        .rename(claims.sub, id, req.name.as_deref().map(str::trim))?;
    Ok(Json(entry))
}

/// DELETE /files/{id} — blob first, then the metadata row.
pub async fn delete_file(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.files.delete(claims.sub, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /files/{id}/download — authenticated streaming download.
pub async fn download_file(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let (entry, stream) = state.files.open(claims.sub, id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, entry.mime_type.clone()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", header_safe(&entry.name)),
            ),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// GET /files/{id}/download-url — a presigned link, valid for an hour.
pub async fn download_url(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<DownloadUrlResponse>, ApiError> {
    let url = state.files.download_url(claims.sub, id)?;
    Ok(Json(DownloadUrlResponse { url }))
}

/// GET /d/{handle} — presigned download; the only unauthenticated path to
/// file bytes. The handle names a blob, not a file record, so it keeps
/// working under renames and dies with the blob.
pub async fn presigned_download(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Response, ApiError> {
    let key = presign::verify(&state.presign_secret, &handle)
        .map_err(|_| ApiError::Core(CoreError::InvalidToken))?;

    let stream = state
        .blobs
        .get(&key)
        .await
        .map_err(CoreError::Dependency)?
        .ok_or(CoreError::NotFound("file"))?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from_stream(stream),
    )
        .into_response())
}

/// Filenames go into a quoted Content-Disposition value; strip anything
/// that would break out of the quotes or the header line.
fn header_safe(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '"' { '\'' } else { c })
        .collect()
}
