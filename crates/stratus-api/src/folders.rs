use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use stratus_types::api::{Claims, CreateFolderRequest, RenameRequest};
use stratus_types::models::Folder;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Absent or empty: the root level. Set: children of that folder.
    #[serde(default, deserialize_with = "crate::empty_as_none")]
    pub parent: Option<Uuid>,
}

/// POST /folders — creates a folder, at the root unless a parent is given.
pub async fn create_folder(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateFolderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("folder name is required"));
    }

    let folder = state
        .folders
        .create_folder(claims.sub, name, req.parent_id)?;
    Ok((StatusCode::CREATED, Json(folder)))
}

/// GET /folders?parent={id} — one level of the caller's tree.
pub async fn list_folders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Folder>>, ApiError> {
    let folders = state.folders.list_folders(claims.sub, query.parent)?;
    Ok(Json(folders))
}

/// PATCH /folders/{id} — rename. A missing or empty name keeps the current
/// one.
pub async fn rename_folder(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<Folder>, ApiError> {
    let folder = state
        .folders
        .rename_folder(claims.sub, id, req.name.as_deref().map(str::trim))?;
    Ok(Json(folder))
}

/// DELETE /folders/{id} — removes the folder record only; its contents are
/// deliberately left alone.
pub async fn delete_folder(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.folders.delete_folder(claims.sub, id)?;
    Ok(StatusCode::NO_CONTENT)
}
