//! HTTP surface over the Stratus domain services.
//!
//! Handlers stay thin: extract, call a service, map `CoreError` to a status
//! code via [`error::ApiError`]. The router is built by [`router`] so the
//! server binary and the integration tests serve the exact same tree.

pub mod auth;
pub mod error;
pub mod files;
pub mod folders;
pub mod middleware;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use stratus_core::{AccountLifecycle, BlobStore, FileRegistry, HierarchyEngine};

/// Request body cap. Leaves multipart framing room above the 50 MB
/// per-file limit the upload handler enforces.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub accounts: AccountLifecycle,
    pub folders: HierarchyEngine,
    pub files: FileRegistry,
    pub blobs: Arc<dyn BlobStore>,
    pub jwt_secret: String,
    pub presign_secret: String,
}

/// Builds the full route tree around the given state.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/activate/{secret}", get(auth::activate))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/d/{handle}", get(files::presigned_download))
        .route("/health", get(health))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/auth/profile", get(auth::profile))
        .route("/folders", post(folders::create_folder))
        .route("/folders", get(folders::list_folders))
        .route("/folders/{id}", patch(folders::rename_folder))
        .route("/folders/{id}", delete(folders::delete_folder))
        .route("/files/upload", post(files::upload_file))
        .route("/files", get(files::list_files))
        .route("/files/{id}", patch(files::rename_file))
        .route("/files/{id}", delete(files::delete_file))
        .route("/files/{id}/download", get(files::download_file))
        .route("/files/{id}/download-url", get(files::download_url))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state);

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

/// GET /health — liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Treats `?parent=` the same as an absent parameter. Anything non-empty
/// must parse as a UUID or the whole query is rejected.
pub(crate) fn empty_as_none<'de, D>(de: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
