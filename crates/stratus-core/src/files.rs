use std::sync::Arc;

use bytes::Bytes;
use chrono::{Duration, Utc};
use uuid::Uuid;

use stratus_db::Database;
use stratus_types::models::FileEntry;

use crate::access;
use crate::capabilities::{BlobStore, BlobStream};
use crate::error::CoreError;

/// Presigned download links stay valid for one hour, independent of the
/// 24 hour account-token lifetime.
const DOWNLOAD_TTL_SECS: i64 = 3600;

fn download_ttl() -> Duration {
    Duration::seconds(DOWNLOAD_TTL_SECS)
}

/// File metadata plus the blob store holding the actual bytes.
///
/// The registry owns the split between the two worlds: metadata rows carry
/// name, folder, size, and an opaque `blob_key`; the store only ever sees
/// that key.
pub struct FileRegistry {
    db: Arc<Database>,
    blobs: Arc<dyn BlobStore>,
}

/// What a caller hands over when uploading.
pub struct NewFile {
    pub name: String,
    pub mime_type: String,
    pub folder_id: Option<Uuid>,
    pub data: Bytes,
}

impl FileRegistry {
    pub fn new(db: Arc<Database>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { db, blobs }
    }

    /// Writes the bytes to the blob store under a fresh key, then records the
    /// metadata row.
    ///
    /// The folder reference is stored exactly as given. Uploads never check
    /// that the folder exists or is the caller's; a stale or foreign id just
    /// files the entry under a level the caller will not see when browsing.
    pub async fn store(&self, owner: Uuid, upload: NewFile) -> Result<FileEntry, CoreError> {
        let blob_key = Uuid::new_v4().to_string();
        let size_bytes = upload.data.len() as u64;
        self.blobs.put(&blob_key, upload.data).await?;

        let entry = FileEntry {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: upload.name,
            blob_key,
            folder_id: upload.folder_id,
            size_bytes,
            mime_type: upload.mime_type,
            created_at: Utc::now(),
        };
        self.db.insert_file(&entry)?;
        Ok(entry)
    }

    /// One level of files: `None` is the root level, `Some(id)` the files
    /// filed under that folder.
    pub fn list(&self, owner: Uuid, folder_id: Option<Uuid>) -> Result<Vec<FileEntry>, CoreError> {
        Ok(self.db.list_files(owner, folder_id)?)
    }

    /// Renames a file; a missing or empty new name keeps the current one.
    pub fn rename(
        &self,
        actor: Uuid,
        file_id: Uuid,
        new_name: Option<&str>,
    ) -> Result<FileEntry, CoreError> {
        let entry = self
            .db
            .get_file(file_id)?
            .ok_or(CoreError::NotFound("file"))?;
        access::require_owner(&entry, actor)?;

        let name = match new_name {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => entry.name.clone(),
        };
        self.db.rename_file(file_id, &name)?;

        Ok(FileEntry { name, ..entry })
    }

    /// Deletes blob first, metadata second. If the store refuses the delete,
    /// the row stays and the caller can retry; the opposite order could
    /// orphan bytes nothing points at anymore.
    pub async fn delete(&self, actor: Uuid, file_id: Uuid) -> Result<(), CoreError> {
        let entry = self
            .db
            .get_file(file_id)?
            .ok_or(CoreError::NotFound("file"))?;
        access::require_owner(&entry, actor)?;

        self.blobs.delete(&entry.blob_key).await?;
        self.db.delete_file(file_id)?;
        Ok(())
    }

    /// Opens the blob for an authenticated streaming download. A metadata
    /// row whose blob has vanished is a store-side failure, not a 404: the
    /// registry said the file exists.
    pub async fn open(
        &self,
        actor: Uuid,
        file_id: Uuid,
    ) -> Result<(FileEntry, BlobStream), CoreError> {
        let entry = self
            .db
            .get_file(file_id)?
            .ok_or(CoreError::NotFound("file"))?;
        access::require_owner(&entry, actor)?;

        let stream = self.blobs.get(&entry.blob_key).await?.ok_or_else(|| {
            CoreError::Dependency(anyhow::anyhow!(
                "blob {} missing from store",
                entry.blob_key
            ))
        })?;
        Ok((entry, stream))
    }

    /// Hands out a presigned URL for the file's blob, valid for one hour.
    /// Whoever holds the URL can fetch the bytes without a session.
    pub fn download_url(&self, actor: Uuid, file_id: Uuid) -> Result<String, CoreError> {
        let entry = self
            .db
            .get_file(file_id)?
            .ok_or(CoreError::NotFound("file"))?;
        access::require_owner(&entry, actor)?;

        Ok(self.blobs.presign(&entry.blob_key, download_ttl())?)
    }
}
