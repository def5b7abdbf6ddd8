use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Duration;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};
use uuid::Uuid;

use stratus_core::capabilities::{BlobStore, BlobStream};

use crate::presign;

/// Flat-file blob store: every blob lives at `{dir}/{key}`.
///
/// Presigned URLs point at the server's own public download endpoint, with
/// the blob key sealed inside a signed handle.
pub struct DiskBlobStore {
    dir: PathBuf,
    public_url: String,
    presign_secret: String,
}

impl DiskBlobStore {
    pub async fn new(dir: PathBuf, public_url: String, presign_secret: String) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Blob storage directory: {}", dir.display());
        Ok(Self {
            dir,
            public_url,
            presign_secret,
        })
    }

    /// Keys are UUIDs minted by the registry; anything else is refused
    /// before it can name a path outside the storage directory.
    fn blob_path(&self, key: &str) -> Result<PathBuf> {
        let parsed: Uuid = key.parse().map_err(|_| anyhow!("invalid blob key"))?;
        Ok(self.dir.join(parsed.to_string()))
    }
}

#[async_trait]
impl BlobStore for DiskBlobStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let path = self.blob_path(key)?;
        fs::write(&path, &data)
            .await
            .with_context(|| format!("writing blob {key}"))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<BlobStream>> {
        let path = self.blob_path(key)?;
        match fs::File::open(&path).await {
            Ok(file) => Ok(Some(Box::pin(ReaderStream::new(file)) as BlobStream)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("opening blob {key}")),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.blob_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Blob {} already gone", key);
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("deleting blob {key}")),
        }
    }

    fn presign(&self, key: &str, ttl: Duration) -> Result<String> {
        let handle = presign::sign(&self.presign_secret, key, ttl)?;
        Ok(format!("{}/d/{}", self.public_url, handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;

    async fn store(dir: &tempfile::TempDir) -> DiskBlobStore {
        DiskBlobStore::new(
            dir.path().to_path_buf(),
            "http://localhost:4000".to_string(),
            "disk-test-secret".to_string(),
        )
        .await
        .unwrap()
    }

    fn key() -> String {
        Uuid::new_v4().to_string()
    }

    #[tokio::test]
    async fn put_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let key = key();

        store.put(&key, Bytes::from_static(b"on disk")).await.unwrap();

        let stream = store.get(&key).await.unwrap().unwrap();
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        assert_eq!(chunks.concat(), b"on disk");
    }

    #[tokio::test]
    async fn get_of_unknown_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        assert!(store.get(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_tolerant_of_missing_blobs() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let key = key();

        store.put(&key, Bytes::from_static(b"x")).await.unwrap();
        store.delete(&key).await.unwrap();
        assert!(store.get(&key).await.unwrap().is_none());

        // Second delete of the same key: nothing left to do, still fine.
        store.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn non_uuid_keys_never_touch_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        assert!(store.put("../escape", Bytes::from_static(b"x")).await.is_err());
        assert!(store.get("../../etc/passwd").await.is_err());
        assert!(store.delete("..").await.is_err());
    }

    #[tokio::test]
    async fn presigned_url_routes_through_the_download_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let key = key();

        let url = store.presign(&key, Duration::hours(1)).unwrap();
        let handle = url
            .strip_prefix("http://localhost:4000/d/")
            .expect("url should point at the public download route");
        assert_eq!(presign::verify("disk-test-secret", handle).unwrap(), key);
    }
}
