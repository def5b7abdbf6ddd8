use std::pin::Pin;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Duration;
use futures_util::Stream;

use crate::mail::MailMessage;

/// Byte stream handed back by blob fetches, boxed so callers never see a
/// concrete store's reader type.
pub type BlobStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + 'static>>;

/// Password hashing and checking, injected so tests can swap the (slow)
/// production hasher for a plain-text fake.
pub trait CredentialVerifier: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;

    /// `Ok(false)` on mismatch; errors are reserved for malformed hashes.
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Argon2id-backed verifier used outside tests.
pub struct ArgonVerifier;

impl CredentialVerifier for ArgonVerifier {
    fn hash(&self, password: &str) -> Result<String> {
        stratus_crypto::password::hash_password(password)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        stratus_crypto::password::verify_password(password, hash)
    }
}

/// Content storage keyed by opaque blob keys.
///
/// File metadata lives in the database; a blob store only ever sees bytes
/// under a key the registry picked for it.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, data: Bytes) -> Result<()>;

    /// `Ok(None)` when the key holds nothing.
    async fn get(&self, key: &str) -> Result<Option<BlobStream>>;

    /// Removing an already-absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Time-limited URL through which `key` can be fetched without a
    /// session.
    fn presign(&self, key: &str, ttl: Duration) -> Result<String>;
}

/// Outbound mail transport. Callers decide whether a failed send is fatal;
/// implementations report it and never panic.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, mail: &MailMessage) -> Result<()>;
}
