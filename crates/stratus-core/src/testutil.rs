//! In-memory stand-ins for the capability traits, plus seed helpers.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use stratus_db::Database;
use stratus_types::models::{Token, TokenKind, User, UserStatus};

use crate::capabilities::{BlobStore, BlobStream, CredentialVerifier, Notifier};
use crate::mail::MailMessage;

pub fn memory_db() -> std::sync::Arc<Database> {
    std::sync::Arc::new(Database::open_in_memory().unwrap())
}

pub fn seed_user(db: &Database, email: &str, status: UserStatus) -> User {
    let user = User {
        id: Uuid::new_v4(),
        first_name: "Test".into(),
        last_name: "User".into(),
        email: email.into(),
        password_hash: "plain:password".into(),
        status,
        created_at: Utc::now(),
    };
    db.insert_user(&user).unwrap();
    user
}

pub fn seed_token(
    db: &Database,
    user_id: Uuid,
    kind: TokenKind,
    issued_at: DateTime<Utc>,
) -> Token {
    let token = Token {
        id: Uuid::new_v4(),
        user_id,
        secret: stratus_crypto::secret::generate_secret(),
        kind,
        issued_at,
    };
    db.insert_token(&token).unwrap();
    token
}

/// Pulls the hex secret out of a mail body, given the text right before it
/// (`"/activate/"` or `"?token="`).
pub fn extract_link_secret(html: &str, marker: &str) -> String {
    let start = html.find(marker).expect("mail should contain the link") + marker.len();
    html[start..]
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .collect()
}

/// Hash-map blob store with switchable delete failures, so tests can watch
/// the delete-blob-then-row ordering from both sides.
#[derive(Default)]
pub struct MemoryBlobs {
    objects: Mutex<HashMap<String, Bytes>>,
    deleted: Mutex<Vec<String>>,
    fail_deletes: AtomicBool,
}

impl MemoryBlobs {
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Loses the bytes behind the store's back, as a crashed disk would.
    pub fn drop_object(&self, key: &str) {
        self.objects.lock().unwrap().remove(key);
    }
}

#[async_trait]
impl BlobStore for MemoryBlobs {
    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<BlobStream>> {
        let data = self.objects.lock().unwrap().get(key).cloned();
        Ok(data.map(|bytes| {
            let stream = futures_util::stream::once(async move {
                Ok::<Bytes, std::io::Error>(bytes)
            });
            Box::pin(stream) as BlobStream
        }))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            anyhow::bail!("injected blob store failure");
        }
        self.objects.lock().unwrap().remove(key);
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }

    fn presign(&self, key: &str, ttl: Duration) -> Result<String> {
        Ok(format!(
            "memory://blobs/{key}?expires_in={}",
            ttl.num_seconds()
        ))
    }
}

/// No hashing at all: `hash` prefixes, `verify` compares. Keeps account
/// tests off the Argon2 hot path.
pub struct PlainVerifier;

impl CredentialVerifier for PlainVerifier {
    fn hash(&self, password: &str) -> Result<String> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        Ok(hash == format!("plain:{password}"))
    }
}

/// Collects sent mail; `wait_for` bridges the gap to the background
/// dispatch task.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingNotifier {
    pub async fn wait_for(&self, n: usize) -> Vec<MailMessage> {
        tokio::time::timeout(std::time::Duration::from_secs(2), async {
            loop {
                {
                    let sent = self.sent.lock().unwrap();
                    if sent.len() >= n {
                        return sent.clone();
                    }
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("expected mail was never dispatched")
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, mail: &MailMessage) -> Result<()> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

/// Every send fails, as when the mail API is down.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _mail: &MailMessage) -> Result<()> {
        anyhow::bail!("mail API unreachable")
    }
}
