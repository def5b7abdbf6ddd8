use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use stratus_db::Database;
use stratus_types::models::{Token, TokenKind};

use crate::error::CoreError;

/// Ephemeral tokens are good for 24 hours from issue. Expiry is enforced on
/// lookup, so an expired row behaves as absent even before the reaper has
/// swept it.
const TOKEN_TTL_HOURS: i64 = 24;

fn ttl() -> Duration {
    Duration::hours(TOKEN_TTL_HOURS)
}

/// A token is dead once its age reaches the TTL; the boundary instant
/// itself counts as expired.
fn expired(issued_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - issued_at >= ttl()
}

/// Issues and redeems the single-use secrets behind activation and password
/// reset links.
#[derive(Clone)]
pub struct TokenStore {
    db: Arc<Database>,
}

impl TokenStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Mints a fresh token for `user_id`. The secret is the only part that
    /// leaves the system (inside a mail link); the row id stays internal.
    pub fn issue(&self, user_id: Uuid, kind: TokenKind) -> Result<Token, CoreError> {
        let token = Token {
            id: Uuid::new_v4(),
            user_id,
            secret: stratus_crypto::secret::generate_secret(),
            kind,
            issued_at: Utc::now(),
        };
        self.db.insert_token(&token)?;
        Ok(token)
    }

    /// Resolves a secret to its token. Unknown, wrong-kind, and expired
    /// secrets all come back as `InvalidToken`; the caller cannot tell which.
    pub fn lookup(&self, secret: &str, kind: TokenKind) -> Result<Token, CoreError> {
        let token = self
            .db
            .get_token_by_secret(secret, kind)?
            .ok_or(CoreError::InvalidToken)?;

        if expired(token.issued_at, Utc::now()) {
            return Err(CoreError::InvalidToken);
        }

        Ok(token)
    }

    /// Burns the token. Returns whether this caller removed the row: when two
    /// requests race on the same secret, exactly one gets `true` and the
    /// other must treat the token as already spent.
    pub fn consume(&self, token_id: Uuid) -> Result<bool, CoreError> {
        Ok(self.db.delete_token(token_id)?)
    }

    /// Drops every token past its TTL. Lookup already refuses expired rows;
    /// this just keeps the table from accumulating dead secrets.
    pub fn sweep_expired(&self) -> Result<usize, CoreError> {
        Ok(self.db.delete_tokens_issued_before(Utc::now() - ttl())?)
    }
}

/// Background task that sweeps expired tokens on an interval.
pub async fn run_reaper_loop(tokens: TokenStore, interval_secs: u64) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        match tokens.sweep_expired() {
            Ok(count) => {
                if count > 0 {
                    info!("Token reaper: removed {} expired tokens", count);
                }
            }
            Err(e) => {
                warn!("Token reaper error: {}", e);
            }
        }
    }
}
