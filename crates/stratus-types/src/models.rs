use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account state. Users start `Inactive` and become `Active` exactly once,
/// through token-based activation. There is no deactivation transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Inactive,
    Active,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Inactive => "inactive",
            UserStatus::Active => "active",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "inactive" => Some(UserStatus::Inactive),
            "active" => Some(UserStatus::Active),
            _ => None,
        }
    }
}

/// A registered account. `password_hash` is an opaque PHC string owned by
/// the credential verifier; it never leaves the server (API responses use
/// `api::UserProfile`), which is why this struct is deliberately not
/// Serialize.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

/// What a single-use token is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Activation,
    Reset,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Activation => "activation",
            TokenKind::Reset => "reset",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "activation" => Some(TokenKind::Activation),
            "reset" => Some(TokenKind::Reset),
            _ => None,
        }
    }
}

/// Single-use secret-bearing token. Valid for 24 hours from `issued_at`,
/// deleted on consumption. Several live tokens of either kind may exist
/// for the same user at once; only `secret` is unique.
#[derive(Debug, Clone)]
pub struct Token {
    pub id: Uuid,
    pub user_id: Uuid,
    pub secret: String,
    pub kind: TokenKind,
    pub issued_at: DateTime<Utc>,
}

/// A folder in a user's tree. `path` is the materialized ancestor chain
/// root → parent (self excluded), one `/{id}` segment per ancestor; root
/// folders have an empty path. The path is fixed at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

/// File metadata. The bytes live in the blob store under `blob_key`,
/// which is immutable once the record exists. `folder_id = None` means
/// the file sits at the root of the owner's tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub blob_key: String,
    pub folder_id: Option<Uuid>,
    pub size_bytes: u64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [UserStatus::Inactive, UserStatus::Active] {
            assert_eq!(UserStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(UserStatus::parse("banned"), None);
    }

    #[test]
    fn token_kind_round_trips_through_strings() {
        for kind in [TokenKind::Activation, TokenKind::Reset] {
            assert_eq!(TokenKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(TokenKind::parse("session"), None);
    }
}
