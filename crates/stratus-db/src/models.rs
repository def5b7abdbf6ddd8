//! Database row types — these map directly to SQLite rows.
//! Distinct from the stratus-types domain models: columns come back as
//! TEXT and are parsed into Uuid / DateTime here, with column context on
//! failure.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use stratus_types::models::{FileEntry, Folder, Token, TokenKind, User, UserStatus};

/// Timestamp encoding used for every TEXT time column: fixed-width
/// RFC 3339 with microseconds and a `Z` suffix, so lexicographic order in
/// SQL equals chronological order.
pub fn ts_to_sql(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn ts_from_sql(s: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("invalid timestamp in {}: {}", column, s))
}

pub fn uuid_from_sql(s: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(s).with_context(|| format!("invalid uuid in {}: {}", column, s))
}

fn opt_uuid_from_sql(s: Option<&str>, column: &str) -> Result<Option<Uuid>> {
    s.map(|v| uuid_from_sql(v, column)).transpose()
}

pub struct UserRow {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub status: String,
    pub created_at: String,
}

impl UserRow {
    pub fn into_model(self) -> Result<User> {
        Ok(User {
            id: uuid_from_sql(&self.id, "users.id")?,
            status: UserStatus::parse(&self.status)
                .with_context(|| format!("invalid status in users.status: {}", self.status))?,
            created_at: ts_from_sql(&self.created_at, "users.created_at")?,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password_hash: self.password,
        })
    }
}

pub struct TokenRow {
    pub id: String,
    pub user_id: String,
    pub secret: String,
    pub kind: String,
    pub issued_at: String,
}

impl TokenRow {
    pub fn into_model(self) -> Result<Token> {
        Ok(Token {
            id: uuid_from_sql(&self.id, "tokens.id")?,
            user_id: uuid_from_sql(&self.user_id, "tokens.user_id")?,
            kind: TokenKind::parse(&self.kind)
                .with_context(|| format!("invalid kind in tokens.kind: {}", self.kind))?,
            issued_at: ts_from_sql(&self.issued_at, "tokens.issued_at")?,
            secret: self.secret,
        })
    }
}

pub struct FolderRow {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub path: String,
    pub created_at: String,
}

impl FolderRow {
    pub fn into_model(self) -> Result<Folder> {
        Ok(Folder {
            id: uuid_from_sql(&self.id, "folders.id")?,
            owner_id: uuid_from_sql(&self.owner_id, "folders.owner_id")?,
            parent_id: opt_uuid_from_sql(self.parent_id.as_deref(), "folders.parent_id")?,
            created_at: ts_from_sql(&self.created_at, "folders.created_at")?,
            name: self.name,
            path: self.path,
        })
    }
}

pub struct FileRow {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub blob_key: String,
    pub folder_id: Option<String>,
    pub size_bytes: i64,
    pub mime_type: String,
    pub created_at: String,
}

impl FileRow {
    pub fn into_model(self) -> Result<FileEntry> {
        Ok(FileEntry {
            id: uuid_from_sql(&self.id, "files.id")?,
            owner_id: uuid_from_sql(&self.owner_id, "files.owner_id")?,
            folder_id: opt_uuid_from_sql(self.folder_id.as_deref(), "files.folder_id")?,
            size_bytes: self.size_bytes as u64,
            created_at: ts_from_sql(&self.created_at, "files.created_at")?,
            name: self.name,
            blob_key: self.blob_key,
            mime_type: self.mime_type,
        })
    }
}
