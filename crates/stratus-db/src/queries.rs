use crate::Database;
use crate::models::{FileRow, FolderRow, TokenRow, UserRow, ts_to_sql};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use stratus_types::models::{FileEntry, Folder, Token, TokenKind, User, UserStatus};

impl Database {
    // -- Users --

    pub fn insert_user(&self, user: &User) -> Result<()> {
        let created_at = ts_to_sql(user.created_at);
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, first_name, last_name, email, password, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    user.id.to_string(),
                    user.first_name,
                    user.last_name,
                    user.email,
                    user.password_hash,
                    user.status.as_str(),
                    created_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| query_user(conn, "id", &id.to_string()))
    }

    pub fn set_user_status(&self, id: Uuid, status: UserStatus) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET status = ?1 WHERE id = ?2",
                rusqlite::params![status.as_str(), id.to_string()],
            )?;
            Ok(())
        })
    }

    pub fn set_user_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET password = ?1 WHERE id = ?2",
                rusqlite::params![password_hash, id.to_string()],
            )?;
            Ok(())
        })
    }

    // -- Tokens --

    pub fn insert_token(&self, token: &Token) -> Result<()> {
        let issued_at = ts_to_sql(token.issued_at);
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO tokens (id, user_id, secret, kind, issued_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    token.id.to_string(),
                    token.user_id.to_string(),
                    token.secret,
                    token.kind.as_str(),
                    issued_at,
                ],
            )?;
            Ok(())
        })
    }

    /// Raw row lookup; expiry policy lives in the token store on top.
    pub fn get_token_by_secret(&self, secret: &str, kind: TokenKind) -> Result<Option<Token>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, secret, kind, issued_at
                 FROM tokens WHERE secret = ?1 AND kind = ?2",
            )?;

            let row = stmt
                .query_row(rusqlite::params![secret, kind.as_str()], |row| {
                    Ok(TokenRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        secret: row.get(2)?,
                        kind: row.get(3)?,
                        issued_at: row.get(4)?,
                    })
                })
                .optional()?;

            row.map(TokenRow::into_model).transpose()
        })
    }

    /// Deletes the token. Returns whether this call removed the row, so a
    /// race between two consumers resolves to exactly one claim.
    pub fn delete_token(&self, id: Uuid) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                "DELETE FROM tokens WHERE id = ?1",
                [id.to_string()],
            )?;
            Ok(deleted > 0)
        })
    }

    pub fn delete_tokens_issued_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let cutoff = ts_to_sql(cutoff);
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                "DELETE FROM tokens WHERE issued_at <= ?1",
                [cutoff],
            )?;
            Ok(deleted)
        })
    }

    // -- Folders --

    pub fn insert_folder(&self, folder: &Folder) -> Result<()> {
        let created_at = ts_to_sql(folder.created_at);
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO folders (id, owner_id, name, parent_id, path, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    folder.id.to_string(),
                    folder.owner_id.to_string(),
                    folder.name,
                    folder.parent_id.map(|p| p.to_string()),
                    folder.path,
                    created_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_folder(&self, id: Uuid) -> Result<Option<Folder>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, name, parent_id, path, created_at
                 FROM folders WHERE id = ?1",
            )?;

            let row = stmt
                .query_row([id.to_string()], folder_row)
                .optional()?;

            row.map(FolderRow::into_model).transpose()
        })
    }

    /// `parent_id = None` is the root listing — folders with no parent —
    /// never "all folders".
    pub fn list_folders(&self, owner_id: Uuid, parent_id: Option<Uuid>) -> Result<Vec<Folder>> {
        self.with_conn(|conn| {
            let owner = owner_id.to_string();
            let mut stmt;
            let rows = match parent_id {
                Some(parent) => {
                    stmt = conn.prepare(
                        "SELECT id, owner_id, name, parent_id, path, created_at
                         FROM folders WHERE owner_id = ?1 AND parent_id = ?2
                         ORDER BY created_at",
                    )?;
                    stmt.query_map(rusqlite::params![owner, parent.to_string()], folder_row)?
                }
                None => {
                    stmt = conn.prepare(
                        "SELECT id, owner_id, name, parent_id, path, created_at
                         FROM folders WHERE owner_id = ?1 AND parent_id IS NULL
                         ORDER BY created_at",
                    )?;
                    stmt.query_map([owner], folder_row)?
                }
            };

            let rows = rows.collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(FolderRow::into_model).collect()
        })
    }

    pub fn rename_folder(&self, id: Uuid, name: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE folders SET name = ?1 WHERE id = ?2",
                rusqlite::params![name, id.to_string()],
            )?;
            Ok(())
        })
    }

    /// Removes the folder record only; children and contained files keep
    /// their (now dangling) references.
    pub fn delete_folder(&self, id: Uuid) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("DELETE FROM folders WHERE id = ?1", [id.to_string()])?;
            Ok(())
        })
    }

    // -- Files --

    pub fn insert_file(&self, file: &FileEntry) -> Result<()> {
        let created_at = ts_to_sql(file.created_at);
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO files (id, owner_id, name, blob_key, folder_id, size_bytes, mime_type, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    file.id.to_string(),
                    file.owner_id.to_string(),
                    file.name,
                    file.blob_key,
                    file.folder_id.map(|f| f.to_string()),
                    file.size_bytes as i64,
                    file.mime_type,
                    created_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_file(&self, id: Uuid) -> Result<Option<FileEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, name, blob_key, folder_id, size_bytes, mime_type, created_at
                 FROM files WHERE id = ?1",
            )?;

            let row = stmt
                .query_row([id.to_string()], file_row)
                .optional()?;

            row.map(FileRow::into_model).transpose()
        })
    }

    pub fn list_files(&self, owner_id: Uuid, folder_id: Option<Uuid>) -> Result<Vec<FileEntry>> {
        self.with_conn(|conn| {
            let owner = owner_id.to_string();
            let mut stmt;
            let rows = match folder_id {
                Some(folder) => {
                    stmt = conn.prepare(
                        "SELECT id, owner_id, name, blob_key, folder_id, size_bytes, mime_type, created_at
                         FROM files WHERE owner_id = ?1 AND folder_id = ?2
                         ORDER BY created_at",
                    )?;
                    stmt.query_map(rusqlite::params![owner, folder.to_string()], file_row)?
                }
                None => {
                    stmt = conn.prepare(
                        "SELECT id, owner_id, name, blob_key, folder_id, size_bytes, mime_type, created_at
                         FROM files WHERE owner_id = ?1 AND folder_id IS NULL
                         ORDER BY created_at",
                    )?;
                    stmt.query_map([owner], file_row)?
                }
            };

            let rows = rows.collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(FileRow::into_model).collect()
        })
    }

    pub fn rename_file(&self, id: Uuid, name: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE files SET name = ?1 WHERE id = ?2",
                rusqlite::params![name, id.to_string()],
            )?;
            Ok(())
        })
    }

    pub fn delete_file(&self, id: Uuid) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("DELETE FROM files WHERE id = ?1", [id.to_string()])?;
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<User>> {
    // column is one of our own literals, never caller input
    let sql = format!(
        "SELECT id, first_name, last_name, email, password, status, created_at
         FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                email: row.get(3)?,
                password: row.get(4)?,
                status: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .optional()?;

    row.map(UserRow::into_model).transpose()
}

fn folder_row(row: &rusqlite::Row) -> rusqlite::Result<FolderRow> {
    Ok(FolderRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        parent_id: row.get(3)?,
        path: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn file_row(row: &rusqlite::Row) -> rusqlite::Result<FileRow> {
    Ok(FileRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        blob_key: row.get(3)?,
        folder_id: row.get(4)?,
        size_bytes: row.get(5)?,
        mime_type: row.get(6)?,
        created_at: row.get(7)?,
    })
}
