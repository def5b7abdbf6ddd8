use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Database: running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                first_name  TEXT NOT NULL,
                last_name   TEXT NOT NULL,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                status      TEXT NOT NULL DEFAULT 'inactive',
                created_at  TEXT NOT NULL
            );

            CREATE TABLE tokens (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id),
                secret      TEXT NOT NULL UNIQUE,
                kind        TEXT NOT NULL,
                issued_at   TEXT NOT NULL
            );

            -- No FK on parent_id: folder deletion is non-cascading and may
            -- leave child folders behind.
            CREATE TABLE folders (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL REFERENCES users(id),
                name        TEXT NOT NULL,
                parent_id   TEXT,
                path        TEXT NOT NULL DEFAULT '',
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_folders_owner_parent
                ON folders(owner_id, parent_id);

            -- No FK on folder_id: registration accepts the caller's folder
            -- reference as-is.
            CREATE TABLE files (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL REFERENCES users(id),
                name        TEXT NOT NULL,
                blob_key    TEXT NOT NULL UNIQUE,
                folder_id   TEXT,
                size_bytes  INTEGER NOT NULL,
                mime_type   TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_files_owner_folder
                ON files(owner_id, folder_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    Ok(())
}
