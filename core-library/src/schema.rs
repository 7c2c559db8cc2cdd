//! Posts table definition.
//!
//! The full resync drops and recreates the table inside its transaction, so
//! the DDL lives here rather than in a migrations directory.

use sqlx::SqliteConnection;

use crate::{LibraryError, Result};

pub(crate) const CREATE_POSTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_path TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    subtitle TEXT,
    category TEXT NOT NULL DEFAULT 'uncategorized',
    description TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    date_published TEXT NOT NULL,
    narration TEXT,
    audio_file TEXT,
    pinned INTEGER NOT NULL DEFAULT 0,
    hidden INTEGER NOT NULL DEFAULT 0
)
"#;

pub(crate) const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_posts_category ON posts (category)",
    "CREATE INDEX IF NOT EXISTS idx_posts_ordering ON posts (pinned DESC, date_published DESC)",
];

pub(crate) const DROP_POSTS_TABLE: &str = "DROP TABLE IF EXISTS posts";

/// Create the posts table and its indexes if they are missing.
pub(crate) async fn ensure_schema(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(CREATE_POSTS_TABLE)
        .execute(&mut *conn)
        .await
        .map_err(|e| LibraryError::Migration(e.to_string()))?;

    for statement in CREATE_INDEXES {
        sqlx::query(statement)
            .execute(&mut *conn)
            .await
            .map_err(|e| LibraryError::Migration(e.to_string()))?;
    }

    Ok(())
}
