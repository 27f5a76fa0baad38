//! SQLite-backed catalogue: connection and schema. File CRUD lives in `files`.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    path TEXT PRIMARY KEY NOT NULL,
    group_id TEXT NOT NULL,
    face_count INTEGER NOT NULL DEFAULT 0,
    state TEXT NOT NULL,
    note TEXT,
    scanned_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS files_group ON files (group_id);
"#;

/// Handle to the picture catalogue (`~/.local/state/facecat/catalog.db` by default).
#[derive(Clone)]
pub struct Catalog {
    pub(crate) pool: Pool<Sqlite>,
}

impl Catalog {
    pub async fn open_default() -> Result<Self> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("facecat")?;
        Self::open_at(xdg_dirs.get_state_home().join("catalog.db")).await
    }

    /// Open or create the catalogue at `path`, creating parent dirs.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .with_context(|| format!("open catalogue {}", path.display()))?;
        Self::with_pool(pool).await
    }

    /// Throwaway catalogue. One connection, since each in-memory
    /// connection is a separate database.
    pub async fn open_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: Pool<Sqlite>) -> Result<Self> {
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Catalog { pool })
    }
}

pub(crate) fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
