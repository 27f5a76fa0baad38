//! File record CRUD.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::db::{unix_timestamp, Catalog};
use super::types::{FileRecord, FileState};

fn row_to_record(row: &SqliteRow) -> FileRecord {
    let face_count: i64 = row.get("face_count");
    let state: String = row.get("state");
    FileRecord {
        path: row.get("path"),
        group_id: row.get("group_id"),
        face_count: face_count.max(0) as u32,
        state: FileState::from_str(&state),
        note: row.get("note"),
        scanned_at: row.get("scanned_at"),
    }
}

impl Catalog {
    /// Insert or replace the record for `record.path`. `scanned_at` is set to now.
    pub async fn upsert_file(&self, record: &FileRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO files (path, group_id, face_count, state, note, scanned_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(path) DO UPDATE SET
                group_id = excluded.group_id,
                face_count = excluded.face_count,
                state = excluded.state,
                note = excluded.note,
                scanned_at = excluded.scanned_at
            "#,
        )
        .bind(&record.path)
        .bind(&record.group_id)
        .bind(record.face_count as i64)
        .bind(record.state.as_str())
        .bind(&record.note)
        .bind(unix_timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_file(&self, path: &str) -> Result<Option<FileRecord>> {
        let row = sqlx::query(
            r#"
            SELECT path, group_id, face_count, state, note, scanned_at
            FROM files
            WHERE path = ?1
            "#,
        )
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_record))
    }

    /// All records, ordered by path.
    pub async fn list_files(&self) -> Result<Vec<FileRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT path, group_id, face_count, state, note, scanned_at
            FROM files
            ORDER BY path ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    /// Remove a record. Returns true if one existed.
    pub async fn remove_file(&self, path: &str) -> Result<bool> {
        let res = sqlx::query("DELETE FROM files WHERE path = ?1")
            .bind(path)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Forget every file catalogued against `group`. Returns how many went.
    pub async fn remove_group(&self, group: &str) -> Result<u64> {
        let res = sqlx::query("DELETE FROM files WHERE group_id = ?1")
            .bind(group)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    pub async fn count_files(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM files")
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.get("n");
        Ok(n.max(0) as u64)
    }
}
