//! Tenant-wide ingestion settings.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use chrono::Utc;
use quarry_core::RagSettings;
use rusqlite::params;

impl Database {
    /// Read the ingestion settings row.
    ///
    /// Fails with `NotFound` until the row has been seeded.
    pub fn get_rag_settings(&self) -> DbResult<RagSettings> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT chunk_size, chunk_overlap, use_headless_fetch FROM rag_settings WHERE id = 1",
            [],
            |row| {
                let chunk_size: i64 = row.get(0)?;
                let chunk_overlap: i64 = row.get(1)?;
                Ok(RagSettings {
                    chunk_size: chunk_size.max(0) as usize,
                    chunk_overlap: chunk_overlap.max(0) as usize,
                    use_headless_fetch: row.get(2)?,
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                DbError::NotFound("Ingestion settings have not been initialized".to_string())
            }
            _ => DbError::from(e),
        })
    }

    /// Insert or overwrite the ingestion settings.
    pub fn set_rag_settings(&self, settings: &RagSettings) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO rag_settings (id, chunk_size, chunk_overlap, use_headless_fetch, updated_at)
            VALUES (1, ?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                chunk_size = excluded.chunk_size,
                chunk_overlap = excluded.chunk_overlap,
                use_headless_fetch = excluded.use_headless_fetch,
                updated_at = excluded.updated_at
            "#,
            params![
                settings.chunk_size as i64,
                settings.chunk_overlap as i64,
                settings.use_headless_fetch,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Write the settings only if none exist yet. Returns whether a row was added.
    pub fn seed_rag_settings(&self, settings: &RagSettings) -> DbResult<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            r#"
            INSERT OR IGNORE INTO rag_settings (id, chunk_size, chunk_overlap, use_headless_fetch, updated_at)
            VALUES (1, ?1, ?2, ?3, ?4)
            "#,
            params![
                settings.chunk_size as i64,
                settings.chunk_overlap as i64,
                settings.use_headless_fetch,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_settings() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_rag_settings().unwrap_err().is_not_found());
    }

    #[test]
    fn test_seed_does_not_overwrite() {
        let db = Database::open_in_memory().unwrap();

        assert!(db.seed_rag_settings(&RagSettings::new(800, 80, true)).unwrap());
        assert!(!db.seed_rag_settings(&RagSettings::default()).unwrap());

        assert_eq!(db.get_rag_settings().unwrap(), RagSettings::new(800, 80, true));
    }

    #[test]
    fn test_set_overwrites() {
        let db = Database::open_in_memory().unwrap();
        db.seed_rag_settings(&RagSettings::default()).unwrap();

        db.set_rag_settings(&RagSettings::new(300, 30, false)).unwrap();
        assert_eq!(db.get_rag_settings().unwrap().chunk_size, 300);
    }
}
