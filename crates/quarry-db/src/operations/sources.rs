//! Source CRUD and status operations.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use chrono::{DateTime, Utc};
use quarry_core::{Source, SourceDescriptor, SourceStatus, StatusCounts, StatusUpdate};
use rusqlite::params;

const SOURCE_COLUMNS: &str = "id, knowledge_base_id, source_type, content, location, options, \
                              status, is_pending, error, created_at, updated_at";

impl Database {
    /// Register a new source.
    pub fn create_source(&self, source: &Source) -> DbResult<()> {
        let conn = self.conn()?;
        let descriptor = &source.descriptor;
        conn.execute(
            r#"
            INSERT INTO sources (id, knowledge_base_id, source_type, content, location, options,
                                 status, is_pending, error, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                descriptor.id,
                descriptor.knowledge_base_id,
                descriptor.source_type,
                descriptor.content,
                descriptor.location,
                serde_json::to_string(&descriptor.options)?,
                source.status.as_str(),
                source.is_pending,
                source.error,
                source.created_at.to_rfc3339(),
                source.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a source by ID.
    pub fn get_source(&self, id: &str) -> DbResult<Source> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM sources WHERE id = ?1", SOURCE_COLUMNS);
        conn.query_row(&sql, params![id], row_to_source)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    DbError::NotFound(format!("Source not found: {}", id))
                }
                _ => DbError::from(e),
            })
    }

    /// List sources, optionally filtered by status, oldest first.
    pub fn list_sources(&self, status: Option<SourceStatus>) -> DbResult<Vec<Source>> {
        let conn = self.conn()?;

        let sources = match status {
            Some(s) => {
                let sql = format!(
                    "SELECT {} FROM sources WHERE status = ?1 ORDER BY created_at ASC, rowid ASC",
                    SOURCE_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![s.as_str()], row_to_source)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM sources ORDER BY created_at ASC, rowid ASC",
                    SOURCE_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], row_to_source)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };

        Ok(sources)
    }

    /// Descriptors of every source still waiting for a terminal status.
    pub fn pending_descriptors(&self) -> DbResult<Vec<SourceDescriptor>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM sources WHERE is_pending = 1 ORDER BY created_at ASC, rowid ASC",
            SOURCE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_source)?;

        let mut descriptors = Vec::new();
        for source in rows {
            descriptors.push(source?.descriptor);
        }
        Ok(descriptors)
    }

    /// Write a status for one source.
    ///
    /// The write is checked against the current status, so a source can only
    /// reach `FINISHED` or `FAILED` from `PROCESSING`. Terminal statuses clear
    /// `is_pending` in the same statement. Fails with `NotFound` when the
    /// source no longer exists and `Transition` when the move is not allowed.
    pub fn update_source_status(&self, id: &str, update: &StatusUpdate) -> DbResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let current: String = tx
            .query_row(
                "SELECT status FROM sources WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    DbError::NotFound(format!("Source not found: {}", id))
                }
                _ => DbError::from(e),
            })?;
        let current = SourceStatus::from_str(&current).ok_or_else(|| {
            DbError::Other(format!("Source {} has unknown status '{}'", id, current))
        })?;
        current.transition(update.status)?;

        let now = Utc::now().to_rfc3339();
        tx.execute(
            "UPDATE sources
             SET status = ?2, is_pending = COALESCE(?3, is_pending), error = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                id,
                update.status.as_str(),
                update.pending_flag(),
                update.error,
                now
            ],
        )?;
        tx.commit()?;

        Ok(())
    }

    /// Put a source back in the pending state for another attempt.
    pub fn reset_source(&self, id: &str) -> DbResult<()> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();

        let rows = conn.execute(
            "UPDATE sources SET status = 'PENDING', is_pending = 1, error = NULL, updated_at = ?2
             WHERE id = ?1",
            params![id, now],
        )?;

        if rows == 0 {
            return Err(DbError::NotFound(format!("Source not found: {}", id)));
        }

        Ok(())
    }

    /// Delete a source and its chunks.
    pub fn delete_source(&self, id: &str) -> DbResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM sources WHERE id = ?1", params![id])?;

        if rows == 0 {
            return Err(DbError::NotFound(format!("Source not found: {}", id)));
        }

        Ok(())
    }

    /// Count sources per status.
    pub fn status_counts(&self) -> DbResult<StatusCounts> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM sources GROUP BY status")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = StatusCounts::default();
        for row in rows {
            let (status, count) = row?;
            match SourceStatus::from_str(&status) {
                Some(SourceStatus::Pending) => counts.pending = count,
                Some(SourceStatus::Processing) => counts.processing = count,
                Some(SourceStatus::Finished) => counts.finished = count,
                Some(SourceStatus::Failed) => counts.failed = count,
                None => {}
            }
        }

        Ok(counts)
    }
}

fn row_to_source(row: &rusqlite::Row) -> rusqlite::Result<Source> {
    let options_str: String = row.get(5)?;
    let status_str: String = row.get(6)?;
    let created_at_str: String = row.get(9)?;
    let updated_at_str: String = row.get(10)?;

    let mut descriptor = SourceDescriptor::new(row.get::<_, String>(0)?, row.get::<_, String>(2)?);
    descriptor.knowledge_base_id = row.get(1)?;
    descriptor.content = row.get(3)?;
    descriptor.location = row.get(4)?;
    descriptor.options = serde_json::from_str(&options_str).unwrap_or(serde_json::Value::Null);

    Ok(Source {
        descriptor,
        status: SourceStatus::from_str(&status_str).unwrap_or_default(),
        is_pending: row.get(7)?,
        error: row.get(8)?,
        created_at: parse_timestamp(&created_at_str),
        updated_at: parse_timestamp(&updated_at_str),
    })
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
