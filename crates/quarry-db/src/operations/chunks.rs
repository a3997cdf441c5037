//! Chunk persistence.

use crate::database::Database;
use crate::error::DbResult;
use quarry_core::Chunk;
use rusqlite::{params, Transaction};

impl Database {
    /// Insert chunks in one transaction.
    pub fn create_chunks(&self, chunks: &[Chunk]) -> DbResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        insert_chunks(&tx, chunks)?;
        tx.commit()?;
        Ok(())
    }

    /// Replace every chunk of a source with `chunks`.
    ///
    /// Re-ingesting a source must not leave the previous attempt's chunks
    /// behind, so the delete and insert share one transaction.
    pub fn replace_source_chunks(&self, source_id: &str, chunks: &[Chunk]) -> DbResult<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM chunks WHERE source_id = ?1", params![source_id])?;
        insert_chunks(&tx, chunks)?;
        tx.commit()?;
        Ok(chunks.len())
    }

    /// Get all chunks for a source, in order.
    pub fn get_chunks_by_source(&self, source_id: &str) -> DbResult<Vec<Chunk>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, source_id, chunk_index, content, metadata, start_time, end_time
             FROM chunks WHERE source_id = ?1 ORDER BY chunk_index",
        )?;

        let chunks = stmt
            .query_map(params![source_id], |row| {
                let metadata: String = row.get(4)?;
                Ok(Chunk {
                    id: row.get(0)?,
                    source_id: row.get(1)?,
                    chunk_index: row.get(2)?,
                    content: row.get(3)?,
                    metadata: serde_json::from_str(&metadata)
                        .unwrap_or_else(|_| serde_json::json!({})),
                    start_time: row.get(5)?,
                    end_time: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(chunks)
    }

    /// Count chunks for a source.
    pub fn count_chunks_by_source(&self, source_id: &str) -> DbResult<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE source_id = ?1",
            params![source_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Count all chunks.
    pub fn count_chunks(&self) -> DbResult<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn insert_chunks(tx: &Transaction, chunks: &[Chunk]) -> DbResult<()> {
    let mut stmt = tx.prepare(
        r#"
        INSERT INTO chunks (id, source_id, chunk_index, content, metadata, start_time, end_time)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )?;

    for chunk in chunks {
        stmt.execute(params![
            chunk.id,
            chunk.source_id,
            chunk.chunk_index,
            chunk.content,
            serde_json::to_string(&chunk.metadata)?,
            chunk.start_time,
            chunk.end_time,
        ])?;
    }

    Ok(())
}
