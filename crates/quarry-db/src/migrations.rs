//! Database migrations and schema management.

use crate::error::DbResult;
use rusqlite::Connection;
use tracing::info;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema.
pub fn initialize_schema(conn: &Connection) -> DbResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating initial database schema...");
        create_initial_schema(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating database from version {} to {}",
            current_version, SCHEMA_VERSION
        );
        set_schema_version(conn, SCHEMA_VERSION)?;
    }

    Ok(())
}

fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> DbResult<()> {
    conn.pragma_update(None, "user_version", version)?;
    Ok(())
}

fn create_initial_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- Data sources attached to knowledge bases
        CREATE TABLE IF NOT EXISTS sources (
            id TEXT PRIMARY KEY,
            knowledge_base_id TEXT,
            source_type TEXT NOT NULL,
            content TEXT,
            location TEXT,
            options TEXT NOT NULL DEFAULT 'null',
            status TEXT NOT NULL DEFAULT 'PENDING',
            is_pending INTEGER NOT NULL DEFAULT 1,
            error TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sources_status ON sources(status);
        CREATE INDEX IF NOT EXISTS idx_sources_pending ON sources(is_pending);
        CREATE INDEX IF NOT EXISTS idx_sources_kb ON sources(knowledge_base_id);

        -- Chunked text extracted from sources
        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            source_id TEXT NOT NULL REFERENCES sources(id) ON DELETE CASCADE,
            chunk_index INTEGER NOT NULL,
            content TEXT NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{}',
            start_time REAL,
            end_time REAL
        );

        CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source_id);

        -- Tenant-wide ingestion settings (single row)
        CREATE TABLE IF NOT EXISTS rag_settings (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            chunk_size INTEGER NOT NULL,
            chunk_overlap INTEGER NOT NULL,
            use_headless_fetch INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    Ok(())
}
