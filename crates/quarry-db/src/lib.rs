//! Quarry DB - SQLite persistence for sources, chunks and ingestion settings.

mod database;
mod error;
mod migrations;
mod operations;

pub use database::Database;
pub use error::{DbError, DbResult};
