//! Error types for the ingestion pipeline.

use quarry_core::SourceStatus;
use quarry_db::DbError;
use quarry_process::ProcessError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for batch-level operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type for extractor operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors that abort a whole batch or prevent the pipeline from starting.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to load ingestion settings: {0}")]
    Settings(#[source] DbError),

    #[error(transparent)]
    InvalidSettings(#[from] quarry_core::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Config error: {0}")]
    Config(#[from] quarry_config::ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Errors raised by a format extractor for one source.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("{source_type} source is missing '{field}'")]
    MissingField {
        source_type: String,
        field: &'static str,
    },

    #[error("Invalid {field}: {message}")]
    InvalidField { field: &'static str, message: String },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    #[error("Media processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("No text could be extracted from {0}")]
    NoContent(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl ExtractError {
    pub(crate) fn parse(what: impl Into<String>, message: impl ToString) -> Self {
        ExtractError::Parse {
            what: what.into(),
            message: message.to_string(),
        }
    }

    /// Whether retrying the same source later could succeed.
    ///
    /// Network timeouts, refused connections, rate limiting and server-side
    /// errors are transient; malformed input and missing fields are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ExtractError::Http(e) => e.is_timeout() || e.is_connect(),
            ExtractError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            ExtractError::Database(DbError::Pool(_)) => true,
            ExtractError::Process(ProcessError::Io(_)) => true,
            _ => false,
        }
    }
}

/// Errors raised by the status tracker.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Source {0} was already attempted in this batch")]
    DuplicateAttempt(String),

    #[error("Cannot start {id} while {active} is still processing")]
    AttemptInFlight { id: String, active: String },

    #[error("Source {0} has no attempt in progress")]
    NotInFlight(String),

    #[error("Failed to mark {id} as {status}: {source}")]
    Write {
        id: String,
        status: SourceStatus,
        #[source]
        source: DbError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let rate_limited = ExtractError::HttpStatus {
            url: "https://example.com".to_string(),
            status: 429,
        };
        let server_down = ExtractError::HttpStatus {
            url: "https://example.com".to_string(),
            status: 503,
        };
        let not_found = ExtractError::HttpStatus {
            url: "https://example.com".to_string(),
            status: 404,
        };

        assert!(rate_limited.is_transient());
        assert!(server_down.is_transient());
        assert!(!not_found.is_transient());
        assert!(!ExtractError::NoContent("a".to_string()).is_transient());
        assert!(!ExtractError::parse("pdf", "bad xref").is_transient());
    }
}
