//! Error types for external tool invocations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for processing operations.
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Errors that can occur while running an external tool.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Tool not found: {tool}. Please install it.")]
    ToolNotFound { tool: String },

    #[error("{tool} failed with exit code {code}: {stderr}")]
    ProcessFailed {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("Unexpected output from {tool}: {message}")]
    BadOutput { tool: String, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
