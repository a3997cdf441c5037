//! Error types for Quarry.

use thiserror::Error;

/// Core error type for Quarry domain validation.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

/// Result type alias using Quarry's Error.
pub type Result<T> = std::result::Result<T, Error>;
