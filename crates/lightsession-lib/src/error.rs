//! Error type for the I/O edges of the library.
//!
//! The window computation itself never fails: it answers `None` when nothing
//! can be trimmed. Errors only arise when reading settings files, parsing
//! payload bytes or compiling a custom path pattern.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LightSessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid path pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, LightSessionError>;
