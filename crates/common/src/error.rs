//! Error types for storysweep

use thiserror::Error;

/// Result type alias using the storysweep Error
pub type Result<T> = std::result::Result<T, Error>;

/// storysweep error types
///
/// Everything except [`Error::ReportParse`] aborts a sweep. A malformed audit
/// report is recorded against its entry and the sweep moves on.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Static server error: {0}")]
    Server(String),

    #[error("Couldn't find story content! No frame matches '{pattern}'")]
    ContentFrameMissing { pattern: String },

    #[error("Selection lost: no tree item is selected after traversal started")]
    SelectionLost,

    #[error("Catalog is empty: {0}")]
    EmptyCatalog(String),

    #[error("Traversal did not wrap around after {entries} entries")]
    TraversalRunaway { entries: usize },

    #[error("Selection stopped moving at '{entry}' after {entries} entries")]
    TraversalStalled { entry: String, entries: usize },

    #[error("No audit report within {seconds}s")]
    ReportTimeout { seconds: u64 },

    #[error("Audit report could not be parsed: {0}")]
    ReportParse(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether the sweep may continue past this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::ReportParse(_))
    }
}
