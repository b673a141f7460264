//! Error types for report loading and parsing

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShroudError>;

/// Errors that abort a coverage run before anything is rendered
#[derive(Debug, Error)]
pub enum ShroudError {
    /// Missing or invalid input parameters
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The coverage report path does not resolve to a file
    #[error("No coverage report found at {}", .0.display())]
    ReportNotFound(PathBuf),

    /// Unparsable XML, missing counters, or non-numeric attributes
    #[error("Malformed coverage report: {0}")]
    MalformedReport(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ShroudError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedReport(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
