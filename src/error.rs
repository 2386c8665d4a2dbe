//! Error types for the rhythm analysis engine

use std::fmt;

/// Errors that can occur while setting up or running a correlation
#[derive(Debug, Clone)]
pub enum AnalysisError {
    /// Invalid input data (empty audio, malformed onset list, ...)
    InvalidInput(String),

    /// Invalid settings, detected before any processing starts
    ConfigurationError(String),

    /// Audio decoding error
    DecodingError(String),

    /// Processing error during a run
    ProcessingError(String),

    /// Failure while encoding the periodicity image
    RenderError(String),

    /// File system error
    IoError(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            AnalysisError::DecodingError(msg) => write!(f, "Decoding error: {}", msg),
            AnalysisError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            AnalysisError::RenderError(msg) => write!(f, "Render error: {}", msg),
            AnalysisError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::IoError(err.to_string())
    }
}
