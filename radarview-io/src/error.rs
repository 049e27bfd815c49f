//! Error types for I/O operations

use thiserror::Error;

/// Errors that can occur while reading sequences and meshes
#[derive(Error, Debug)]
pub enum IoError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid file format: {format}")]
    InvalidFormat { format: String },

    #[error("Parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IoError> for radarview_core::Error {
    fn from(err: IoError) -> Self {
        match err {
            IoError::Io(e) => radarview_core::Error::Io(e),
            IoError::InvalidFormat { format } => radarview_core::Error::UnsupportedFormat(format),
            other => radarview_core::Error::InvalidData(other.to_string()),
        }
    }
}
