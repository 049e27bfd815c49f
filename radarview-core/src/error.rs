//! Error types for radarview

use thiserror::Error;

/// Main error type for radarview operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    
    #[error("Invalid data: {0}")]
    InvalidData(String),
    
    #[error("shader compilation failed for `{name}`: {message}")]
    Shader { name: String, message: String },
    
    #[error("node has no parent")]
    NoParent,
    
    #[error("node has no shader program")]
    NoShaderProgram,

    #[error("node has no vertex buffer")]
    NoVertexBuffer,
    
    #[error("unknown scene node {0}")]
    UnknownNode(usize),
    
    #[error("{requested} vertices requested but buffer capacity is {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },
    
    #[error("Malformed mesh: {0}")]
    MalformedMesh(String),
    
    #[error("GPU error: {0}")]
    Gpu(String),
    
    #[error("Configuration error: {0}")]
    Config(String),
    
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Result type alias for radarview operations
pub type Result<T> = std::result::Result<T, Error>;
