//! Error types for the blockbook monitor

/// Errors that can occur in the blockbook monitor
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Http(String),

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for blockbook monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;
