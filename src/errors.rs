//! Error types for the pool statistics pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, StatsError>;

/// Errors that can occur while computing or loading pool statistics
#[derive(Error, Debug)]
pub enum StatsError {
    /// General-case derivation needs at least two folded periods
    #[error("sample variance needs at least 2 periods, aggregate has {count}")]
    InsufficientSamples { count: u64 },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Logging setup failed: {message}")]
    Logging { message: String },

    #[error("Thread pool error: {source}")]
    ThreadPool {
        #[from]
        source: rayon::ThreadPoolBuildError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: config::ConfigError,
    },

    #[error("File I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },
}

impl StatsError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        StatsError::InvalidInput {
            message: message.into(),
        }
    }
}
