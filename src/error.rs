//! Crate-level error type

use thiserror::Error;

/// Top-level error for training and search operations
#[derive(Debug, Error)]
pub enum Error {
    #[error("data error: {0}")]
    Data(#[from] crate::data::DataError),

    #[error("search error: {0}")]
    Search(#[from] crate::search::SearchError),

    #[error("tracking error: {0}")]
    Tracking(#[from] crate::tracking::TrackingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

/// Result type for crate operations
pub type Result<T> = std::result::Result<T, Error>;
