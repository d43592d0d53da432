//! Search error types

use thiserror::Error;

/// Hyperparameter search errors
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Empty search space")]
    EmptySpace,

    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    #[error("Invalid parameter value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("No trials completed")]
    NoTrials,
}

/// Result type for search operations
pub type Result<T> = std::result::Result<T, SearchError>;
