//! Error types for DataScope.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Namespace, module or catalog store failure.
    #[error("Upstream query error: {0}")]
    UpstreamQuery(String),

    /// Sensitive-value finder failure for a module.
    #[error("Sensitive data scan error: {0}")]
    SensitiveScan(String),

    #[error("Invalid paging parameter: {0}")]
    InvalidPagingParameter(String),

    #[error("Invalid sort specification: {0}")]
    InvalidSortSpec(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error was caused by caller input rather than a collaborator.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidPagingParameter(_) | Error::InvalidSortSpec(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
