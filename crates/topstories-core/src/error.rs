use crate::hn::ShapeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TopStoriesError>;

#[derive(Debug, Error)]
pub enum TopStoriesError {
    #[error("Storage error: {0}")]
    Storage(#[from] redb::Error),

    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Storage operation error: {0}")]
    StorageOperation(#[from] redb::StorageError),

    #[error("Envelope encoding error: {0}")]
    Envelope(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Upstream(String),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("{0}")]
    RateLimited(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{0}")]
    Server(String),

    #[error("{0}")]
    BadInput(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Coarse classification used at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RateLimited,
    ServiceUnavailable,
    ServerError,
    BadInput,
    Unauthenticated,
    /// Anything not explicitly classified (upstream, storage, encoding).
    Internal,
}

impl TopStoriesError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RateLimited(_) => ErrorKind::RateLimited,
            Self::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            Self::Server(_) => ErrorKind::ServerError,
            Self::BadInput(_) => ErrorKind::BadInput,
            Self::Unauthenticated(_) => ErrorKind::Unauthenticated,
            _ => ErrorKind::Internal,
        }
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }
}
