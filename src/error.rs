//! Error types for the core query/graph layer.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type CoreResult<T> = Result<T, CoreError>;

/// The four error kinds the core surfaces (see spec §7).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Missing/invalid inputs: no root IDs, non-integer depth, unknown handle, unknown config key.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Handle expired or requested entity missing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Database or pool error. Keeps the original driver/pool error as the
    /// source (spec §7: "surfaces driver errors as `backend_failure` with
    /// the original cause attached"), matching the teacher's
    /// `OrmError::Query(#[from] tokio_postgres::Error)`.
    #[error("backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Builder invariant violated; should be unreachable in production.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<tokio_postgres::Error> for CoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::Backend(Box::new(err))
    }
}

impl From<deadpool_postgres::PoolError> for CoreError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Backend(Box::new(err))
    }
}

impl From<deadpool_postgres::BuildError> for CoreError {
    fn from(err: deadpool_postgres::BuildError) -> Self {
        Self::Backend(Box::new(err))
    }
}
