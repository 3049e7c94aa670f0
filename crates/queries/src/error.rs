//! Query error types.

use market_store::StoreError;
use thiserror::Error;

/// Errors that can occur on the read side.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Store error. Scoped reads also surface [`StoreError::NotFound`] here
    /// when the caller lacks visibility of the entity.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience type alias for query results.
pub type Result<T> = std::result::Result<T, QueryError>;
