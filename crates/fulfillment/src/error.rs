//! Fulfillment error types.

use market_store::StoreError;
use thiserror::Error;

/// Errors that can occur during fulfillment operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request was malformed before it ever reached the store.
    #[error("invalid request: {0}")]
    InvalidArgument(String),

    /// Store error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience type alias for fulfillment results.
pub type Result<T> = std::result::Result<T, EngineError>;
