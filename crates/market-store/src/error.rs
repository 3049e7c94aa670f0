use domain::StatusParseError;
use thiserror::Error;

/// Errors reported by store operations.
///
/// Every error is detected before any partial mutation commits; the
/// enclosing transaction rolls back in full, so a failed operation leaves no
/// observable side effects.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity missing, or the caller lacks visibility of it. The two are
    /// deliberately indistinguishable so existence never leaks to callers
    /// without access.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A decrement would have taken a product's stock below zero.
    #[error("insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: i64,
        available: i64,
    },

    /// The entity's current status does not permit the operation.
    #[error("cannot {action} {entity} with status \"{status}\"")]
    InvalidTransition {
        entity: &'static str,
        action: &'static str,
        status: String,
    },

    /// A batch validation failure; the operation rejects the whole batch.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A status column held a value outside its state machine.
    #[error("corrupt row: {0}")]
    Corrupt(#[from] StatusParseError),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
