//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fulfillment::EngineError;
use market_store::StoreError;
use queries::QueryError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// The request carried no usable identity headers.
    Unidentified(String),
    /// Bad request from the client, caught before any engine ran.
    BadRequest(String),
    /// Fulfillment error.
    Engine(EngineError),
    /// Read-side error.
    Query(QueryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unidentified(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Engine(EngineError::InvalidArgument(msg)) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Engine(EngineError::Store(err)) => store_error_to_response(err),
            ApiError::Query(QueryError::Store(err)) => store_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn store_error_to_response(err: StoreError) -> (StatusCode, String) {
    match &err {
        StoreError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        StoreError::InsufficientStock { .. } | StoreError::Validation(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        StoreError::InvalidTransition { .. } => (StatusCode::CONFLICT, err.to_string()),
        StoreError::Corrupt(_) | StoreError::Database(_) | StoreError::Migration(_) => {
            tracing::error!(error = %err, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::Engine(err)
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::Query(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Engine(EngineError::Store(err))
    }
}
