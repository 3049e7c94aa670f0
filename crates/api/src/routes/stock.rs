//! Stock adjustment and audit trail endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::ProductId;
use domain::StockLogEntry;
use market_store::MarketStore;
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::identity::Identity;

#[derive(Deserialize)]
pub struct AdjustStockRequest {
    pub change: i32,
    #[serde(default)]
    pub reason: String,
}

/// POST /stock/{product_id}/adjust — apply a signed stock delta.
#[tracing::instrument(skip(state, req))]
pub async fn adjust<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(product_id): Path<Uuid>,
    Identity(actor): Identity,
    Json(req): Json<AdjustStockRequest>,
) -> Result<Json<StockLogEntry>, ApiError> {
    let entry = state
        .stock_ledger
        .adjust(
            ProductId::from_uuid(product_id),
            req.change,
            Some(actor.user),
            &req.reason,
        )
        .await?;
    Ok(Json(entry))
}

/// GET /stock/{product_id}/log — the product's audit trail, newest first.
pub async fn log<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(product_id): Path<Uuid>,
    Identity(_actor): Identity,
) -> Result<Json<Vec<StockLogEntry>>, ApiError> {
    let entries = state
        .stock_ledger
        .history(ProductId::from_uuid(product_id))
        .await?;
    Ok(Json(entries))
}
