//! Seller-side sales views and the report summary.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::OrderId;
use market_store::MarketStore;
use queries::{DailySales, SaleDetailView, SaleView, SellerReport};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::identity::Identity;

/// GET /sales — orders the acting seller has at least one line in.
pub async fn list<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
) -> Result<Json<Vec<SaleView>>, ApiError> {
    Ok(Json(state.seller_sales.list(actor).await?))
}

/// GET /sales/report — the acting seller's aggregate summary.
pub async fn report<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
) -> Result<Json<SellerReport>, ApiError> {
    Ok(Json(state.seller_sales.report(actor).await?))
}

/// GET /sales/daily — revenue per day over the last 30 days, for charts.
pub async fn daily<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
) -> Result<Json<Vec<DailySales>>, ApiError> {
    Ok(Json(state.seller_sales.daily(actor).await?))
}

/// GET /sales/{order_id} — one sale, restricted to the seller's lines.
pub async fn get<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<Uuid>,
    Identity(actor): Identity,
) -> Result<Json<SaleDetailView>, ApiError> {
    let detail = state
        .seller_sales
        .get(OrderId::from_uuid(order_id), actor)
        .await?;
    Ok(Json(detail))
}
