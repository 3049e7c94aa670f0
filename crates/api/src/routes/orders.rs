//! Buyer-side order endpoints: placement, cancellation, and views.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::OrderId;
use domain::{CartLine, Order};
use market_store::MarketStore;
use queries::OrderView;
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::identity::Identity;

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<CartLine>,
    pub shipping_address: String,
}

/// POST /orders — place an order from a cart.
#[tracing::instrument(skip(state, req))]
pub async fn place<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderView>), ApiError> {
    let placed = state
        .orders
        .place_order(actor, &req.items, &req.shipping_address)
        .await?;
    let view = state.buyer_orders.get(placed.order.id, actor).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /orders — the acting profile's orders, newest first.
pub async fn list<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    Ok(Json(state.buyer_orders.list(actor).await?))
}

/// GET /orders/{id} — one of the acting profile's orders.
pub async fn get<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<Uuid>,
    Identity(actor): Identity,
) -> Result<Json<OrderView>, ApiError> {
    let view = state
        .buyer_orders
        .get(OrderId::from_uuid(order_id), actor)
        .await?;
    Ok(Json(view))
}

/// POST /orders/{id}/cancel — cancel a pending order, restoring stock.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<Uuid>,
    Identity(actor): Identity,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orders
        .cancel_order(OrderId::from_uuid(order_id), actor)
        .await?;
    Ok(Json(order))
}
