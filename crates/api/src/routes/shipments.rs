//! Seller-side shipment endpoints and buyer delivery confirmation.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{OrderId, OrderItemId, ProviderId, ShipmentId};
use domain::{NewShipment, Shipment};
use market_store::MarketStore;
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::identity::Identity;

#[derive(Deserialize)]
pub struct CreateShipmentRequest {
    pub order_id: OrderId,
    pub order_item_ids: Vec<OrderItemId>,
    pub logistics_provider_id: ProviderId,
    pub tracking_number: String,
}

/// POST /shipments — group the acting seller's items into a shipment.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Json(req): Json<CreateShipmentRequest>,
) -> Result<(StatusCode, Json<Shipment>), ApiError> {
    let request = NewShipment {
        order_id: req.order_id,
        order_item_ids: req.order_item_ids,
        logistics_provider_id: req.logistics_provider_id,
        tracking_number: req.tracking_number,
    };
    let shipment = state.shipments.create_shipment(actor, &request).await?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

/// POST /shipments/{id}/deliver — buyer confirms delivery.
#[tracing::instrument(skip(state))]
pub async fn deliver<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(shipment_id): Path<Uuid>,
    Identity(actor): Identity,
) -> Result<Json<Shipment>, ApiError> {
    let shipment = state
        .shipments
        .confirm_delivery(ShipmentId::from_uuid(shipment_id), actor)
        .await?;
    Ok(Json(shipment))
}
