//! Serializable view structs shared by the buyer and seller read sides.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, OrderItemId, ProductId, ProfileId, ShipmentId};
use domain::{OrderItem, OrderStatus, OrderWithItems, Shipment, ShipmentStatus};
use market_store::MarketStore;
use serde::Serialize;

use crate::Result;

/// One order line as presented to buyers and sellers.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemView {
    pub id: OrderItemId,
    pub product_id: Option<ProductId>,
    pub seller_profile: ProfileId,
    pub quantity: u32,
    pub price_at_purchase: Money,
    pub line_total: Money,
    pub status: String,
    pub shipment_id: Option<ShipmentId>,
}

impl From<OrderItem> for OrderItemView {
    fn from(item: OrderItem) -> Self {
        let line_total = item.line_total();
        Self {
            id: item.id,
            product_id: item.product_id,
            seller_profile: item.seller_profile,
            quantity: item.quantity,
            price_at_purchase: item.price_at_purchase,
            line_total,
            status: item.status,
            shipment_id: item.shipment_id,
        }
    }
}

/// A shipment as presented to its order's buyer or its seller, with the
/// tracking URL rendered from the provider's template when available.
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentView {
    pub id: ShipmentId,
    pub seller_profile: ProfileId,
    pub tracking_number: String,
    pub status: ShipmentStatus,
    pub shipped_date: Option<DateTime<Utc>>,
    pub delivered_date: Option<DateTime<Utc>>,
    pub tracking_url: Option<String>,
}

/// A buyer's view of one of their orders.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub shipping_address: String,
    pub items: Vec<OrderItemView>,
    pub shipments: Vec<ShipmentView>,
}

/// Renders a shipment with its tracking URL resolved against the provider.
pub(crate) async fn shipment_view<S: MarketStore>(
    store: &S,
    shipment: Shipment,
) -> Result<ShipmentView> {
    let tracking_url = match shipment.logistics_provider {
        Some(provider_id) => store
            .get_provider(provider_id)
            .await?
            .and_then(|p| p.tracking_url(&shipment.tracking_number)),
        None => None,
    };

    Ok(ShipmentView {
        id: shipment.id,
        seller_profile: shipment.seller_profile,
        tracking_number: shipment.tracking_number,
        status: shipment.status,
        shipped_date: shipment.shipped_date,
        delivered_date: shipment.delivered_date,
        tracking_url,
    })
}

/// Assembles the full buyer-facing order view with shipments.
pub(crate) async fn order_view<S: MarketStore>(
    store: &S,
    order: OrderWithItems,
) -> Result<OrderView> {
    let mut shipments = Vec::new();
    for shipment in store.shipments_for_order(order.order.id).await? {
        shipments.push(shipment_view(store, shipment).await?);
    }

    Ok(OrderView {
        id: order.order.id,
        order_date: order.order.order_date,
        status: order.order.status,
        total_amount: order.order.total_amount,
        shipping_address: order.order.shipping_address,
        items: order.items.into_iter().map(OrderItemView::from).collect(),
        shipments,
    })
}
