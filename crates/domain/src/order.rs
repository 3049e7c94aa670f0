use chrono::{DateTime, Utc};
use common::{Money, OrderId, OrderItemId, ProductId, ProfileId, ShipmentId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::StatusParseError;

/// The status of an order in its lifecycle.
///
/// Transitions:
/// ```text
/// pending ──┬──► processing ──► shipped ──► completed
///           │         ▲            ▲
///           ├─────────┴────────────┘   (shipment coverage recompute)
///           └──► cancelled
/// ```
///
/// Status is driven by the order and shipment engines, never edited
/// directly: shipment creation recomputes `processing`/`shipped` from
/// coverage, delivery confirmation drives `completed`, and cancellation is
/// only reachable from `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, stock reserved, nothing shipped yet.
    #[default]
    Pending,

    /// At least one item shipped, at least one still unshipped.
    Processing,

    /// Every item belongs to a shipment.
    Shipped,

    /// Every shipment delivered (terminal).
    Completed,

    /// Cancelled by the buyer while still pending (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the buyer may still cancel the order.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if sellers may still create shipments against the order.
    pub fn can_accept_shipments(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Recomputes the status from fulfillment coverage: the number of items
    /// assigned to some shipment versus the order's total item count.
    ///
    /// Runs after every shipment creation so the status always reflects the
    /// latest coverage.
    pub fn from_coverage(total_items: usize, shipped_items: usize) -> OrderStatus {
        if total_items > 0 && shipped_items == total_items {
            OrderStatus::Shipped
        } else {
            OrderStatus::Processing
        }
    }

    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(StatusParseError::new("order", other)),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A `(product, quantity)` pair submitted at order placement time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// An order placed by a buyer against one or more sellers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub placing_user: UserId,
    pub buyer_profile: ProfileId,
    pub order_date: DateTime<Utc>,
    /// Sum of `quantity x price_at_purchase` over the items, fixed at
    /// placement time and never recomputed.
    pub total_amount: Money,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub tracking_number: Option<String>,
}

/// One line of an order.
///
/// Immutable after creation except for the `shipment` reference, which moves
/// from `None` to `Some` exactly once when a seller ships the item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    /// The purchased product, if it still exists in the catalog.
    pub product_id: Option<ProductId>,
    /// Seller at purchase time, denormalized so the item survives product
    /// deletion.
    pub seller_profile: ProfileId,
    pub quantity: u32,
    /// Unit price snapshot, immune to later catalog price changes.
    pub price_at_purchase: Money,
    pub status: String,
    pub shipment_id: Option<ShipmentId>,
}

impl OrderItem {
    /// The line's contribution to the order total.
    pub fn line_total(&self) -> Money {
        self.price_at_purchase.times(self.quantity)
    }
}

/// An order together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderWithItems {
    /// Recomputes the item-derived total, for checks against
    /// `order.total_amount`.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}
