//! Order placement and cancellation.

use common::{Actor, OrderId};
use domain::{CartLine, Order, OrderWithItems};
use market_store::MarketStore;

use crate::error::{EngineError, Result};

/// Converts carts into orders and handles buyer-initiated cancellation.
///
/// Everything transactional lives in the store; this layer owns request
/// validation and telemetry.
pub struct OrderEngine<S: MarketStore> {
    store: S,
}

impl<S: MarketStore> OrderEngine<S> {
    /// Creates a new order engine over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Places an order for `actor` from the given cart lines.
    ///
    /// The cart must be non-empty with strictly positive quantities and a
    /// shipping address. Stock reservation is all-or-nothing: if any line
    /// cannot be covered, nothing is committed.
    #[tracing::instrument(skip(self, lines, shipping_address), fields(user = %actor.user, lines = lines.len()))]
    pub async fn place_order(
        &self,
        actor: Actor,
        lines: &[CartLine],
        shipping_address: &str,
    ) -> Result<OrderWithItems> {
        if lines.is_empty() {
            return Err(EngineError::InvalidArgument(
                "an order needs at least one item".to_string(),
            ));
        }
        if lines.iter().any(|line| line.quantity == 0) {
            return Err(EngineError::InvalidArgument(
                "item quantities must be at least 1".to_string(),
            ));
        }
        let shipping_address = shipping_address.trim();
        if shipping_address.is_empty() {
            return Err(EngineError::InvalidArgument(
                "a shipping address is required".to_string(),
            ));
        }

        let placed = self
            .store
            .place_order(actor.user, actor.profile, lines, shipping_address)
            .await?;

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(
            order_id = %placed.order.id,
            total = %placed.order.total_amount,
            "order placed"
        );
        Ok(placed)
    }

    /// Cancels a pending order placed by `actor`, restoring stock.
    #[tracing::instrument(skip(self), fields(%order_id, user = %actor.user))]
    pub async fn cancel_order(&self, order_id: OrderId, actor: Actor) -> Result<Order> {
        let order = self.store.cancel_order(order_id, actor.user).await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(%order_id, "order cancelled");
        Ok(order)
    }
}
