//! Buyer-scoped order views.

use common::{Actor, OrderId};
use market_store::{MarketStore, StoreError};

use crate::Result;
use crate::views::{OrderView, order_view};

/// Read side for buyers: their orders, with items and shipments.
///
/// Scoping is by buyer profile; an order outside the acting profile is
/// reported as `NotFound`, never as forbidden, so existence does not leak.
pub struct BuyerOrders<S: MarketStore> {
    store: S,
}

impl<S: MarketStore> BuyerOrders<S> {
    /// Creates a new buyer read side over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists the acting profile's orders, newest first.
    pub async fn list(&self, actor: Actor) -> Result<Vec<OrderView>> {
        let orders = self.store.orders_for_buyer(actor.profile).await?;
        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            views.push(order_view(&self.store, order).await?);
        }
        Ok(views)
    }

    /// Fetches one of the acting profile's orders.
    pub async fn get(&self, order_id: OrderId, actor: Actor) -> Result<OrderView> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .filter(|o| o.order.buyer_profile == actor.profile)
            .ok_or(StoreError::NotFound("order"))?;
        order_view(&self.store, order).await
    }
}
