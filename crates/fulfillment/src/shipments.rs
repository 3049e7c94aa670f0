//! Shipment creation and delivery confirmation.

use common::{Actor, ShipmentId};
use domain::{NewShipment, Shipment};
use market_store::MarketStore;

use crate::error::{EngineError, Result};

/// Seller-side shipment creation and buyer-side delivery confirmation.
pub struct ShipmentEngine<S: MarketStore> {
    store: S,
}

impl<S: MarketStore> ShipmentEngine<S> {
    /// Creates a new shipment engine over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Groups a batch of the acting seller's order items into one shipment.
    ///
    /// The batch is validated as a whole; a single invalid, foreign, or
    /// already-shipped item rejects the entire request.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id, seller = %actor.profile, items = request.order_item_ids.len()))]
    pub async fn create_shipment(&self, actor: Actor, request: &NewShipment) -> Result<Shipment> {
        if request.order_item_ids.is_empty() {
            return Err(EngineError::InvalidArgument(
                "a shipment needs at least one item".to_string(),
            ));
        }
        if request.tracking_number.trim().is_empty() {
            return Err(EngineError::InvalidArgument(
                "a tracking number is required".to_string(),
            ));
        }

        let shipment = self.store.create_shipment(request, actor.profile).await?;

        metrics::counter!("shipments_created_total").increment(1);
        tracing::info!(shipment_id = %shipment.id, "shipment created");
        Ok(shipment)
    }

    /// Marks a shipment delivered on behalf of the buyer who placed its
    /// order. The order completes once its last shipment is delivered.
    #[tracing::instrument(skip(self), fields(%shipment_id, user = %actor.user))]
    pub async fn confirm_delivery(
        &self,
        shipment_id: ShipmentId,
        actor: Actor,
    ) -> Result<Shipment> {
        let shipment = self.store.confirm_delivery(shipment_id, actor.user).await?;

        metrics::counter!("deliveries_confirmed_total").increment(1);
        tracing::info!(order_id = %shipment.order_id, "delivery confirmed");
        Ok(shipment)
    }
}
