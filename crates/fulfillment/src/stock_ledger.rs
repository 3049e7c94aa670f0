//! Stock ledger operations: audited relative stock adjustments.

use common::{ProductId, UserId};
use domain::StockLogEntry;
use market_store::MarketStore;

use crate::error::{EngineError, Result};

/// Applies audited stock deltas and serves the audit trail.
///
/// Adjustments are always relative. Callers state the delta they observed
/// (a delivery of 20 units, a spoilage of 3), never an absolute target, so
/// two adjusters racing on the same product both land.
pub struct StockLedger<S: MarketStore> {
    store: S,
}

impl<S: MarketStore> StockLedger<S> {
    /// Creates a new stock ledger over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Applies a signed stock delta to a product on behalf of `actor` and
    /// returns the audit entry that recorded it. The reason may be empty;
    /// only the delta is required to be non-zero.
    #[tracing::instrument(skip(self), fields(%product_id, change))]
    pub async fn adjust(
        &self,
        product_id: ProductId,
        change: i32,
        actor: Option<UserId>,
        reason: &str,
    ) -> Result<StockLogEntry> {
        if change == 0 {
            return Err(EngineError::InvalidArgument(
                "stock adjustment must be non-zero".to_string(),
            ));
        }

        let entry = self.store.adjust_stock(product_id, change, actor, reason).await?;

        metrics::counter!("stock_adjustments_total").increment(1);
        tracing::info!(change = entry.change, "stock adjusted");
        Ok(entry)
    }

    /// Returns a product's audit trail, newest entry first.
    pub async fn history(&self, product_id: ProductId) -> Result<Vec<StockLogEntry>> {
        if self.store.get_product(product_id).await?.is_none() {
            return Err(EngineError::Store(market_store::StoreError::NotFound(
                "product",
            )));
        }
        Ok(self.store.stock_log(product_id).await?)
    }
}
