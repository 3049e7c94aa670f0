use chrono::{DateTime, Utc};
use common::{ProductId, StockLogId, UserId};
use serde::{Deserialize, Serialize};

/// One immutable entry in a product's stock audit trail.
///
/// Every committed stock mutation produces exactly one entry whose `change`
/// equals the applied delta; the trail is append-only and displayed newest
/// first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLogEntry {
    pub id: StockLogId,
    pub product_id: ProductId,
    /// Signed delta: positive added stock, negative removed it.
    pub change: i32,
    pub reason: String,
    /// The acting user, if still known. The entry outlives deleted actors.
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}
