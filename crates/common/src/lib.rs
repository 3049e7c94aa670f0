//! Shared identifier, money, and actor types used across the marketplace core.

mod money;
mod types;

pub use money::Money;
pub use types::{
    Actor, OrderId, OrderItemId, ProductId, ProfileId, ProviderId, ShipmentId, StockLogId, UserId,
};
