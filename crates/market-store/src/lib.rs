//! Storage seam for the marketplace core.
//!
//! The [`MarketStore`] trait exposes every multi-step mutation of the system
//! as a single atomic operation: stock adjustment, order placement and
//! cancellation, shipment creation, and delivery confirmation, plus the thin
//! scoped reads the query layer builds on. Two implementations are provided:
//! [`PostgresMarketStore`] (one SQL transaction per operation, row locks on
//! products) and [`InMemoryMarketStore`] for tests.

mod error;
mod memory;
mod postgres;
mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryMarketStore;
pub use postgres::PostgresMarketStore;
pub use store::{MarketStore, PricedLine, order_total, price_line};
