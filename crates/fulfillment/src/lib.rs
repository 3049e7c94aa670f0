//! Fulfillment engines for the marketplace core.
//!
//! Three thin services sit between the HTTP surface and the store: the
//! [`StockLedger`] for audited stock adjustments, the [`OrderEngine`] for
//! placement and cancellation, and the [`ShipmentEngine`] for seller
//! shipments and buyer delivery confirmation. Each validates the request
//! shape, delegates the atomic work to the store, and emits telemetry.

mod error;
mod orders;
mod shipments;
mod stock_ledger;

pub use error::{EngineError, Result};
pub use orders::OrderEngine;
pub use shipments::ShipmentEngine;
pub use stock_ledger::StockLedger;
