//! Marketplace domain layer: entities, value types, and the order and
//! shipment status state machines.
//!
//! This crate is pure data and rules; persistence lives in `market-store`
//! and the operations that drive these state machines live in `fulfillment`.

mod error;
mod order;
mod product;
mod shipment;
mod stock;

pub use error::StatusParseError;
pub use order::{CartLine, Order, OrderItem, OrderStatus, OrderWithItems};
pub use product::{NewProduct, Product};
pub use shipment::{LogisticsProvider, NewProvider, NewShipment, Shipment, ShipmentStatus};
pub use stock::StockLogEntry;
