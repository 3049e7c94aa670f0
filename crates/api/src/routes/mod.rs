//! HTTP route handlers.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod sales;
pub mod shipments;
pub mod stock;
