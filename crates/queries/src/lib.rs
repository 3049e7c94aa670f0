//! Read side of the marketplace core.
//!
//! Buyers see their own orders with shipments and tracking URLs; sellers see
//! the orders they have at least one line in, restricted to their own lines
//! and shipments, plus an aggregate sales report and a per-day revenue
//! series. All scoping failures surface as `NotFound` so existence never
//! leaks across identities.

mod buyer;
mod error;
mod seller;
mod views;

pub use buyer::BuyerOrders;
pub use error::{QueryError, Result};
pub use seller::{DailySales, ProductSales, SaleDetailView, SaleView, SellerReport, SellerSales};
pub use views::{OrderItemView, OrderView, ShipmentView};
