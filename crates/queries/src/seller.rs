//! Seller-scoped sales views and the report summary.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use common::{Actor, Money, OrderId, ProductId};
use domain::{OrderItem, OrderStatus};
use market_store::{MarketStore, StoreError};
use serde::Serialize;

use crate::Result;
use crate::views::{OrderItemView, ShipmentView, shipment_view};

/// One order as seen by a seller: only the lines they sold.
#[derive(Debug, Clone, Serialize)]
pub struct SaleView {
    pub order_id: OrderId,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    pub items: Vec<OrderItemView>,
}

/// A seller's detail view of one sale, with their shipments.
#[derive(Debug, Clone, Serialize)]
pub struct SaleDetailView {
    pub order_id: OrderId,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    pub shipping_address: String,
    pub items: Vec<OrderItemView>,
    pub shipments: Vec<ShipmentView>,
}

/// Quantity sold per product, for the report's top-products list.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSales {
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity_sold: u64,
}

/// Revenue of one calendar day, for the seller's sales chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub revenue: Money,
}

/// Aggregate summary of a seller's sales.
#[derive(Debug, Clone, Serialize)]
pub struct SellerReport {
    pub total_revenue: Money,
    pub total_orders: u64,
    pub products_sold: u64,
    pub top_products: Vec<ProductSales>,
}

/// Read side for sellers: orders containing at least one item they sold.
///
/// Sellers never see other sellers' lines, the buyer's identity, or orders
/// they have no item in; the last case reports `NotFound`.
pub struct SellerSales<S: MarketStore> {
    store: S,
}

impl<S: MarketStore> SellerSales<S> {
    /// Creates a new seller read side over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists the acting seller's sales, newest order first.
    pub async fn list(&self, actor: Actor) -> Result<Vec<SaleView>> {
        let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for item in self.store.items_sold_by(actor.profile).await? {
            by_order.entry(item.order_id).or_default().push(item);
        }

        let mut sales = Vec::with_capacity(by_order.len());
        for (order_id, items) in by_order {
            let Some(order) = self.store.get_order(order_id).await? else {
                continue;
            };
            sales.push(SaleView {
                order_id,
                order_date: order.order.order_date,
                order_status: order.order.status,
                items: items.into_iter().map(OrderItemView::from).collect(),
            });
        }
        sales.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(sales)
    }

    /// Fetches one sale, restricted to the acting seller's lines and
    /// shipments.
    pub async fn get(&self, order_id: OrderId, actor: Actor) -> Result<SaleDetailView> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(StoreError::NotFound("order"))?;

        let items: Vec<OrderItem> = order
            .items
            .into_iter()
            .filter(|item| item.seller_profile == actor.profile)
            .collect();
        if items.is_empty() {
            return Err(StoreError::NotFound("order").into());
        }

        let mut shipments = Vec::new();
        for shipment in self.store.shipments_for_order(order_id).await? {
            if shipment.seller_profile == actor.profile {
                shipments.push(shipment_view(&self.store, shipment).await?);
            }
        }

        Ok(SaleDetailView {
            order_id,
            order_date: order.order.order_date,
            order_status: order.order.status,
            shipping_address: order.order.shipping_address,
            items: items.into_iter().map(OrderItemView::from).collect(),
            shipments,
        })
    }

    /// Summarizes the acting seller's sales: revenue at purchase prices,
    /// distinct orders and products, and the top five products by quantity.
    pub async fn report(&self, actor: Actor) -> Result<SellerReport> {
        let items = self.store.items_sold_by(actor.profile).await?;

        let mut total_revenue = Money::ZERO;
        let mut orders: HashSet<OrderId> = HashSet::new();
        let mut per_product: HashMap<Option<ProductId>, u64> = HashMap::new();
        for item in &items {
            total_revenue += item.line_total();
            orders.insert(item.order_id);
            *per_product.entry(item.product_id).or_default() += u64::from(item.quantity);
        }

        let products_sold = per_product.keys().filter(|p| p.is_some()).count() as u64;

        let mut top_products = Vec::with_capacity(per_product.len());
        for (product_id, quantity_sold) in per_product {
            let product_name = match product_id {
                Some(id) => match self.store.get_product(id).await? {
                    Some(product) => product.name,
                    None => "deleted product".to_string(),
                },
                None => "deleted product".to_string(),
            };
            top_products.push(ProductSales {
                product_id,
                product_name,
                quantity_sold,
            });
        }
        top_products.sort_by(|a, b| b.quantity_sold.cmp(&a.quantity_sold));
        top_products.truncate(5);

        Ok(SellerReport {
            total_revenue,
            total_orders: orders.len() as u64,
            products_sold,
            top_products,
        })
    }

    /// Revenue per calendar day over the last 30 days, oldest day first.
    /// Days without sales are omitted.
    pub async fn daily(&self, actor: Actor) -> Result<Vec<DailySales>> {
        let since = Utc::now() - Duration::days(30);

        let mut by_order: HashMap<OrderId, Money> = HashMap::new();
        for item in self.store.items_sold_by(actor.profile).await? {
            *by_order.entry(item.order_id).or_insert(Money::ZERO) += item.line_total();
        }

        let mut per_day: HashMap<NaiveDate, Money> = HashMap::new();
        for (order_id, revenue) in by_order {
            let Some(order) = self.store.get_order(order_id).await? else {
                continue;
            };
            if order.order.order_date < since {
                continue;
            }
            *per_day
                .entry(order.order.order_date.date_naive())
                .or_insert(Money::ZERO) += revenue;
        }

        let mut days: Vec<DailySales> = per_day
            .into_iter()
            .map(|(date, revenue)| DailySales { date, revenue })
            .collect();
        days.sort_by_key(|d| d.date);
        Ok(days)
    }
}
