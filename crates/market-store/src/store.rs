use async_trait::async_trait;
use common::{Money, OrderId, OrderItemId, ProductId, ProfileId, ProviderId, ShipmentId, UserId};
use domain::{
    CartLine, LogisticsProvider, NewProduct, NewProvider, NewShipment, Order, OrderItem,
    OrderWithItems, Product, Shipment, StockLogEntry,
};

use crate::{Result, StoreError};

/// Core trait for marketplace storage implementations.
///
/// Each mutating method executes as one atomic operation: it either commits
/// all of its effects or none of them, and no intermediate state is ever
/// observable. Concurrent calls touching the same product serialize on that
/// product's row. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait MarketStore: Send + Sync {
    // -- Catalog boundary (external collaborator; no core logic) --

    /// Registers a product.
    async fn insert_product(&self, new: NewProduct) -> Result<Product>;

    /// Fetches a product by id.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Removes a product from the catalog. Existing order items survive with
    /// their price snapshot; the product reference on them becomes null.
    async fn delete_product(&self, id: ProductId) -> Result<()>;

    /// Registers a logistics provider.
    async fn insert_provider(&self, new: NewProvider) -> Result<LogisticsProvider>;

    /// Fetches a logistics provider by id.
    async fn get_provider(&self, id: ProviderId) -> Result<Option<LogisticsProvider>>;

    // -- Stock ledger --

    /// Atomically applies a signed stock delta to a product and appends the
    /// matching audit entry.
    ///
    /// Fails with [`StoreError::NotFound`] if the product does not exist and
    /// with [`StoreError::InsufficientStock`] if the delta would take the
    /// quantity below zero; in both cases nothing is changed.
    async fn adjust_stock(
        &self,
        product_id: ProductId,
        change: i32,
        actor: Option<UserId>,
        reason: &str,
    ) -> Result<StockLogEntry>;

    /// Returns a product's audit trail, newest entry first.
    async fn stock_log(&self, product_id: ProductId) -> Result<Vec<StockLogEntry>>;

    // -- Order engine --

    /// Converts a cart into an order with a consistent price snapshot and an
    /// all-or-nothing stock reservation.
    ///
    /// Every line is validated against committed stock before any decrement
    /// is applied; if any line fails, no order, no items, and no stock
    /// mutation commit. Each reserved product gains one audit entry.
    async fn place_order(
        &self,
        placing_user: UserId,
        buyer_profile: ProfileId,
        lines: &[CartLine],
        shipping_address: &str,
    ) -> Result<OrderWithItems>;

    /// Cancels a pending order placed by `requesting_user`, restoring stock
    /// for every item whose product still exists.
    ///
    /// Restoration is best-effort per item: an item whose product was
    /// deleted is skipped, since there is nothing to restore onto.
    async fn cancel_order(&self, order_id: OrderId, requesting_user: UserId) -> Result<Order>;

    // -- Shipment engine --

    /// Groups a seller-owned subset of an order's items into a shipment and
    /// recomputes the order status from fulfillment coverage.
    ///
    /// The requested items must all belong to the order and be sold by the
    /// acting seller, and none may already belong to a shipment; otherwise
    /// the whole batch is rejected with [`StoreError::Validation`].
    async fn create_shipment(
        &self,
        request: &NewShipment,
        seller_profile: ProfileId,
    ) -> Result<Shipment>;

    /// Marks a shipment delivered on behalf of the user who placed its
    /// order, completing the order once every shipment is delivered.
    async fn confirm_delivery(
        &self,
        shipment_id: ShipmentId,
        requesting_user: UserId,
    ) -> Result<Shipment>;

    // -- Scoped reads for the query layer --

    /// Fetches an order with its items, unscoped. Callers are responsible
    /// for visibility checks.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderWithItems>>;

    /// Lists a buyer profile's orders with items, newest first.
    async fn orders_for_buyer(&self, buyer_profile: ProfileId) -> Result<Vec<OrderWithItems>>;

    /// Lists every order item sold by a seller profile.
    async fn items_sold_by(&self, seller_profile: ProfileId) -> Result<Vec<OrderItem>>;

    /// Lists the shipments of an order.
    async fn shipments_for_order(&self, order_id: OrderId) -> Result<Vec<Shipment>>;
}

/// One cart line validated against a product row: the quantity plus the
/// price and seller snapshot taken at placement time.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub seller_profile: ProfileId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl PricedLine {
    /// The line's contribution to the order total.
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }

    /// Materializes the line as an order item for `order_id`.
    pub fn into_order_item(self, order_id: OrderId) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(),
            order_id,
            product_id: Some(self.product_id),
            seller_profile: self.seller_profile,
            quantity: self.quantity,
            price_at_purchase: self.unit_price,
            status: "processing".to_string(),
            shipment_id: None,
        }
    }
}

/// Validates one cart line against the product row it was resolved to and
/// snapshots the price. Shared by both store backends so sufficiency checks
/// cannot drift between them.
pub fn price_line(product: &Product, line: &CartLine) -> Result<PricedLine> {
    if i64::from(product.stock_quantity) < i64::from(line.quantity) {
        return Err(StoreError::InsufficientStock {
            product: product.name.clone(),
            requested: i64::from(line.quantity),
            available: i64::from(product.stock_quantity),
        });
    }

    Ok(PricedLine {
        product_id: product.id,
        seller_profile: product.seller_profile,
        product_name: product.name.clone(),
        quantity: line.quantity,
        unit_price: product.price,
    })
}

/// Sums the line totals into the order total fixed at creation time.
pub fn order_total(lines: &[PricedLine]) -> Money {
    lines.iter().map(PricedLine::line_total).sum()
}
