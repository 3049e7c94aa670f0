use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, OrderItemId, ProductId, ProfileId, ProviderId, ShipmentId, StockLogId, UserId};
use domain::{
    CartLine, LogisticsProvider, NewProduct, NewProvider, NewShipment, Order, OrderItem,
    OrderStatus, OrderWithItems, Product, Shipment, ShipmentStatus, StockLogEntry,
};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{MarketStore, order_total, price_line},
};

#[derive(Debug, Default)]
struct MemoryState {
    products: HashMap<ProductId, Product>,
    stock_logs: Vec<StockLogEntry>,
    orders: HashMap<OrderId, Order>,
    order_items: HashMap<OrderItemId, OrderItem>,
    shipments: HashMap<ShipmentId, Shipment>,
    providers: HashMap<ProviderId, LogisticsProvider>,
}

impl MemoryState {
    fn items_of_order(&self, order_id: OrderId) -> Vec<OrderItem> {
        let mut items: Vec<_> = self
            .order_items
            .values()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.id.as_uuid());
        items
    }

    fn append_stock_log(
        &mut self,
        product_id: ProductId,
        change: i32,
        actor: Option<UserId>,
        reason: &str,
    ) -> StockLogEntry {
        let entry = StockLogEntry {
            id: StockLogId::new(),
            product_id,
            change,
            reason: reason.to_string(),
            created_by: actor,
            created_at: Utc::now(),
        };
        self.stock_logs.push(entry.clone());
        entry
    }

    fn product_label(&self, product_id: Option<ProductId>) -> String {
        product_id
            .and_then(|id| self.products.get(&id))
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "deleted product".to_string())
    }
}

/// In-memory market store for testing.
///
/// One lock guards the whole state, so every operation is trivially atomic
/// and serialized; behavior matches the PostgreSQL implementation, where the
/// same serialization comes from transactions and product row locks.
#[derive(Clone, Default)]
pub struct InMemoryMarketStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryMarketStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stock audit entries.
    pub async fn stock_log_count(&self) -> usize {
        self.state.read().await.stock_logs.len()
    }
}

#[async_trait]
impl MarketStore for InMemoryMarketStore {
    async fn insert_product(&self, new: NewProduct) -> Result<Product> {
        let product = Product {
            id: ProductId::new(),
            seller_profile: new.seller_profile,
            name: new.name,
            price: new.price,
            stock_quantity: new.stock_quantity,
            is_active: true,
            created_at: Utc::now(),
        };
        self.state
            .write()
            .await
            .products
            .insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.products.remove(&id).is_none() {
            return Err(StoreError::NotFound("product"));
        }
        state.stock_logs.retain(|entry| entry.product_id != id);
        for item in state.order_items.values_mut() {
            if item.product_id == Some(id) {
                item.product_id = None;
            }
        }
        Ok(())
    }

    async fn insert_provider(&self, new: NewProvider) -> Result<LogisticsProvider> {
        let provider = LogisticsProvider {
            id: ProviderId::new(),
            name: new.name,
            tracking_url_template: new.tracking_url_template,
            is_active: new.is_active,
        };
        self.state
            .write()
            .await
            .providers
            .insert(provider.id, provider.clone());
        Ok(provider)
    }

    async fn get_provider(&self, id: ProviderId) -> Result<Option<LogisticsProvider>> {
        Ok(self.state.read().await.providers.get(&id).cloned())
    }

    async fn adjust_stock(
        &self,
        product_id: ProductId,
        change: i32,
        actor: Option<UserId>,
        reason: &str,
    ) -> Result<StockLogEntry> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .get_mut(&product_id)
            .ok_or(StoreError::NotFound("product"))?;

        if change < 0 && product.stock_quantity + change < 0 {
            return Err(StoreError::InsufficientStock {
                product: product.name.clone(),
                requested: i64::from(-change),
                available: i64::from(product.stock_quantity),
            });
        }

        // Mirrors the integer range the PostgreSQL column enforces.
        product.stock_quantity = product.stock_quantity.checked_add(change).ok_or_else(|| {
            StoreError::Validation("stock adjustment overflows the quantity range".to_string())
        })?;
        Ok(state.append_stock_log(product_id, change, actor, reason))
    }

    async fn stock_log(&self, product_id: ProductId) -> Result<Vec<StockLogEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<_> = state
            .stock_logs
            .iter()
            .filter(|entry| entry.product_id == product_id)
            .cloned()
            .collect();
        entries.reverse();
        Ok(entries)
    }

    async fn place_order(
        &self,
        placing_user: UserId,
        buyer_profile: ProfileId,
        lines: &[CartLine],
        shipping_address: &str,
    ) -> Result<OrderWithItems> {
        let mut state = self.state.write().await;

        // Validate and price every line before touching any quantity.
        let mut priced = Vec::with_capacity(lines.len());
        let mut required: HashMap<ProductId, i64> = HashMap::new();
        for line in lines {
            let product = state
                .products
                .get(&line.product_id)
                .ok_or(StoreError::NotFound("product"))?;
            priced.push(price_line(product, line)?);
            *required.entry(line.product_id).or_default() += i64::from(line.quantity);
        }

        // A product repeated across lines must be coverable by its stock in
        // aggregate, matching the conditional-update guard in PostgreSQL.
        for (product_id, total_required) in &required {
            let product = &state.products[product_id];
            if i64::from(product.stock_quantity) < *total_required {
                return Err(StoreError::InsufficientStock {
                    product: product.name.clone(),
                    requested: *total_required,
                    available: i64::from(product.stock_quantity),
                });
            }
        }

        let order = Order {
            id: OrderId::new(),
            placing_user,
            buyer_profile,
            order_date: Utc::now(),
            total_amount: order_total(&priced),
            status: OrderStatus::Pending,
            shipping_address: shipping_address.to_string(),
            tracking_number: None,
        };

        let mut items = Vec::with_capacity(priced.len());
        for line in priced {
            let product = state
                .products
                .get_mut(&line.product_id)
                .ok_or(StoreError::NotFound("product"))?;
            product.stock_quantity -= line.quantity as i32;
            state.append_stock_log(
                line.product_id,
                -(line.quantity as i32),
                Some(placing_user),
                "order placed",
            );
            items.push(line.into_order_item(order.id));
        }

        state.orders.insert(order.id, order.clone());
        for item in &items {
            state.order_items.insert(item.id, item.clone());
        }

        Ok(OrderWithItems { order, items })
    }

    async fn cancel_order(&self, order_id: OrderId, requesting_user: UserId) -> Result<Order> {
        let mut state = self.state.write().await;

        let order = state
            .orders
            .get(&order_id)
            .filter(|order| order.placing_user == requesting_user)
            .cloned()
            .ok_or(StoreError::NotFound("order"))?;

        if !order.status.can_cancel() {
            return Err(StoreError::InvalidTransition {
                entity: "order",
                action: "cancel",
                status: order.status.to_string(),
            });
        }

        // Best-effort restoration: items whose product was deleted are
        // skipped, there is nothing left to restore onto.
        let items = state.items_of_order(order_id);
        for item in items {
            let Some(product_id) = item.product_id else {
                continue;
            };
            let Some(product) = state.products.get_mut(&product_id) else {
                continue;
            };
            product.stock_quantity += item.quantity as i32;
            state.append_stock_log(
                product_id,
                item.quantity as i32,
                Some(requesting_user),
                "order cancelled",
            );
        }

        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::NotFound("order"))?;
        order.status = OrderStatus::Cancelled;
        Ok(order.clone())
    }

    async fn create_shipment(
        &self,
        request: &NewShipment,
        seller_profile: ProfileId,
    ) -> Result<Shipment> {
        let mut state = self.state.write().await;

        let order = state
            .orders
            .get(&request.order_id)
            .ok_or(StoreError::NotFound("order"))?;
        if !order.status.can_accept_shipments() {
            return Err(StoreError::InvalidTransition {
                entity: "order",
                action: "ship items of",
                status: order.status.to_string(),
            });
        }

        if !state.providers.contains_key(&request.logistics_provider_id) {
            return Err(StoreError::NotFound("logistics provider"));
        }

        // Resolve the batch restricted to this order and this seller. Any
        // unknown, foreign, or duplicated id shows up as a count mismatch.
        let resolved: Vec<OrderItem> = request
            .order_item_ids
            .iter()
            .filter_map(|id| state.order_items.get(id))
            .filter(|item| {
                item.order_id == request.order_id && item.seller_profile == seller_profile
            })
            .cloned()
            .collect();
        let mut unique: Vec<OrderItemId> = resolved.iter().map(|item| item.id).collect();
        unique.sort_by_key(OrderItemId::as_uuid);
        unique.dedup();
        if unique.len() != request.order_item_ids.len() {
            return Err(StoreError::Validation(
                "one or more items are invalid, do not belong to this order, or are not sold by you"
                    .to_string(),
            ));
        }

        for item in &resolved {
            if item.shipment_id.is_some() {
                return Err(StoreError::Validation(format!(
                    "item \"{}\" is already part of another shipment",
                    state.product_label(item.product_id)
                )));
            }
        }

        let shipment = Shipment {
            id: ShipmentId::new(),
            order_id: request.order_id,
            seller_profile,
            logistics_provider: Some(request.logistics_provider_id),
            tracking_number: request.tracking_number.clone(),
            status: ShipmentStatus::InTransit,
            shipped_date: Some(Utc::now()),
            delivered_date: None,
        };
        state.shipments.insert(shipment.id, shipment.clone());

        for item in &resolved {
            if let Some(stored) = state.order_items.get_mut(&item.id) {
                stored.shipment_id = Some(shipment.id);
            }
        }

        // Recompute order status from fulfillment coverage.
        let items = state.items_of_order(request.order_id);
        let shipped = items.iter().filter(|i| i.shipment_id.is_some()).count();
        let status = OrderStatus::from_coverage(items.len(), shipped);
        if let Some(order) = state.orders.get_mut(&request.order_id) {
            order.status = status;
        }

        Ok(shipment)
    }

    async fn confirm_delivery(
        &self,
        shipment_id: ShipmentId,
        requesting_user: UserId,
    ) -> Result<Shipment> {
        let mut state = self.state.write().await;

        let shipment = state
            .shipments
            .get(&shipment_id)
            .cloned()
            .ok_or(StoreError::NotFound("shipment"))?;
        let order = state
            .orders
            .get(&shipment.order_id)
            .filter(|order| order.placing_user == requesting_user)
            .ok_or(StoreError::NotFound("shipment"))?;
        let order_id = order.id;

        if !shipment.status.can_mark_delivered() {
            return Err(StoreError::InvalidTransition {
                entity: "shipment",
                action: "confirm delivery of",
                status: shipment.status.to_string(),
            });
        }

        let shipment = state
            .shipments
            .get_mut(&shipment_id)
            .ok_or(StoreError::NotFound("shipment"))?;
        shipment.status = ShipmentStatus::Delivered;
        shipment.delivered_date = Some(Utc::now());
        let shipment = shipment.clone();

        let all_delivered = state
            .shipments
            .values()
            .filter(|s| s.order_id == order_id)
            .all(|s| s.status == ShipmentStatus::Delivered);
        if all_delivered && let Some(order) = state.orders.get_mut(&order_id) {
            order.status = OrderStatus::Completed;
        }

        Ok(shipment)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderWithItems>> {
        let state = self.state.read().await;
        Ok(state.orders.get(&order_id).map(|order| OrderWithItems {
            order: order.clone(),
            items: state.items_of_order(order_id),
        }))
    }

    async fn orders_for_buyer(&self, buyer_profile: ProfileId) -> Result<Vec<OrderWithItems>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|order| order.buyer_profile == buyer_profile)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(orders
            .into_iter()
            .map(|order| {
                let items = state.items_of_order(order.id);
                OrderWithItems { order, items }
            })
            .collect())
    }

    async fn items_sold_by(&self, seller_profile: ProfileId) -> Result<Vec<OrderItem>> {
        let state = self.state.read().await;
        let mut items: Vec<_> = state
            .order_items
            .values()
            .filter(|item| item.seller_profile == seller_profile)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.id.as_uuid());
        Ok(items)
    }

    async fn shipments_for_order(&self, order_id: OrderId) -> Result<Vec<Shipment>> {
        let state = self.state.read().await;
        let mut shipments: Vec<_> = state
            .shipments
            .values()
            .filter(|s| s.order_id == order_id)
            .cloned()
            .collect();
        shipments.sort_by_key(|s| s.shipped_date);
        Ok(shipments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;

    async fn seed_product(store: &InMemoryMarketStore, stock: i32, price_cents: i64) -> Product {
        store
            .insert_product(NewProduct {
                seller_profile: ProfileId::new(),
                name: "Heirloom Tomatoes".to_string(),
                price: Money::from_cents(price_cents),
                stock_quantity: stock,
            })
            .await
            .unwrap()
    }

    async fn seed_provider(store: &InMemoryMarketStore) -> LogisticsProvider {
        store
            .insert_provider(NewProvider {
                name: "Acme Freight".to_string(),
                tracking_url_template: "https://tracker.example/?tn=".to_string(),
                is_active: true,
            })
            .await
            .unwrap()
    }

    fn line(product: &Product, quantity: u32) -> CartLine {
        CartLine {
            product_id: product.id,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_adjust_stock_applies_delta_and_logs() {
        let store = InMemoryMarketStore::new();
        let product = seed_product(&store, 10, 500).await;
        let actor = UserId::new();

        let entry = store
            .adjust_stock(product.id, -3, Some(actor), "damaged crates")
            .await
            .unwrap();
        assert_eq!(entry.change, -3);
        assert_eq!(entry.created_by, Some(actor));

        let product = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 7);

        let log = store.stock_log(product.id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].reason, "damaged crates");
    }

    #[tokio::test]
    async fn test_adjust_stock_declines_below_zero() {
        let store = InMemoryMarketStore::new();
        let product = seed_product(&store, 2, 500).await;

        let err = store
            .adjust_stock(product.id, -3, None, "oversold")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InsufficientStock { .. }));

        // Declined operation changed nothing.
        let product = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 2);
        assert_eq!(store.stock_log_count().await, 0);
    }

    #[tokio::test]
    async fn test_adjust_stock_declines_quantity_overflow() {
        let store = InMemoryMarketStore::new();
        let product = seed_product(&store, i32::MAX, 500).await;

        let err = store
            .adjust_stock(product.id, 1, None, "restock")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let product = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, i32::MAX);
        assert_eq!(store.stock_log_count().await, 0);
    }

    #[tokio::test]
    async fn test_adjust_stock_unknown_product_is_not_found() {
        let store = InMemoryMarketStore::new();
        let err = store
            .adjust_stock(ProductId::new(), 1, None, "")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("product")));
    }

    #[tokio::test]
    async fn test_concurrent_adjusts_never_go_negative() {
        let store = InMemoryMarketStore::new();
        let product = seed_product(&store, 5, 500).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            let product_id = product.id;
            handles.push(tokio::spawn(async move {
                store.adjust_stock(product_id, -1, None, "sale").await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        // Final quantity equals initial plus the sum of successful deltas.
        let product = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(successes, 5);
        assert_eq!(product.stock_quantity, 0);
        assert_eq!(store.stock_log_count().await, 5);
    }

    #[tokio::test]
    async fn test_place_order_snapshots_prices_and_reserves_stock() {
        let store = InMemoryMarketStore::new();
        let product = seed_product(&store, 10, 500).await;
        let buyer = UserId::new();

        let placed = store
            .place_order(
                buyer,
                ProfileId::new(),
                &[line(&product, 3)],
                "12 Greenhouse Lane",
            )
            .await
            .unwrap();

        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert_eq!(placed.order.total_amount, Money::from_cents(1500));
        assert_eq!(placed.items_total(), placed.order.total_amount);
        assert_eq!(placed.items.len(), 1);
        assert_eq!(placed.items[0].price_at_purchase, Money::from_cents(500));
        assert_eq!(placed.items[0].seller_profile, product.seller_profile);

        let product = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 7);

        // Reservation is audited.
        let log = store.stock_log(product.id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].change, -3);
        assert_eq!(log[0].reason, "order placed");
    }

    #[tokio::test]
    async fn test_later_price_changes_do_not_affect_placed_orders() {
        let store = InMemoryMarketStore::new();
        let product = seed_product(&store, 10, 500).await;

        let placed = store
            .place_order(UserId::new(), ProfileId::new(), &[line(&product, 2)], "addr")
            .await
            .unwrap();

        // Simulate a catalog price change after placement.
        {
            let mut state = store.state.write().await;
            state.products.get_mut(&product.id).unwrap().price = Money::from_cents(900);
        }

        let stored = store.get_order(placed.order.id).await.unwrap().unwrap();
        assert_eq!(stored.items[0].price_at_purchase, Money::from_cents(500));
        assert_eq!(stored.order.total_amount, Money::from_cents(1000));
    }

    #[tokio::test]
    async fn test_place_order_is_all_or_nothing() {
        let store = InMemoryMarketStore::new();
        let plenty = seed_product(&store, 10, 500).await;
        let scarce = seed_product(&store, 1, 250).await;

        let err = store
            .place_order(
                UserId::new(),
                ProfileId::new(),
                &[line(&plenty, 3), line(&scarce, 2)],
                "addr",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InsufficientStock { .. }));

        // Nothing committed: both stock levels unchanged, no order, no audit.
        assert_eq!(
            store
                .get_product(plenty.id)
                .await
                .unwrap()
                .unwrap()
                .stock_quantity,
            10
        );
        assert_eq!(
            store
                .get_product(scarce.id)
                .await
                .unwrap()
                .unwrap()
                .stock_quantity,
            1
        );
        assert_eq!(store.stock_log_count().await, 0);
        assert!(store.state.read().await.orders.is_empty());
    }

    #[tokio::test]
    async fn test_place_order_with_repeated_product_checks_aggregate_stock() {
        let store = InMemoryMarketStore::new();
        let product = seed_product(&store, 5, 500).await;

        let err = store
            .place_order(
                UserId::new(),
                ProfileId::new(),
                &[line(&product, 3), line(&product, 3)],
                "addr",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InsufficientStock { .. }));
        assert_eq!(
            store
                .get_product(product.id)
                .await
                .unwrap()
                .unwrap()
                .stock_quantity,
            5
        );
    }

    #[tokio::test]
    async fn test_place_order_unknown_product_is_not_found() {
        let store = InMemoryMarketStore::new();
        let err = store
            .place_order(
                UserId::new(),
                ProfileId::new(),
                &[CartLine {
                    product_id: ProductId::new(),
                    quantity: 1,
                }],
                "addr",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("product")));
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_and_is_terminal() {
        let store = InMemoryMarketStore::new();
        let product = seed_product(&store, 10, 500).await;
        let buyer = UserId::new();

        let placed = store
            .place_order(buyer, ProfileId::new(), &[line(&product, 3)], "addr")
            .await
            .unwrap();
        assert_eq!(
            store
                .get_product(product.id)
                .await
                .unwrap()
                .unwrap()
                .stock_quantity,
            7
        );

        let cancelled = store.cancel_order(placed.order.id, buyer).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(
            store
                .get_product(product.id)
                .await
                .unwrap()
                .unwrap()
                .stock_quantity,
            10
        );

        // Restoration is audited alongside the reservation.
        let log = store.stock_log(product.id).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].change, 3);
        assert_eq!(log[0].reason, "order cancelled");

        // Second cancellation is an invalid transition.
        let err = store
            .cancel_order(placed.order.id, buyer)
            .await
            .unwrap_err();
        match err {
            StoreError::InvalidTransition { status, .. } => assert_eq!(status, "cancelled"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_cancel_by_non_owner_is_not_found() {
        let store = InMemoryMarketStore::new();
        let product = seed_product(&store, 10, 500).await;

        let placed = store
            .place_order(UserId::new(), ProfileId::new(), &[line(&product, 1)], "addr")
            .await
            .unwrap();

        let err = store
            .cancel_order(placed.order.id, UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("order")));
    }

    #[tokio::test]
    async fn test_cancel_skips_deleted_products() {
        let store = InMemoryMarketStore::new();
        let kept = seed_product(&store, 10, 500).await;
        let doomed = seed_product(&store, 10, 250).await;
        let buyer = UserId::new();

        let placed = store
            .place_order(
                buyer,
                ProfileId::new(),
                &[line(&kept, 2), line(&doomed, 4)],
                "addr",
            )
            .await
            .unwrap();

        store.delete_product(doomed.id).await.unwrap();

        let cancelled = store.cancel_order(placed.order.id, buyer).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(
            store
                .get_product(kept.id)
                .await
                .unwrap()
                .unwrap()
                .stock_quantity,
            10
        );
        assert!(store.get_product(doomed.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_shipment_coverage_drives_order_status() {
        let store = InMemoryMarketStore::new();
        let provider = seed_provider(&store).await;
        let buyer = UserId::new();

        // Two sellers, one item each.
        let a = seed_product(&store, 10, 500).await;
        let b = seed_product(&store, 10, 250).await;
        let placed = store
            .place_order(buyer, ProfileId::new(), &[line(&a, 1), line(&b, 1)], "addr")
            .await
            .unwrap();

        let item_a = placed
            .items
            .iter()
            .find(|i| i.product_id == Some(a.id))
            .unwrap();
        let item_b = placed
            .items
            .iter()
            .find(|i| i.product_id == Some(b.id))
            .unwrap();

        // First seller ships their item: partial coverage.
        store
            .create_shipment(
                &NewShipment {
                    order_id: placed.order.id,
                    order_item_ids: vec![item_a.id],
                    logistics_provider_id: provider.id,
                    tracking_number: "TRK1".to_string(),
                },
                a.seller_profile,
            )
            .await
            .unwrap();
        let order = store.get_order(placed.order.id).await.unwrap().unwrap();
        assert_eq!(order.order.status, OrderStatus::Processing);

        // Second seller ships the last item: full coverage.
        let shipment_b = store
            .create_shipment(
                &NewShipment {
                    order_id: placed.order.id,
                    order_item_ids: vec![item_b.id],
                    logistics_provider_id: provider.id,
                    tracking_number: "TRK2".to_string(),
                },
                b.seller_profile,
            )
            .await
            .unwrap();
        assert_eq!(shipment_b.status, ShipmentStatus::InTransit);
        assert!(shipment_b.shipped_date.is_some());

        let order = store.get_order(placed.order.id).await.unwrap().unwrap();
        assert_eq!(order.order.status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn test_item_ships_at_most_once() {
        let store = InMemoryMarketStore::new();
        let provider = seed_provider(&store).await;
        let product = seed_product(&store, 10, 500).await;

        let placed = store
            .place_order(UserId::new(), ProfileId::new(), &[line(&product, 1)], "addr")
            .await
            .unwrap();
        let item = &placed.items[0];

        let first = store
            .create_shipment(
                &NewShipment {
                    order_id: placed.order.id,
                    order_item_ids: vec![item.id],
                    logistics_provider_id: provider.id,
                    tracking_number: "TRK1".to_string(),
                },
                product.seller_profile,
            )
            .await
            .unwrap();

        let err = store
            .create_shipment(
                &NewShipment {
                    order_id: placed.order.id,
                    order_item_ids: vec![item.id],
                    logistics_provider_id: provider.id,
                    tracking_number: "TRK2".to_string(),
                },
                product.seller_profile,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        // First shipment's assignment untouched.
        let order = store.get_order(placed.order.id).await.unwrap().unwrap();
        assert_eq!(order.items[0].shipment_id, Some(first.id));
    }

    #[tokio::test]
    async fn test_create_shipment_rejects_foreign_or_unknown_items() {
        let store = InMemoryMarketStore::new();
        let provider = seed_provider(&store).await;
        let product = seed_product(&store, 10, 500).await;

        let placed = store
            .place_order(UserId::new(), ProfileId::new(), &[line(&product, 1)], "addr")
            .await
            .unwrap();
        let item = &placed.items[0];

        // Acting as a different seller.
        let err = store
            .create_shipment(
                &NewShipment {
                    order_id: placed.order.id,
                    order_item_ids: vec![item.id],
                    logistics_provider_id: provider.id,
                    tracking_number: "TRK1".to_string(),
                },
                ProfileId::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        // Unknown item id in the batch.
        let err = store
            .create_shipment(
                &NewShipment {
                    order_id: placed.order.id,
                    order_item_ids: vec![item.id, OrderItemId::new()],
                    logistics_provider_id: provider.id,
                    tracking_number: "TRK1".to_string(),
                },
                product.seller_profile,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        // Rejected batches assign nothing.
        let order = store.get_order(placed.order.id).await.unwrap().unwrap();
        assert_eq!(order.items[0].shipment_id, None);
        assert_eq!(order.order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_create_shipment_requires_order_and_provider() {
        let store = InMemoryMarketStore::new();
        let provider = seed_provider(&store).await;
        let product = seed_product(&store, 10, 500).await;

        let err = store
            .create_shipment(
                &NewShipment {
                    order_id: OrderId::new(),
                    order_item_ids: vec![OrderItemId::new()],
                    logistics_provider_id: provider.id,
                    tracking_number: "TRK1".to_string(),
                },
                product.seller_profile,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("order")));

        let placed = store
            .place_order(UserId::new(), ProfileId::new(), &[line(&product, 1)], "addr")
            .await
            .unwrap();
        let err = store
            .create_shipment(
                &NewShipment {
                    order_id: placed.order.id,
                    order_item_ids: vec![placed.items[0].id],
                    logistics_provider_id: ProviderId::new(),
                    tracking_number: "TRK1".to_string(),
                },
                product.seller_profile,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("logistics provider")));
    }

    #[tokio::test]
    async fn test_cancelled_order_cannot_gain_shipments() {
        let store = InMemoryMarketStore::new();
        let provider = seed_provider(&store).await;
        let product = seed_product(&store, 10, 500).await;
        let buyer = UserId::new();

        let placed = store
            .place_order(buyer, ProfileId::new(), &[line(&product, 1)], "addr")
            .await
            .unwrap();
        store.cancel_order(placed.order.id, buyer).await.unwrap();

        let err = store
            .create_shipment(
                &NewShipment {
                    order_id: placed.order.id,
                    order_item_ids: vec![placed.items[0].id],
                    logistics_provider_id: provider.id,
                    tracking_number: "TRK1".to_string(),
                },
                product.seller_profile,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_delivery_confirmation_completes_the_order() {
        let store = InMemoryMarketStore::new();
        let provider = seed_provider(&store).await;
        let a = seed_product(&store, 10, 500).await;
        let b = seed_product(&store, 10, 250).await;
        let buyer = UserId::new();

        let placed = store
            .place_order(buyer, ProfileId::new(), &[line(&a, 1), line(&b, 1)], "addr")
            .await
            .unwrap();
        let item_a = placed
            .items
            .iter()
            .find(|i| i.product_id == Some(a.id))
            .unwrap();
        let item_b = placed
            .items
            .iter()
            .find(|i| i.product_id == Some(b.id))
            .unwrap();

        let ship_a = store
            .create_shipment(
                &NewShipment {
                    order_id: placed.order.id,
                    order_item_ids: vec![item_a.id],
                    logistics_provider_id: provider.id,
                    tracking_number: "TRK1".to_string(),
                },
                a.seller_profile,
            )
            .await
            .unwrap();
        let ship_b = store
            .create_shipment(
                &NewShipment {
                    order_id: placed.order.id,
                    order_item_ids: vec![item_b.id],
                    logistics_provider_id: provider.id,
                    tracking_number: "TRK2".to_string(),
                },
                b.seller_profile,
            )
            .await
            .unwrap();

        // One of two shipments delivered: order stays shipped.
        let delivered = store.confirm_delivery(ship_a.id, buyer).await.unwrap();
        assert_eq!(delivered.status, ShipmentStatus::Delivered);
        assert!(delivered.delivered_date.is_some());
        let order = store.get_order(placed.order.id).await.unwrap().unwrap();
        assert_eq!(order.order.status, OrderStatus::Shipped);

        // All shipments delivered: order completes.
        store.confirm_delivery(ship_b.id, buyer).await.unwrap();
        let order = store.get_order(placed.order.id).await.unwrap().unwrap();
        assert_eq!(order.order.status, OrderStatus::Completed);

        // Re-confirming a delivered shipment is an invalid transition.
        let err = store.confirm_delivery(ship_a.id, buyer).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_delivery_confirmation_by_non_buyer_is_not_found() {
        let store = InMemoryMarketStore::new();
        let provider = seed_provider(&store).await;
        let product = seed_product(&store, 10, 500).await;
        let buyer = UserId::new();

        let placed = store
            .place_order(buyer, ProfileId::new(), &[line(&product, 1)], "addr")
            .await
            .unwrap();
        let shipment = store
            .create_shipment(
                &NewShipment {
                    order_id: placed.order.id,
                    order_item_ids: vec![placed.items[0].id],
                    logistics_provider_id: provider.id,
                    tracking_number: "TRK1".to_string(),
                },
                product.seller_profile,
            )
            .await
            .unwrap();

        let err = store
            .confirm_delivery(shipment.id, UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("shipment")));
    }

    #[tokio::test]
    async fn test_buyer_and_seller_scoped_reads() {
        let store = InMemoryMarketStore::new();
        let product = seed_product(&store, 10, 500).await;
        let buyer_profile = ProfileId::new();

        let placed = store
            .place_order(UserId::new(), buyer_profile, &[line(&product, 2)], "addr")
            .await
            .unwrap();

        let buyer_orders = store.orders_for_buyer(buyer_profile).await.unwrap();
        assert_eq!(buyer_orders.len(), 1);
        assert_eq!(buyer_orders[0].order.id, placed.order.id);
        assert!(
            store
                .orders_for_buyer(ProfileId::new())
                .await
                .unwrap()
                .is_empty()
        );

        let sold = store.items_sold_by(product.seller_profile).await.unwrap();
        assert_eq!(sold.len(), 1);
        assert_eq!(sold[0].order_id, placed.order.id);
        assert!(
            store
                .items_sold_by(ProfileId::new())
                .await
                .unwrap()
                .is_empty()
        );
    }
}
