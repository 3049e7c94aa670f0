use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use common::{
    Money, OrderId, OrderItemId, ProductId, ProfileId, ProviderId, ShipmentId, StockLogId, UserId,
};
use domain::{
    CartLine, LogisticsProvider, NewProduct, NewProvider, NewShipment, Order, OrderItem,
    OrderStatus, OrderWithItems, Product, Shipment, ShipmentStatus, StockLogEntry,
};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::{MarketStore, order_total, price_line},
};

/// PostgreSQL-backed market store.
///
/// Every mutating operation runs in a single transaction; product rows are
/// the only contended resource and are taken with `SELECT ... FOR UPDATE`.
/// Stock deltas are applied as relative conditional updates
/// (`stock_quantity = stock_quantity + $n ... AND stock_quantity + $n >= 0`)
/// rather than read-modify-write, so concurrent adjusters cannot lose
/// updates or drive a quantity negative.
#[derive(Clone)]
pub struct PostgresMarketStore {
    pool: PgPool,
}

impl PostgresMarketStore {
    /// Creates a new PostgreSQL market store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get("product_id")?),
            seller_profile: ProfileId::from_uuid(row.try_get("seller_profile_id")?),
            name: row.try_get("name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            stock_quantity: row.try_get("stock_quantity")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: OrderId::from_uuid(row.try_get("order_id")?),
            placing_user: UserId::from_uuid(row.try_get("placing_user_id")?),
            buyer_profile: ProfileId::from_uuid(row.try_get("buyer_profile_id")?),
            order_date: row.try_get("order_date")?,
            total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
            status: status.parse::<OrderStatus>()?,
            shipping_address: row.try_get("shipping_address")?,
            tracking_number: row.try_get("tracking_number")?,
        })
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        let quantity: i32 = row.try_get("quantity")?;
        Ok(OrderItem {
            id: OrderItemId::from_uuid(row.try_get("order_item_id")?),
            order_id: OrderId::from_uuid(row.try_get("order_id")?),
            product_id: row
                .try_get::<Option<Uuid>, _>("product_id")?
                .map(ProductId::from_uuid),
            seller_profile: ProfileId::from_uuid(row.try_get("seller_profile_id")?),
            quantity: quantity as u32,
            price_at_purchase: Money::from_cents(row.try_get("price_at_purchase_cents")?),
            status: row.try_get("status")?,
            shipment_id: row
                .try_get::<Option<Uuid>, _>("shipment_id")?
                .map(ShipmentId::from_uuid),
        })
    }

    fn row_to_shipment(row: &PgRow) -> Result<Shipment> {
        let status: String = row.try_get("status")?;
        Ok(Shipment {
            id: ShipmentId::from_uuid(row.try_get("shipment_id")?),
            order_id: OrderId::from_uuid(row.try_get("order_id")?),
            seller_profile: ProfileId::from_uuid(row.try_get("seller_profile_id")?),
            logistics_provider: row
                .try_get::<Option<Uuid>, _>("logistics_provider_id")?
                .map(ProviderId::from_uuid),
            tracking_number: row.try_get("tracking_number")?,
            status: status.parse::<ShipmentStatus>()?,
            shipped_date: row.try_get("shipped_date")?,
            delivered_date: row.try_get("delivered_date")?,
        })
    }

    fn row_to_log_entry(row: &PgRow) -> Result<StockLogEntry> {
        Ok(StockLogEntry {
            id: StockLogId::from_uuid(row.try_get("log_id")?),
            product_id: ProductId::from_uuid(row.try_get("product_id")?),
            change: row.try_get("change")?,
            reason: row.try_get("reason")?,
            created_by: row
                .try_get::<Option<Uuid>, _>("created_by")?
                .map(UserId::from_uuid),
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_provider(row: &PgRow) -> Result<LogisticsProvider> {
        Ok(LogisticsProvider {
            id: ProviderId::from_uuid(row.try_get("provider_id")?),
            name: row.try_get("name")?,
            tracking_url_template: row.try_get("tracking_url_template")?,
            is_active: row.try_get("is_active")?,
        })
    }

    /// Locks a product row and returns it, or `NotFound`.
    async fn lock_product(
        tx: &mut Transaction<'_, Postgres>,
        product_id: ProductId,
    ) -> Result<Product> {
        let row = sqlx::query(
            r#"
            SELECT product_id, seller_profile_id, name, price_cents, stock_quantity, is_active, created_at
            FROM products
            WHERE product_id = $1
            FOR UPDATE
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await?;

        match row {
            Some(row) => Self::row_to_product(&row),
            None => Err(StoreError::NotFound("product")),
        }
    }

    /// Applies a relative stock delta, guarded so the quantity cannot go
    /// negative even if the caller's earlier read is stale.
    async fn apply_stock_delta(
        tx: &mut Transaction<'_, Postgres>,
        product: &Product,
        delta: i32,
    ) -> Result<()> {
        let updated = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity + $2
            WHERE product_id = $1 AND stock_quantity + $2 >= 0
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(delta)
        .execute(&mut **tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::InsufficientStock {
                product: product.name.clone(),
                requested: i64::from(-delta),
                available: i64::from(product.stock_quantity),
            });
        }
        Ok(())
    }

    /// Appends one audit entry for an applied stock delta.
    async fn append_stock_log(
        tx: &mut Transaction<'_, Postgres>,
        product_id: ProductId,
        change: i32,
        actor: Option<UserId>,
        reason: &str,
    ) -> Result<StockLogEntry> {
        let entry = StockLogEntry {
            id: StockLogId::new(),
            product_id,
            change,
            reason: reason.to_string(),
            created_by: actor,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO stock_logs (log_id, product_id, change, reason, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.product_id.as_uuid())
        .bind(entry.change)
        .bind(&entry.reason)
        .bind(entry.created_by.map(|u| u.as_uuid()))
        .bind(entry.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(entry)
    }

    async fn items_of_order(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT order_item_id, order_id, product_id, seller_profile_id, quantity,
                   price_at_purchase_cents, status, shipment_id
            FROM order_items
            WHERE order_id = $1
            ORDER BY order_item_id
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_item).collect()
    }
}

#[async_trait]
impl MarketStore for PostgresMarketStore {
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

        sqlx::query(
            r#"
            INSERT INTO products (product_id, seller_profile_id, name, price_cents, stock_quantity, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.seller_profile.as_uuid())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(product.stock_quantity)
        .bind(product.is_active)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT product_id, seller_profile_id, name, price_cents, stock_quantity, is_active, created_at
            FROM products
            WHERE product_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::NotFound("product"));
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

        sqlx::query(
            r#"
            INSERT INTO logistics_providers (provider_id, name, tracking_url_template, is_active)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(provider.id.as_uuid())
        .bind(&provider.name)
        .bind(&provider.tracking_url_template)
        .bind(provider.is_active)
        .execute(&self.pool)
        .await?;

        Ok(provider)
    }

    async fn get_provider(&self, id: ProviderId) -> Result<Option<LogisticsProvider>> {
        let row = sqlx::query(
            r#"
            SELECT provider_id, name, tracking_url_template, is_active
            FROM logistics_providers
            WHERE provider_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_provider).transpose()
    }

    async fn adjust_stock(
        &self,
        product_id: ProductId,
        change: i32,
        actor: Option<UserId>,
        reason: &str,
    ) -> Result<StockLogEntry> {
        let mut tx = self.pool.begin().await?;

        let product = Self::lock_product(&mut tx, product_id).await?;
        if change < 0 && product.stock_quantity + change < 0 {
            return Err(StoreError::InsufficientStock {
                product: product.name,
                requested: i64::from(-change),
                available: i64::from(product.stock_quantity),
            });
        }

        Self::apply_stock_delta(&mut tx, &product, change).await?;
        let entry = Self::append_stock_log(&mut tx, product_id, change, actor, reason).await?;

        tx.commit().await?;
        Ok(entry)
    }

    async fn stock_log(&self, product_id: ProductId) -> Result<Vec<StockLogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT log_id, product_id, change, reason, created_by, created_at
            FROM stock_logs
            WHERE product_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_log_entry).collect()
    }

    async fn place_order(
        &self,
        placing_user: UserId,
        buyer_profile: ProfileId,
        lines: &[CartLine],
        shipping_address: &str,
    ) -> Result<OrderWithItems> {
        let mut tx = self.pool.begin().await?;

        // Lock every product in id order first: cancel_order restores in the
        // same order, so two concurrent multi-product operations cannot take
        // the rows in opposite orders and deadlock. An early return drops the
        // transaction, rolling back in full.
        let mut product_ids: Vec<ProductId> = lines.iter().map(|line| line.product_id).collect();
        product_ids.sort_by_key(ProductId::as_uuid);
        product_ids.dedup();
        let mut locked: HashMap<ProductId, Product> = HashMap::new();
        for product_id in product_ids {
            let product = Self::lock_product(&mut tx, product_id).await?;
            locked.insert(product_id, product);
        }

        // Validate and price every line before any stock moves.
        let mut priced = Vec::with_capacity(lines.len());
        let mut required: HashMap<ProductId, i64> = HashMap::new();
        for line in lines {
            priced.push(price_line(&locked[&line.product_id], line)?);
            *required.entry(line.product_id).or_default() += i64::from(line.quantity);
        }

        // A product repeated across lines must be coverable by its stock in
        // aggregate. The rows are locked, so the check cannot go stale
        // before the decrements below.
        for (product_id, total_required) in &required {
            let product = &locked[product_id];
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

        sqlx::query(
            r#"
            INSERT INTO orders (order_id, placing_user_id, buyer_profile_id, order_date,
                                total_amount_cents, status, shipping_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.placing_user.as_uuid())
        .bind(order.buyer_profile.as_uuid())
        .bind(order.order_date)
        .bind(order.total_amount.cents())
        .bind(order.status.as_str())
        .bind(&order.shipping_address)
        .execute(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(priced.len());
        for line in priced {
            let product = &locked[&line.product_id];
            Self::apply_stock_delta(&mut tx, product, -(line.quantity as i32)).await?;
            Self::append_stock_log(
                &mut tx,
                line.product_id,
                -(line.quantity as i32),
                Some(placing_user),
                "order placed",
            )
            .await?;

            let item = line.into_order_item(order.id);
            sqlx::query(
                r#"
                INSERT INTO order_items (order_item_id, order_id, product_id, seller_profile_id,
                                         quantity, price_at_purchase_cents, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(item.order_id.as_uuid())
            .bind(item.product_id.map(|p| p.as_uuid()))
            .bind(item.seller_profile.as_uuid())
            .bind(item.quantity as i32)
            .bind(item.price_at_purchase.cents())
            .bind(&item.status)
            .execute(&mut *tx)
            .await?;
            items.push(item);
        }

        tx.commit().await?;
        Ok(OrderWithItems { order, items })
    }

    async fn cancel_order(&self, order_id: OrderId, requesting_user: UserId) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        // Owner scoping in the query: a non-owner sees NotFound, never the
        // order's existence.
        let row = sqlx::query(
            r#"
            SELECT order_id, placing_user_id, buyer_profile_id, order_date, total_amount_cents,
                   status, shipping_address, tracking_number
            FROM orders
            WHERE order_id = $1 AND placing_user_id = $2
            FOR UPDATE
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(requesting_user.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let mut order = match row {
            Some(row) => Self::row_to_order(&row)?,
            None => return Err(StoreError::NotFound("order")),
        };

        if !order.status.can_cancel() {
            return Err(StoreError::InvalidTransition {
                entity: "order",
                action: "cancel",
                status: order.status.to_string(),
            });
        }

        // Restore stock per item, locking product rows in id order (the same
        // order place_order takes them); items whose product was deleted are
        // skipped.
        let item_rows = sqlx::query(
            r#"
            SELECT product_id, quantity
            FROM order_items
            WHERE order_id = $1 AND product_id IS NOT NULL
            ORDER BY product_id
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&mut *tx)
        .await?;

        for row in item_rows {
            let product_id = ProductId::from_uuid(row.try_get("product_id")?);
            let quantity: i32 = row.try_get("quantity")?;
            let product = Self::lock_product(&mut tx, product_id).await?;
            Self::apply_stock_delta(&mut tx, &product, quantity).await?;
            Self::append_stock_log(
                &mut tx,
                product_id,
                quantity,
                Some(requesting_user),
                "order cancelled",
            )
            .await?;
        }

        order.status = OrderStatus::Cancelled;
        sqlx::query("UPDATE orders SET status = $2 WHERE order_id = $1")
            .bind(order_id.as_uuid())
            .bind(order.status.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(order)
    }

    async fn create_shipment(
        &self,
        request: &NewShipment,
        seller_profile: ProfileId,
    ) -> Result<Shipment> {
        let mut tx = self.pool.begin().await?;

        let order_row = sqlx::query(
            r#"
            SELECT order_id, placing_user_id, buyer_profile_id, order_date, total_amount_cents,
                   status, shipping_address, tracking_number
            FROM orders
            WHERE order_id = $1
            FOR UPDATE
            "#,
        )
        .bind(request.order_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;
        let order = match order_row {
            Some(row) => Self::row_to_order(&row)?,
            None => return Err(StoreError::NotFound("order")),
        };
        if !order.status.can_accept_shipments() {
            return Err(StoreError::InvalidTransition {
                entity: "order",
                action: "ship items of",
                status: order.status.to_string(),
            });
        }

        let provider = sqlx::query("SELECT provider_id FROM logistics_providers WHERE provider_id = $1")
            .bind(request.logistics_provider_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;
        if provider.is_none() {
            return Err(StoreError::NotFound("logistics provider"));
        }

        // Resolve the batch restricted to this order and this seller; the
        // already-shipped check happens under the same transaction, so two
        // concurrent shipment creations cannot both claim an item.
        let requested: Vec<Uuid> = request
            .order_item_ids
            .iter()
            .map(|id| id.as_uuid())
            .collect();
        let item_rows = sqlx::query(
            r#"
            SELECT oi.order_item_id, oi.shipment_id, p.name AS product_name
            FROM order_items oi
            LEFT JOIN products p ON p.product_id = oi.product_id
            WHERE oi.order_item_id = ANY($1) AND oi.order_id = $2 AND oi.seller_profile_id = $3
            FOR UPDATE OF oi
            "#,
        )
        .bind(&requested)
        .bind(request.order_id.as_uuid())
        .bind(seller_profile.as_uuid())
        .fetch_all(&mut *tx)
        .await?;

        if item_rows.len() != request.order_item_ids.len() {
            return Err(StoreError::Validation(
                "one or more items are invalid, do not belong to this order, or are not sold by you"
                    .to_string(),
            ));
        }
        for row in &item_rows {
            let assigned: Option<Uuid> = row.try_get("shipment_id")?;
            if assigned.is_some() {
                let name: Option<String> = row.try_get("product_name")?;
                return Err(StoreError::Validation(format!(
                    "item \"{}\" is already part of another shipment",
                    name.unwrap_or_else(|| "deleted product".to_string())
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
        sqlx::query(
            r#"
            INSERT INTO shipments (shipment_id, order_id, seller_profile_id, logistics_provider_id,
                                   tracking_number, status, shipped_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(shipment.id.as_uuid())
        .bind(shipment.order_id.as_uuid())
        .bind(shipment.seller_profile.as_uuid())
        .bind(shipment.logistics_provider.map(|p| p.as_uuid()))
        .bind(&shipment.tracking_number)
        .bind(shipment.status.as_str())
        .bind(shipment.shipped_date)
        .execute(&mut *tx)
        .await?;

        // The one permitted null-to-value transition of each item.
        sqlx::query("UPDATE order_items SET shipment_id = $1 WHERE order_item_id = ANY($2)")
            .bind(shipment.id.as_uuid())
            .bind(&requested)
            .execute(&mut *tx)
            .await?;

        // Recompute order status from fulfillment coverage.
        let counts = sqlx::query(
            r#"
            SELECT COUNT(*) AS total, COUNT(shipment_id) AS shipped
            FROM order_items
            WHERE order_id = $1
            "#,
        )
        .bind(request.order_id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;
        let total: i64 = counts.try_get("total")?;
        let shipped: i64 = counts.try_get("shipped")?;
        let status = OrderStatus::from_coverage(total as usize, shipped as usize);

        sqlx::query("UPDATE orders SET status = $2 WHERE order_id = $1")
            .bind(request.order_id.as_uuid())
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(shipment)
    }

    async fn confirm_delivery(
        &self,
        shipment_id: ShipmentId,
        requesting_user: UserId,
    ) -> Result<Shipment> {
        let mut tx = self.pool.begin().await?;

        // Scoped to the placing user; non-buyers get NotFound. The order row
        // is locked too: two confirmations on sibling shipments serialize, so
        // the completion check below never runs against an uncommitted peer.
        let row = sqlx::query(
            r#"
            SELECT s.shipment_id, s.order_id, s.seller_profile_id, s.logistics_provider_id,
                   s.tracking_number, s.status, s.shipped_date, s.delivered_date
            FROM shipments s
            JOIN orders o ON o.order_id = s.order_id
            WHERE s.shipment_id = $1 AND o.placing_user_id = $2
            FOR UPDATE OF s, o
            "#,
        )
        .bind(shipment_id.as_uuid())
        .bind(requesting_user.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let mut shipment = match row {
            Some(row) => Self::row_to_shipment(&row)?,
            None => return Err(StoreError::NotFound("shipment")),
        };

        if !shipment.status.can_mark_delivered() {
            return Err(StoreError::InvalidTransition {
                entity: "shipment",
                action: "confirm delivery of",
                status: shipment.status.to_string(),
            });
        }

        shipment.status = ShipmentStatus::Delivered;
        shipment.delivered_date = Some(Utc::now());
        sqlx::query(
            "UPDATE shipments SET status = $2, delivered_date = $3 WHERE shipment_id = $1",
        )
        .bind(shipment.id.as_uuid())
        .bind(shipment.status.as_str())
        .bind(shipment.delivered_date)
        .execute(&mut *tx)
        .await?;

        // The order completes once no shipment remains undelivered.
        let remaining: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shipments WHERE order_id = $1 AND status <> 'delivered'",
        )
        .bind(shipment.order_id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;
        if remaining == 0 {
            sqlx::query("UPDATE orders SET status = $2 WHERE order_id = $1")
                .bind(shipment.order_id.as_uuid())
                .bind(OrderStatus::Completed.as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(shipment)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderWithItems>> {
        let row = sqlx::query(
            r#"
            SELECT order_id, placing_user_id, buyer_profile_id, order_date, total_amount_cents,
                   status, shipping_address, tracking_number
            FROM orders
            WHERE order_id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let order = Self::row_to_order(&row)?;
                let items = self.items_of_order(order_id).await?;
                Ok(Some(OrderWithItems { order, items }))
            }
            None => Ok(None),
        }
    }

    async fn orders_for_buyer(&self, buyer_profile: ProfileId) -> Result<Vec<OrderWithItems>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, placing_user_id, buyer_profile_id, order_date, total_amount_cents,
                   status, shipping_address, tracking_number
            FROM orders
            WHERE buyer_profile_id = $1
            ORDER BY order_date DESC
            "#,
        )
        .bind(buyer_profile.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in &rows {
            let order = Self::row_to_order(row)?;
            let items = self.items_of_order(order.id).await?;
            result.push(OrderWithItems { order, items });
        }
        Ok(result)
    }

    async fn items_sold_by(&self, seller_profile: ProfileId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT order_item_id, order_id, product_id, seller_profile_id, quantity,
                   price_at_purchase_cents, status, shipment_id
            FROM order_items
            WHERE seller_profile_id = $1
            ORDER BY order_item_id
            "#,
        )
        .bind(seller_profile.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_item).collect()
    }

    async fn shipments_for_order(&self, order_id: OrderId) -> Result<Vec<Shipment>> {
        let rows = sqlx::query(
            r#"
            SELECT shipment_id, order_id, seller_profile_id, logistics_provider_id,
                   tracking_number, status, shipped_date, delivered_date
            FROM shipments
            WHERE order_id = $1
            ORDER BY shipped_date
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_shipment).collect()
    }
}
