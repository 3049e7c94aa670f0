//! HTTP API server with observability for the marketplace core.
//!
//! Exposes the stock ledger, order engine, shipment engine, and the scoped
//! buyer/seller read sides over REST, with structured logging (tracing) and
//! Prometheus metrics. Identity arrives pre-resolved in opaque headers; see
//! [`identity`].

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use fulfillment::{OrderEngine, ShipmentEngine, StockLedger};
use market_store::MarketStore;
use metrics_exporter_prometheus::PrometheusHandle;
use queries::{BuyerOrders, SellerSales};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: MarketStore> {
    pub stock_ledger: StockLedger<S>,
    pub orders: OrderEngine<S>,
    pub shipments: ShipmentEngine<S>,
    pub buyer_orders: BuyerOrders<S>,
    pub seller_sales: SellerSales<S>,
    pub store: S,
}

/// Wires the engines and read sides over one store.
pub fn create_state<S: MarketStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        stock_ledger: StockLedger::new(store.clone()),
        orders: OrderEngine::new(store.clone()),
        shipments: ShipmentEngine::new(store.clone()),
        buyer_orders: BuyerOrders::new(store.clone()),
        seller_sales: SellerSales::new(store.clone()),
        store,
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: MarketStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/stock/{product_id}/adjust", post(routes::stock::adjust::<S>))
        .route("/stock/{product_id}/log", get(routes::stock::log::<S>))
        .route("/orders", post(routes::orders::place::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route("/shipments", post(routes::shipments::create::<S>))
        .route("/shipments/{id}/deliver", post(routes::shipments::deliver::<S>))
        .route("/sales", get(routes::sales::list::<S>))
        .route("/sales/report", get(routes::sales::report::<S>))
        .route("/sales/daily", get(routes::sales::daily::<S>))
        .route("/sales/{order_id}", get(routes::sales::get::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
