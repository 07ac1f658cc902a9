//! HTTP API server with observability for the cafe order service.
//!
//! Provides REST endpoints for order placement, batch processing, the menu
//! and the inventory, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use store::CafeStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: CafeStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
    request_timeout: Duration,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/orders",
            post(routes::orders::create::<S>).get(routes::orders::list::<S>),
        )
        .route(
            "/orders/batch-process",
            post(routes::orders::batch_process::<S>),
        )
        .route(
            "/orders/numberOfOrderedItems",
            get(routes::orders::ordered_items::<S>),
        )
        .route(
            "/orders/{id}",
            get(routes::orders::get::<S>)
                .put(routes::orders::replace::<S>)
                .delete(routes::orders::delete::<S>),
        )
        .route("/orders/{id}/close", post(routes::orders::close::<S>))
        .route("/orders/{id}/history", get(routes::orders::history::<S>))
        .route(
            "/menu",
            get(routes::menu::list::<S>).post(routes::menu::create::<S>),
        )
        .route(
            "/menu/{id}",
            get(routes::menu::get::<S>)
                .put(routes::menu::update::<S>)
                .delete(routes::menu::delete::<S>),
        )
        .route("/menu/{id}/price", put(routes::menu::change_price::<S>))
        .route(
            "/menu/{id}/price-history",
            get(routes::menu::price_history::<S>),
        )
        .route(
            "/inventory",
            get(routes::inventory::list::<S>).post(routes::inventory::create::<S>),
        )
        .route(
            "/inventory/getLeftOvers",
            get(routes::inventory::leftovers::<S>),
        )
        .route(
            "/inventory/{id}",
            get(routes::inventory::get::<S>)
                .put(routes::inventory::update::<S>)
                .delete(routes::inventory::delete::<S>),
        )
        .route(
            "/inventory/{id}/restock",
            post(routes::inventory::restock::<S>),
        )
        .route(
            "/inventory/{id}/transactions",
            get(routes::inventory::transactions::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a store.
pub fn create_state<S: CafeStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store))
}
