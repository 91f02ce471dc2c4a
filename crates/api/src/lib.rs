//! HTTP API server for the bookstore order pipeline.
//!
//! Provides REST endpoints for stock, orders, checkout and payment
//! confirmation, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use common::Currency;
use domain::OrderService;
use metrics_exporter_prometheus::PrometheusHandle;
use payments::{CheckoutUrls, PaymentGateway, PaymentReconciler};
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/orders",
            post(routes::orders::place::<S>).get(routes::orders::list::<S>),
        )
        .route(
            "/orders/{id}",
            get(routes::orders::get::<S>).patch(routes::orders::update_status::<S>),
        )
        .route(
            "/items/{id}",
            put(routes::items::upsert::<S>).get(routes::items::get::<S>),
        )
        .route("/checkout-sessions", post(routes::checkout::create::<S>))
        .route(
            "/checkout-sessions/{session_id}/confirm",
            post(routes::checkout::confirm::<S>),
        )
        .route(
            "/reconciliation-tasks",
            get(routes::reconciliation::list::<S>),
        )
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

/// Creates the application state over a store and a payment gateway.
pub fn create_default_state<S: Store>(
    store: S,
    gateway: Arc<dyn PaymentGateway>,
    urls: CheckoutUrls,
    currency: Currency,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        order_service: OrderService::new(store.clone()),
        reconciler: PaymentReconciler::new(store.clone(), gateway, urls),
        store,
        currency,
    })
}
