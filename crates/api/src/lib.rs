//! HTTP API server for the storefront checkout.
//!
//! Exposes the checkout services over REST with the uniform response
//! envelope, structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod response;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use checkout::{Checkout, CheckoutSettings, Mailer, PaymentGateway};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", get(routes::products::list::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route(
            "/cart",
            post(routes::cart::add::<S>).get(routes::cart::list::<S>),
        )
        .route("/cart/ids", get(routes::cart::ids::<S>))
        .route(
            "/cart/{product_id}",
            patch(routes::cart::update::<S>).delete(routes::cart::remove::<S>),
        )
        .route("/orders/quote", post(routes::orders::quote::<S>))
        .route(
            "/orders",
            post(routes::orders::commit::<S>).get(routes::orders::list::<S>),
        )
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route("/payments/verify", post(routes::payments::verify::<S>))
        .route("/ratings", post(routes::ratings::create::<S>))
        .route("/notifications", get(routes::notifications::list::<S>))
        .route("/admin/orders", get(routes::admin::list::<S>))
        .route("/admin/orders/status", post(routes::admin::set_status::<S>))
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

/// Wires the checkout services into application state.
pub fn create_state<S: Store + Clone + 'static>(
    store: S,
    gateway: Arc<dyn PaymentGateway>,
    mailer: Arc<dyn Mailer>,
    settings: CheckoutSettings,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        checkout: Checkout::new(store, gateway, mailer, settings),
    })
}
