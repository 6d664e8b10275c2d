//! HTTP API server with observability for the allocation service.
//!
//! Provides REST endpoints for adding stock, allocating order lines and
//! reading allocations, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use service::{LogBroker, LogNotifications, MessageBroker, Notifications, ServiceError};
use store::ProductStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::allocation::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: ProductStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health::<S>))
        .route("/add_batch", post(routes::allocation::add_batch::<S>))
        .route("/allocate", post(routes::allocation::allocate::<S>))
        .route(
            "/change_batch_quantity",
            post(routes::allocation::change_batch_quantity::<S>),
        )
        .route(
            "/allocations/{orderid}",
            get(routes::allocation::allocations::<S>),
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

/// Creates application state with the given collaborators.
pub fn create_state<S: ProductStore + Clone + 'static>(
    store: S,
    config: &service::Config,
    notifications: Arc<dyn Notifications>,
    broker: Arc<dyn MessageBroker>,
) -> Result<Arc<AppState<S>>, ServiceError> {
    let bus = service::bootstrap(config, notifications, broker)?;
    Ok(Arc::new(AppState { bus, store }))
}

/// Creates the default application state, logging outbound messages.
pub fn create_default_state<S: ProductStore + Clone + 'static>(
    store: S,
    config: &service::Config,
) -> Result<Arc<AppState<S>>, ServiceError> {
    create_state(
        store,
        config,
        Arc::new(LogNotifications),
        Arc::new(LogBroker),
    )
}

/// Registers descriptions for the metrics the service records.
pub fn describe_metrics() {
    metrics::describe_counter!(
        "messagebus_messages_total",
        "Messages processed by the message bus, by kind"
    );
    metrics::describe_counter!(
        "messagebus_command_failures_total",
        "Command handlers that failed"
    );
    metrics::describe_counter!(
        "messagebus_event_handler_retries_total",
        "Event handler attempts that failed and were retried"
    );
    metrics::describe_counter!(
        "messagebus_event_handler_failures_total",
        "Event handlers that failed every attempt"
    );
    metrics::describe_counter!("allocations_total", "Order lines allocated to a batch");
    metrics::describe_histogram!(
        "messagebus_handle_duration_seconds",
        metrics::Unit::Seconds,
        "Time spent handling one inbound message and its cascade"
    );
}
