use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod attendance;
pub mod auth;
mod error;
mod health;
mod observability;
mod orders;
mod proxy;
mod transactions;
mod types;
mod validation;

pub use error::{ApiError, ErrorDetail};
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn crate::services::AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn transaction_service(&self) -> &Arc<dyn crate::services::TransactionService> {
        &self.shared.transaction_service
    }

    #[must_use]
    pub fn workforce(&self) -> &Arc<crate::clients::workforce::WorkforceClient> {
        &self.shared.workforce
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config)?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();
    let is_production = state.config().general.environment.is_production();

    let api_router = Router::new()
        .merge(create_protected_router(state.clone()))
        .merge(create_proxy_router())
        .route("/auth/login", post(auth::login))
        .route("/health", get(health::health_check))
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    let mut app = Router::new().nest("/api", api_router);

    if !is_production {
        app = app.layer(middleware::from_fn(observability::expose_error_details));
    }

    app.layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

/// Routes whose bearer token is verified here.
fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/verify", get(auth::verify))
        .route("/transactions", get(transactions::list_transactions))
        .route("/transactions/stats", get(transactions::get_stats))
        .route("/transactions/{code}", get(transactions::get_transaction))
        .route("/metrics", get(observability::get_metrics))
        .layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

/// Routes relayed to the workforce API, which validates the token itself.
fn create_proxy_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route(
            "/orders/create-from-printed",
            post(orders::create_from_printed),
        )
        .route(
            "/attendance/admin/{id}",
            put(attendance::update_attendance),
        )
        .layer(middleware::from_fn(auth::require_bearer))
}
