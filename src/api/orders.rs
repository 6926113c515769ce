use axum::{
    Extension,
    body::Bytes,
    extract::{RawQuery, State},
    http::Method,
    response::Response,
};
use std::sync::Arc;

use super::auth::BearerToken;
use super::proxy::{json_body, relay};
use super::{ApiError, AppState};

/// GET /orders
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Extension(BearerToken(token)): Extension<BearerToken>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    relay(&state, Method::GET, "/orders", query.as_deref(), &token, None).await
}

/// POST /orders
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Extension(BearerToken(token)): Extension<BearerToken>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Response, ApiError> {
    let body = json_body(&body)?;
    relay(
        &state,
        Method::POST,
        "/orders",
        query.as_deref(),
        &token,
        body.as_ref(),
    )
    .await
}

/// POST /orders/create-from-printed
pub async fn create_from_printed(
    State(state): State<Arc<AppState>>,
    Extension(BearerToken(token)): Extension<BearerToken>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Response, ApiError> {
    let body = json_body(&body)?;
    relay(
        &state,
        Method::POST,
        "/orders/create-from-printed",
        query.as_deref(),
        &token,
        body.as_ref(),
    )
    .await
}
