use crate::api::{AppState, ErrorDetail};
use crate::constants::messages;
use axum::{Json, extract::State, http::HeaderValue, response::IntoResponse};
use std::sync::Arc;

/// `GET /api/metrics`
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let uri = req.uri().path().to_string();

    let matched_path = req
        .extensions()
        .get::<axum::extract::MatchedPath>()
        .map(|mp| mp.as_str().to_string());

    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %uri,
        route = matched_path.clone(),
        user_id = tracing::field::Empty,
    );

    async move {
        let response = next.run(req).await;

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let status = response.status().as_u16();

        let outcome = if status >= 500 {
            "error"
        } else if status >= 400 {
            "client_error"
        } else {
            "success"
        };

        // Transaction codes and attendance ids would blow up label cardinality
        let metrics_path = matched_path.as_deref().map_or_else(|| route_label(&uri), str::to_string);

        let labels = [
            ("method", method.clone()),
            ("path", metrics_path),
            ("status", status.to_string()),
        ];

        metrics::counter!("http_requests_total", &labels).increment(1);
        metrics::histogram!("http_request_duration_seconds", &labels)
            .record(start.elapsed().as_secs_f64());

        info!(
            event = "http_request_finished",
            duration_ms = duration_ms,
            status_code = status,
            user_agent = %user_agent,
            outcome = %outcome,
            "Request finished"
        );

        response
    }
    .instrument(span)
    .await
}

/// Collapses dynamic path segments for metric labels.
fn route_label(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("/api/transactions/") {
        if rest != "stats" {
            return "/api/transactions/{code}".to_string();
        }
    }
    if path.starts_with("/api/attendance/admin/") {
        return "/api/attendance/admin/{id}".to_string();
    }
    path.to_string()
}

pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert("cache-control", HeaderValue::from_static("no-store"));

    response
}

/// Development only: puts the logged detail of a 500 into the message.
pub async fn expose_error_details(req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let status = response.status();
    let message = format!("{}: {detail}", messages::INTERNAL_ERROR);
    (status, Json(crate::api::ApiResponse::<()>::error(message))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_label_collapses_ids() {
        assert_eq!(route_label("/api/transactions/FT123"), "/api/transactions/{code}");
        assert_eq!(route_label("/api/transactions/stats"), "/api/transactions/stats");
        assert_eq!(route_label("/api/attendance/admin/77"), "/api/attendance/admin/{id}");
        assert_eq!(route_label("/api/orders"), "/api/orders");
    }
}
