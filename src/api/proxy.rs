//! Shared plumbing for routes that relay to the workforce API.

use axum::{
    Json,
    body::Bytes,
    http::Method,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use super::{ApiError, AppState};

/// Empty bodies forward as no body; anything else must be JSON.
pub fn json_body(bytes: &Bytes) -> Result<Option<Value>, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|e| ApiError::validation(format!("JSON không hợp lệ: {e}")))
}

/// Relays one request and passes the upstream status and body back.
pub async fn relay(
    state: &AppState,
    method: Method,
    path: &str,
    query: Option<&str>,
    bearer: &str,
    body: Option<&Value>,
) -> Result<Response, ApiError> {
    let upstream = state
        .workforce()
        .forward(method, path, query, bearer, body)
        .await?;

    Ok((upstream.status, Json(upstream.body)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_body() {
        assert_eq!(json_body(&Bytes::from_static(b"")).unwrap(), None);
        assert_eq!(json_body(&Bytes::from_static(b"  \n")).unwrap(), None);
        assert_eq!(
            json_body(&Bytes::from_static(br#"{"soLuong":2}"#)).unwrap(),
            Some(serde_json::json!({ "soLuong": 2 }))
        );
        assert!(json_body(&Bytes::from_static(b"{oops")).is_err());
    }
}
