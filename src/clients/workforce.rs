//! HTTP client for the external workforce API (orders and attendance).
//!
//! Requests are forwarded with the caller's bearer token, query string and
//! JSON body untouched. The upstream decides whether the token is valid.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::UpstreamConfig;
use crate::constants::messages;

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Upstream answered with a non-success status.
    #[error("Upstream responded {status}: {message}")]
    Rejected { status: StatusCode, message: String },

    /// Connect failure, timeout or broken transfer.
    #[error("Upstream unreachable: {0}")]
    Unreachable(String),

    /// Success status but the body was not JSON.
    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Value,
}

#[derive(Debug, Clone)]
pub struct WorkforceClient {
    client: Client,
    base_url: String,
}

impl WorkforceClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        Url::parse(&config.base_url)
            .with_context(|| format!("Invalid upstream base URL: {}", config.base_url))?;

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build upstream HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, query: Option<&str>) -> String {
        let path = path.trim_start_matches('/');
        match query.filter(|q| !q.is_empty()) {
            Some(query) => format!("{}/{path}?{query}", self.base_url),
            None => format!("{}/{path}", self.base_url),
        }
    }

    /// Sends one request upstream and returns its status and JSON body.
    ///
    /// Non-success statuses become [`UpstreamError::Rejected`] carrying the
    /// upstream's own status and message.
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        bearer: &str,
        body: Option<&Value>,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let url = self.url(path, query);
        debug!(%method, %url, "Forwarding request upstream");

        let mut request = self.client.request(method.clone(), &url).bearer_auth(bearer);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(%method, %url, error = %e, "Upstream request failed");
            metrics::counter!("upstream_requests_total", "outcome" => "unreachable").increment(1);
            UpstreamError::Unreachable(e.to_string())
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            let message = error_message(&bytes);
            warn!(%method, %url, status = status.as_u16(), %message, "Upstream rejected request");
            metrics::counter!("upstream_requests_total", "outcome" => "rejected").increment(1);
            return Err(UpstreamError::Rejected { status, message });
        }

        metrics::counter!("upstream_requests_total", "outcome" => "success").increment(1);

        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?
        };

        Ok(UpstreamResponse { status, body })
    }
}

/// `message`, else `error`, else the generic localized message.
fn error_message(bytes: &[u8]) -> String {
    let parsed: Option<Value> = serde_json::from_slice(bytes).ok();

    parsed
        .as_ref()
        .and_then(|body| {
            ["message", "error"].iter().find_map(|key| {
                body.get(key)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
            })
        })
        .map_or_else(|| messages::UPSTREAM_FALLBACK.to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> WorkforceClient {
        WorkforceClient::new(&UpstreamConfig {
            base_url: base_url.to_string(),
            ..UpstreamConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_url_joins_path_and_query() {
        let client = client("http://workforce.local/api/");
        assert_eq!(client.url("/orders", None), "http://workforce.local/api/orders");
        assert_eq!(
            client.url("orders", Some("status=done&page=2")),
            "http://workforce.local/api/orders?status=done&page=2"
        );
        assert_eq!(client.url("orders", Some("")), "http://workforce.local/api/orders");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let config = UpstreamConfig {
            base_url: "not a url".to_string(),
            ..UpstreamConfig::default()
        };
        assert!(WorkforceClient::new(&config).is_err());
    }

    #[test]
    fn test_error_message_prefers_message_then_error() {
        assert_eq!(
            error_message(br#"{"message":"Don hang khong ton tai","error":"x"}"#),
            "Don hang khong ton tai"
        );
        assert_eq!(error_message(br#"{"error":"Forbidden"}"#), "Forbidden");
        assert_eq!(error_message(br#"{"message":""}"#), messages::UPSTREAM_FALLBACK);
        assert_eq!(error_message(b"<html>502</html>"), messages::UPSTREAM_FALLBACK);
        assert_eq!(error_message(b""), messages::UPSTREAM_FALLBACK);
    }
}
