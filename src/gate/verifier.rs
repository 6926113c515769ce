use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use super::SessionUser;

#[derive(Debug, Error)]
pub enum VerifyError {
    /// The portal answered and refused the token.
    #[error("Token rejected: {0}")]
    Rejected(String),

    #[error("Could not reach the portal: {0}")]
    Transport(String),
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<SessionUser, VerifyError>;
}

#[derive(Debug, Deserialize)]
struct UserReply {
    user: SessionUser,
}

#[derive(Debug, Deserialize)]
pub struct LoginReply {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    #[serde(default)]
    message: Option<String>,
}

/// Talks to the portal's `/api/auth/*` endpoints.
#[derive(Debug, Clone)]
pub struct PortalClient {
    client: Client,
    server_url: String,
}

impl PortalClient {
    pub fn new(server_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("chamcong/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            server_url: server_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/auth/{path}", self.server_url)
    }

    /// Exchanges credentials for a token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginReply> {
        let response = self
            .client
            .post(self.endpoint("login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .context("Failed to reach the portal")?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorReply>()
                .await
                .ok()
                .and_then(|r| r.message)
                .unwrap_or_else(|| status.to_string());
            anyhow::bail!("Login failed ({status}): {message}");
        }

        response
            .json::<LoginReply>()
            .await
            .context("Unexpected login response")
    }
}

#[async_trait]
impl TokenVerifier for PortalClient {
    async fn verify(&self, token: &str) -> Result<SessionUser, VerifyError> {
        let response = self
            .client
            .get(self.endpoint("verify"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| VerifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorReply>()
                .await
                .ok()
                .and_then(|r| r.message)
                .unwrap_or_else(|| status.to_string());
            return Err(VerifyError::Rejected(message));
        }

        response
            .json::<UserReply>()
            .await
            .map(|reply| reply.user)
            .map_err(|e| VerifyError::Rejected(format!("Unexpected verify response: {e}")))
    }
}
