//! Domain service for authentication.
//!
//! Handles credential checks, token issuance and token verification.

use serde::Serialize;
use thiserror::Error;

use crate::db::User;
use crate::services::token::{Claims, TokenError};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown identifier or wrong password. Callers must not tell them apart.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is inactive")]
    Inactive,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("Token refers to an unknown or disabled account")]
    StaleToken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Login result containing the session token and the signed-in user.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub user: User,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Looks the user up by username or email and checks the password.
    /// Updates `last_login` on success.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown identifier or a
    /// wrong password, and [`AuthError::Inactive`] for a disabled account.
    async fn authenticate(&self, identifier: &str, password: &str) -> Result<User, AuthError>;

    /// Authenticates and issues a session token.
    async fn login(&self, identifier: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Checks the token cryptographically, without touching the database.
    fn verify_claims(&self, token: &str) -> Result<Claims, AuthError>;

    /// Checks the token and reloads the account it names.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::StaleToken`] when the account no longer exists or
    /// has been deactivated since the token was issued.
    async fn verify_token(&self, token: &str) -> Result<User, AuthError>;
}
