//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tokio::task;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::db::repositories::user::{hash_password, verify_password};
use crate::db::{Store, User};
use crate::services::auth_service::{AuthError, AuthService, LoginResult};
use crate::services::token::{Claims, TokenService};

/// Never matches a real password; hashed with the configured params so
/// unknown accounts cost the same Argon2 work as known ones.
const DUMMY_PASSWORD: &str = "chamcong-no-such-account";

pub struct SeaOrmAuthService {
    store: Store,
    tokens: TokenService,
    security: SecurityConfig,
    dummy_hash: OnceCell<String>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, tokens: TokenService, security: SecurityConfig) -> Self {
        Self {
            store,
            tokens,
            security,
            dummy_hash: OnceCell::new(),
        }
    }

    async fn dummy_hash(&self) -> Result<&str, AuthError> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| async {
                let security = self.security.clone();
                task::spawn_blocking(move || hash_password(DUMMY_PASSWORD, Some(&security)))
                    .await
                    .map_err(|e| AuthError::Internal(format!("Password hashing task panicked: {e}")))?
                    .map_err(AuthError::from)
            })
            .await?;
        Ok(hash.as_str())
    }

    // Argon2 is CPU-bound; keep it off the async workers.
    async fn check_password(&self, password: &str, password_hash: String) -> Result<bool, AuthError> {
        let password = password.to_string();
        let is_valid = task::spawn_blocking(move || verify_password(&password, &password_hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Password verification task panicked: {e}")))??;
        Ok(is_valid)
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn authenticate(&self, identifier: &str, password: &str) -> Result<User, AuthError> {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let Some((user, password_hash)) = self.store.find_user_by_identifier(identifier).await?
        else {
            let dummy = self.dummy_hash().await?.to_string();
            self.check_password(password, dummy).await?;
            info!(identifier, "Login rejected: unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.check_password(password, password_hash).await? {
            info!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            warn!(user_id = %user.id, "Login rejected: account inactive");
            return Err(AuthError::Inactive);
        }

        self.store.touch_last_login(user.id).await?;

        // Re-read so the caller sees the new last_login
        let user = self
            .store
            .get_user(user.id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(user)
    }

    async fn login(&self, identifier: &str, password: &str) -> Result<LoginResult, AuthError> {
        let user = self.authenticate(identifier, password).await?;
        let token = self.tokens.issue(&user)?;

        info!(user_id = %user.id, role = %user.role, "User logged in");

        Ok(LoginResult { token, user })
    }

    fn verify_claims(&self, token: &str) -> Result<Claims, AuthError> {
        Ok(self.tokens.verify(token)?)
    }

    async fn verify_token(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.verify_claims(token)?;

        match self.store.get_user(claims.user_id).await? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(AuthError::StaleToken),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> SeaOrmAuthService {
        let security = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        };
        SeaOrmAuthService::new(
            Store::lazy("sqlite::memory:", 1, 1),
            TokenService::new("secret", 24),
            security,
        )
    }

    #[tokio::test]
    async fn test_unknown_user_still_runs_password_hash() {
        let service = service();
        assert!(!service.dummy_hash.initialized());

        let result = service.authenticate("nobody", "whatever-password").await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        let dummy = service.dummy_hash.get().unwrap();
        assert!(dummy.starts_with("$argon2id$"));
        assert!(dummy.contains("m=1024,t=1"));
    }

    #[tokio::test]
    async fn test_dummy_password_is_not_accepted_for_unknown_user() {
        let service = service();
        let result = service.authenticate("nobody", DUMMY_PASSWORD).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }
}
