//! Client-side auth gate.
//!
//! Decides whether protected views may render: a stored token is verified
//! against the portal once per mount, and the verified role picks the view.
//! There is no retry; a failed verification drops the stored token.

mod store;
mod verifier;

pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use verifier::{LoginReply, PortalClient, TokenVerifier, VerifyError};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::{Role, UserId};

/// Account details as returned by `GET /api/auth/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

impl Session {
    #[must_use]
    pub const fn role(&self) -> Role {
        self.user.role
    }

    #[must_use]
    pub const fn view(&self) -> View {
        View::for_role(self.user.role)
    }
}

/// Protected view selected by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    AdminDashboard,
    ViewerDashboard,
}

impl View {
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Self::AdminDashboard,
            Role::Viewer => Self::ViewerDashboard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Loading,
    Unauthenticated,
    Authenticated(Session),
}

impl GateState {
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

pub struct AuthGate<S, V> {
    store: S,
    verifier: V,
    state: GateState,
}

impl<S: TokenStore, V: TokenVerifier> AuthGate<S, V> {
    #[must_use]
    pub const fn new(store: S, verifier: V) -> Self {
        Self {
            store,
            verifier,
            state: GateState::Loading,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &GateState {
        &self.state
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Runs the mount sequence and returns the settled state.
    pub async fn mount(&mut self) -> &GateState {
        self.state = GateState::Loading;

        let token = match self.store.load().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("No stored token");
                self.state = GateState::Unauthenticated;
                return &self.state;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                self.state = GateState::Unauthenticated;
                return &self.state;
            }
        };

        self.state = match self.verifier.verify(&token).await {
            Ok(user) => {
                info!(user_id = %user.id, role = %user.role, "Session verified");
                GateState::Authenticated(Session { token, user })
            }
            Err(e) => {
                info!(error = %e, "Stored token rejected, clearing it");
                if let Err(clear_err) = self.store.clear().await {
                    warn!(error = %clear_err, "Failed to clear stored token");
                }
                GateState::Unauthenticated
            }
        };

        &self.state
    }

    /// Forgets the session and the stored token.
    pub async fn logout(&mut self) -> anyhow::Result<()> {
        self.store.clear().await?;
        self.state = GateState::Unauthenticated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubVerifier {
        accept: Option<Role>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl TokenVerifier for StubVerifier {
        async fn verify(&self, _token: &str) -> Result<SessionUser, VerifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.accept {
                Some(role) => Ok(SessionUser {
                    id: UserId::new(7),
                    username: "lan".to_string(),
                    email: "lan@example.com".to_string(),
                    name: "Tran Lan".to_string(),
                    role,
                    last_login: None,
                }),
                None => Err(VerifyError::Rejected("Token không hợp lệ".to_string())),
            }
        }
    }

    fn stub(accept: Option<Role>) -> (StubVerifier, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            StubVerifier {
                accept,
                calls: calls.clone(),
            },
            calls,
        )
    }

    #[tokio::test]
    async fn test_starts_loading() {
        let (verifier, _) = stub(Some(Role::Admin));
        let gate = AuthGate::new(MemoryTokenStore::default(), verifier);
        assert_eq!(gate.state(), &GateState::Loading);
    }

    #[tokio::test]
    async fn test_no_token_skips_verification() {
        let (verifier, calls) = stub(Some(Role::Admin));
        let mut gate = AuthGate::new(MemoryTokenStore::default(), verifier);

        assert_eq!(gate.mount().await, &GateState::Unauthenticated);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_valid_token_selects_view_by_role() {
        let (verifier, _) = stub(Some(Role::Admin));
        let mut gate = AuthGate::new(MemoryTokenStore::with_token("tok"), verifier);
        let session = gate.mount().await.session().cloned().unwrap();
        assert_eq!(session.view(), View::AdminDashboard);
        assert_eq!(session.token, "tok");

        let (verifier, _) = stub(Some(Role::Viewer));
        let mut gate = AuthGate::new(MemoryTokenStore::with_token("tok"), verifier);
        let session = gate.mount().await.session().cloned().unwrap();
        assert_eq!(session.view(), View::ViewerDashboard);
    }

    #[tokio::test]
    async fn test_rejected_token_is_cleared() {
        let (verifier, calls) = stub(None);
        let mut gate = AuthGate::new(MemoryTokenStore::with_token("stale"), verifier);

        assert_eq!(gate.mount().await, &GateState::Unauthenticated);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(gate.store().load().await.unwrap(), None);

        // Next mount has nothing to verify
        gate.mount().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let (verifier, _) = stub(Some(Role::Viewer));
        let mut gate = AuthGate::new(MemoryTokenStore::with_token("tok"), verifier);
        gate.mount().await;

        gate.logout().await.unwrap();
        assert_eq!(gate.state(), &GateState::Unauthenticated);
        assert_eq!(gate.store().load().await.unwrap(), None);
    }
}
