use chamcong::config::Config;
use chamcong::db::repositories::user::hash_password;
use chamcong::db::{NewUser, Store};
use chamcong::domain::Role;
use chamcong::gate::{
    AuthGate, FileTokenStore, GateState, MemoryTokenStore, PortalClient, TokenStore, View,
};
use chamcong::state::SharedState;
use std::sync::Arc;

const PASSWORD: &str = "quanly-2025";

/// Serves the portal on an ephemeral port and returns its base URL.
async fn spawn_portal() -> (String, Store) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.security.token_secret = "gate-test-secret".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let store = Store::new(&config.general.database_path).await.unwrap();
    for (username, role) in [("quanly", Role::Admin), ("nhanvien", Role::Viewer)] {
        let hash = hash_password(PASSWORD, Some(&config.security)).unwrap();
        store
            .create_user(
                NewUser {
                    username: username.to_string(),
                    email: format!("{username}@example.com"),
                    name: username.to_uppercase(),
                    role,
                },
                hash,
            )
            .await
            .unwrap();
    }

    let shared = Arc::new(SharedState::with_store(config, store.clone()).unwrap());
    let app = chamcong::api::router(chamcong::api::create_app_state(shared, None));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), store)
}

#[tokio::test]
async fn test_login_then_mount_resolves_role_view() {
    let (url, _) = spawn_portal().await;
    let client = PortalClient::new(&url).unwrap();

    let reply = client.login("quanly", PASSWORD).await.unwrap();
    assert_eq!(reply.user.role, Role::Admin);

    let store = MemoryTokenStore::default();
    store.save(&reply.token).await.unwrap();

    let mut gate = AuthGate::new(store, client.clone());
    let session = gate.mount().await.session().cloned().unwrap();
    assert_eq!(session.view(), View::AdminDashboard);
    assert_eq!(session.user.username, "quanly");

    let viewer = client.login("nhanvien", PASSWORD).await.unwrap();
    let mut gate = AuthGate::new(MemoryTokenStore::with_token(viewer.token), client);
    let session = gate.mount().await.session().cloned().unwrap();
    assert_eq!(session.view(), View::ViewerDashboard);
}

#[tokio::test]
async fn test_wrong_password_login_fails() {
    let (url, _) = spawn_portal().await;
    let client = PortalClient::new(&url).unwrap();

    let err = client.login("quanly", "sai").await.unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_rejected_token_is_removed_from_file_store() {
    let (url, _) = spawn_portal().await;
    let client = PortalClient::new(&url).unwrap();

    let dir = std::env::temp_dir().join(format!("chamcong-gate-{}", uuid::Uuid::new_v4()));
    let store = FileTokenStore::new(dir.join("token"));
    store.save("forged.token.value").await.unwrap();

    let mut gate = AuthGate::new(store, client);
    assert_eq!(gate.mount().await, &GateState::Unauthenticated);
    assert_eq!(gate.store().load().await.unwrap(), None);

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_disabled_account_loses_session_on_next_mount() {
    let (url, store) = spawn_portal().await;
    let client = PortalClient::new(&url).unwrap();
    let reply = client.login("nhanvien", PASSWORD).await.unwrap();

    let mut gate = AuthGate::new(MemoryTokenStore::with_token(reply.token), client);
    assert!(gate.mount().await.session().is_some());

    store.set_user_active("nhanvien", false).await.unwrap();
    assert_eq!(gate.mount().await, &GateState::Unauthenticated);
}

#[tokio::test]
async fn test_unreachable_portal_leaves_user_signed_out() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = PortalClient::new(&format!("http://{addr}")).unwrap();
    let mut gate = AuthGate::new(MemoryTokenStore::with_token("tok"), client);
    assert_eq!(gate.mount().await, &GateState::Unauthenticated);
}
