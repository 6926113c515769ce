//! Client session command handlers

use super::read_secret_line;
use crate::config::Config;
use crate::gate::{AuthGate, FileTokenStore, GateState, PortalClient, TokenStore, View};

fn server_url(config: &Config, server: Option<&str>) -> String {
    server.map_or_else(|| config.client.server_url.clone(), str::to_string)
}

pub async fn cmd_login(
    config: &Config,
    username: &str,
    password: Option<String>,
    server: Option<&str>,
) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => read_secret_line("Password: ")?,
    };

    let client = PortalClient::new(&server_url(config, server))?;
    let reply = client.login(username, &password).await?;

    let store = FileTokenStore::new(config.client.token_path());
    store.save(&reply.token).await?;

    println!("Logged in as {} ({})", reply.user.name, reply.user.role);
    println!("Token saved to {}", store.path().display());
    Ok(())
}

pub async fn cmd_status(config: &Config, server: Option<&str>) -> anyhow::Result<()> {
    let store = FileTokenStore::new(config.client.token_path());
    let verifier = PortalClient::new(&server_url(config, server))?;
    let mut gate = AuthGate::new(store, verifier);

    match gate.mount().await {
        GateState::Authenticated(session) => {
            let view = match session.view() {
                View::AdminDashboard => "admin dashboard",
                View::ViewerDashboard => "viewer dashboard",
            };
            println!("Signed in as {} <{}>", session.user.username, session.user.email);
            println!("  Role: {} | View: {view}", session.role());
            if let Some(last_login) = session.user.last_login {
                println!("  Last login: {}", last_login.format("%Y-%m-%d %H:%M"));
            }
        }
        GateState::Unauthenticated | GateState::Loading => {
            println!("Not signed in. Run: chamcong login <username>");
        }
    }

    Ok(())
}

pub async fn cmd_logout(config: &Config) -> anyhow::Result<()> {
    let store = FileTokenStore::new(config.client.token_path());
    store.clear().await?;
    println!("Signed out.");
    Ok(())
}
