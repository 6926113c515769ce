//! Account management command handlers

use anyhow::Context;

use super::read_secret_line;
use crate::config::Config;
use crate::db::repositories::user::hash_password;
use crate::db::{NewUser, Store};
use crate::domain::Role;

const MIN_PASSWORD_LEN: usize = 8;

pub async fn cmd_create_user(
    config: &Config,
    username: &str,
    email: &str,
    name: &str,
    role: Role,
    password: Option<String>,
) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => read_secret_line("Password: ")?,
    };

    if password.chars().count() < MIN_PASSWORD_LEN {
        anyhow::bail!("Password must be at least {MIN_PASSWORD_LEN} characters");
    }

    let security = config.security.clone();
    let password_hash =
        tokio::task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .context("Password hashing task panicked")??;

    let store = Store::new(&config.general.database_path).await?;
    let user = store
        .create_user(
            NewUser {
                username: username.trim().to_string(),
                email: email.trim().to_string(),
                name: name.trim().to_string(),
                role,
            },
            password_hash,
        )
        .await?;

    println!("Created {} account '{}' (ID: {})", user.role, user.username, user.id);
    Ok(())
}

pub async fn cmd_set_active(config: &Config, identifier: &str, active: bool) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    if store.set_user_active(identifier, active).await? {
        let state = if active { "enabled" } else { "disabled" };
        println!("Account '{identifier}' {state}");
    } else {
        println!("No account matches '{identifier}'");
    }
    Ok(())
}

pub async fn cmd_set_role(config: &Config, identifier: &str, role: Role) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    if store.set_user_role(identifier, role).await? {
        println!("Account '{identifier}' is now {role}");
    } else {
        println!("No account matches '{identifier}'");
    }
    Ok(())
}

pub async fn cmd_list_users(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let users = store.list_users().await?;

    if users.is_empty() {
        println!("No accounts yet.");
        println!();
        println!("Create one with: chamcong create-user <username> <email> <name>");
        return Ok(());
    }

    println!("Accounts ({} total)", users.len());
    println!("{:-<70}", "");

    for user in users {
        let marker = if user.is_active { "•" } else { "✗" };
        let last_login = user
            .last_login
            .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());

        println!("{marker} {} <{}> [{}]", user.username, user.email, user.role);
        println!("  ID: {} | Name: {} | Last login: {last_login}", user.id, user.name);
    }

    Ok(())
}
