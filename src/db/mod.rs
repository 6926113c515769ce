use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::info;

use crate::domain::{Role, UserId};

pub mod migrator;
pub mod repositories;

pub use crate::entities::transactions::Model as TransactionRecord;
pub use repositories::transaction::{
    BankStatRow, NewTransaction, TransactionFilter, TransactionPage, TransactionTotals,
};
pub use repositories::user::{NewUser, User};

#[derive(Debug, Clone)]
struct StoreOptions {
    db_url: String,
    max_connections: u32,
    min_connections: u32,
}

/// Handle to the document store.
///
/// Cloning is cheap and every clone shares the same pool. The pool itself is
/// created by whichever caller first needs it; concurrent first callers wait
/// on the same initialization instead of racing to open their own.
#[derive(Clone)]
pub struct Store {
    options: Arc<StoreOptions>,
    conn: Arc<OnceCell<DatabaseConnection>>,
}

impl Store {
    /// Builds a handle without touching the database.
    #[must_use]
    pub fn lazy(db_url: &str, max_connections: u32, min_connections: u32) -> Self {
        Self {
            options: Arc::new(StoreOptions {
                db_url: db_url.to_string(),
                max_connections,
                min_connections,
            }),
            conn: Arc::new(OnceCell::new()),
        }
    }

    /// Connects eagerly. Used by CLI commands that always need the database.
    pub async fn new(db_url: &str) -> Result<Self> {
        let store = Self::lazy(db_url, 5, 1);
        store.connection().await?;
        Ok(store)
    }

    pub async fn connection(&self) -> Result<&DatabaseConnection> {
        self.conn
            .get_or_try_init(|| connect(&self.options))
            .await
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.conn.initialized()
    }

    pub async fn ping(&self) -> Result<()> {
        let conn = self.connection().await?;
        let backend = conn.get_database_backend();
        conn.query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    async fn user_repo(&self) -> Result<repositories::user::UserRepository> {
        Ok(repositories::user::UserRepository::new(
            self.connection().await?.clone(),
        ))
    }

    async fn transaction_repo(&self) -> Result<repositories::transaction::TransactionRepository> {
        Ok(repositories::transaction::TransactionRepository::new(
            self.connection().await?.clone(),
        ))
    }

    pub async fn find_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<(User, String)>> {
        self.user_repo()
            .await?
            .get_by_identifier_with_password(identifier)
            .await
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().await?.get_by_id(id).await
    }

    pub async fn touch_last_login(&self, id: UserId) -> Result<()> {
        self.user_repo().await?.touch_last_login(id).await
    }

    pub async fn create_user(&self, user: NewUser, password_hash: String) -> Result<User> {
        self.user_repo().await?.create(user, password_hash).await
    }

    pub async fn set_user_active(&self, identifier: &str, active: bool) -> Result<bool> {
        self.user_repo().await?.set_active(identifier, active).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().await?.list().await
    }

    pub async fn set_user_role(&self, identifier: &str, role: Role) -> Result<bool> {
        self.user_repo().await?.set_role(identifier, role).await
    }

    pub async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        page: u64,
        limit: u64,
    ) -> Result<TransactionPage> {
        self.transaction_repo()
            .await?
            .list(filter, page, limit)
            .await
    }

    pub async fn get_transaction_by_code(&self, code: &str) -> Result<Option<TransactionRecord>> {
        self.transaction_repo().await?.get_by_code(code).await
    }

    pub async fn transaction_totals(
        &self,
        day_start: chrono::DateTime<chrono::Utc>,
        day_end: chrono::DateTime<chrono::Utc>,
    ) -> Result<TransactionTotals> {
        self.transaction_repo()
            .await?
            .totals(day_start, day_end)
            .await
    }

    pub async fn top_sender_banks(&self, limit: u64) -> Result<Vec<BankStatRow>> {
        self.transaction_repo().await?.top_sender_banks(limit).await
    }

    /// Inserts ledger rows, skipping codes that already exist. Returns the number inserted.
    pub async fn insert_transactions(&self, rows: Vec<NewTransaction>) -> Result<u64> {
        self.transaction_repo().await?.insert_many(rows).await
    }
}

async fn connect(options: &StoreOptions) -> Result<DatabaseConnection> {
    use sea_orm_migration::MigratorTrait;

    let in_memory = options.db_url.contains(":memory:");

    if !in_memory {
        let path_str = options.db_url.trim_start_matches("sqlite:");
        let path_str = path_str.split('?').next().unwrap_or(path_str);
        if let Some(parent) = Path::new(path_str).parent() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
        if !Path::new(path_str).exists() {
            std::fs::File::create(path_str)
                .with_context(|| format!("Failed to create database file: {path_str}"))?;
        }
    }

    // Every pooled connection to `:memory:` would see its own empty database.
    let max_connections = if in_memory { 1 } else { options.max_connections };
    let min_connections = options.min_connections.min(max_connections);

    let mut opt = ConnectOptions::new(options.db_url.clone());
    opt.max_connections(max_connections)
        .min_connections(min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(600))
        .sqlx_logging(false);

    let conn = Database::connect(opt)
        .await
        .context("Failed to connect to database")?;

    migrator::Migrator::up(&conn, None)
        .await
        .context("Failed to apply migrations")?;

    info!(
        "Database connected & migrations applied (pool: {}-{})",
        min_connections, max_connections
    );

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lazy_store_connects_once() {
        let store = Store::lazy("sqlite::memory:", 5, 1);
        assert!(!store.is_connected());

        let clone = store.clone();
        let (a, b) = tokio::join!(store.ping(), clone.ping());
        a.unwrap();
        b.unwrap();

        assert!(store.is_connected());
        assert!(clone.is_connected());
        assert!(std::ptr::eq(
            store.connection().await.unwrap(),
            clone.connection().await.unwrap()
        ));
    }
}
