use std::sync::Arc;

use anyhow::Context;

use crate::clients::workforce::WorkforceClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, SeaOrmAuthService, SeaOrmTransactionService, TokenService, TransactionService,
};

/// Everything the HTTP layer and the CLI share. Cheap to clone.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    /// The pool is opened by the first request that needs it.
    pub store: Store,

    pub tokens: TokenService,

    pub auth_service: Arc<dyn AuthService>,

    pub transaction_service: Arc<dyn TransactionService>,

    pub workforce: Arc<WorkforceClient>,
}

impl SharedState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::lazy(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        );
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let tokens = TokenService::new(
            &config.security.token_secret,
            config.security.token_ttl_hours,
        );

        let workforce = Arc::new(
            WorkforceClient::new(&config.upstream).context("Failed to set up workforce client")?,
        );

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            tokens.clone(),
            config.security.clone(),
        ))
            as Arc<dyn AuthService>;

        let transaction_service = Arc::new(SeaOrmTransactionService::new(store.clone()))
            as Arc<dyn TransactionService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            tokens,
            auth_service,
            transaction_service,
            workforce,
        })
    }
}
