//! `SeaORM` implementation of the `TransactionService` trait.

use async_trait::async_trait;
use chrono::Local;

use crate::constants::stats::TOP_BANKS;
use crate::db::{Store, TransactionFilter};
use crate::services::transaction_service::{
    BankStat, Pagination, TransactionDto, TransactionError, TransactionList, TransactionService,
    TransactionStats, day_bounds,
};

pub struct SeaOrmTransactionService {
    store: Store,
}

impl SeaOrmTransactionService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TransactionService for SeaOrmTransactionService {
    async fn list(
        &self,
        filter: &TransactionFilter,
        page: u64,
        limit: u64,
    ) -> Result<TransactionList, TransactionError> {
        if page == 0 || limit == 0 {
            return Err(TransactionError::Validation(
                "page and limit must be at least 1".to_string(),
            ));
        }

        let result = self.store.list_transactions(filter, page, limit).await?;

        Ok(TransactionList {
            transactions: result.items.into_iter().map(TransactionDto::from).collect(),
            pagination: Pagination::new(page, limit, result.total_count, result.total_pages),
        })
    }

    async fn stats(&self) -> Result<TransactionStats, TransactionError> {
        let today = Local::now().date_naive();
        let (day_start, day_end) = day_bounds(&Local, today);

        let totals = self.store.transaction_totals(day_start, day_end).await?;
        let banks = self.store.top_sender_banks(TOP_BANKS).await?;

        Ok(TransactionStats {
            total_transactions: totals.total_transactions,
            total_incoming: totals.total_incoming,
            today_transactions: totals.today_transactions,
            today_amount: totals.today_amount,
            bank_stats: banks.into_iter().map(BankStat::from).collect(),
        })
    }

    async fn get(&self, code: &str) -> Result<TransactionDto, TransactionError> {
        self.store
            .get_transaction_by_code(code)
            .await?
            .map(TransactionDto::from)
            .ok_or_else(|| TransactionError::NotFound(code.to_string()))
    }
}
