use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr, OnConflict, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::{prelude::*, transactions};

/// Filters for the ledger listing. Every populated field narrows the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Matched against name, both accounts, code and description.
    pub search: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub transaction_type: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub sender_bank: Option<String>,
}

impl TransactionFilter {
    #[must_use]
    pub fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        if let Some(search) = non_empty(self.search.as_deref()) {
            condition = condition.add(
                Condition::any()
                    .add(contains_ci(transactions::Column::SenderName, search))
                    .add(contains_ci(transactions::Column::SenderAccount, search))
                    .add(contains_ci(transactions::Column::ReceiverAccount, search))
                    .add(contains_ci(transactions::Column::TransactionCode, search))
                    .add(contains_ci(transactions::Column::Description, search)),
            );
        }

        if let Some(from) = self.date_from {
            condition = condition.add(transactions::Column::TransactionDateTime.gte(from));
        }

        if let Some(to) = self.date_to {
            condition = condition.add(transactions::Column::TransactionDateTime.lte(to));
        }

        if let Some(kind) = non_empty(self.transaction_type.as_deref()) {
            condition = condition.add(contains_ci(transactions::Column::TransactionType, kind));
        }

        if let Some(min) = self.min_amount {
            condition = condition.add(transactions::Column::AmountNumeric.gte(min));
        }

        if let Some(max) = self.max_amount {
            condition = condition.add(transactions::Column::AmountNumeric.lte(max));
        }

        if let Some(bank) = non_empty(self.sender_bank.as_deref()) {
            condition = condition.add(contains_ci(transactions::Column::SenderBank, bank));
        }

        condition
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `%`, `_` and `\` in user input match literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn contains_ci(column: transactions::Column, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&needle.to_ascii_lowercase()));
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape('\\'))
}

#[derive(Debug, Clone)]
pub struct TransactionPage {
    pub items: Vec<transactions::Model>,
    pub total_count: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransactionTotals {
    pub total_transactions: u64,
    pub total_incoming: f64,
    pub today_transactions: u64,
    pub today_amount: f64,
}

#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct BankStatRow {
    pub bank: String,
    pub tx_count: i64,
    pub total_amount: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub sender_account: String,
    pub receiver_account: String,
    pub sender_name: String,
    pub sender_bank: String,
    pub transaction_type: String,
    pub transaction_code: String,
    pub transaction_date_time: DateTime<Utc>,
    pub amount_display: String,
    pub amount_numeric: f64,
    pub fee_display: String,
    pub fee_numeric: f64,
    pub description: String,
    pub source_email_id: Option<String>,
    pub source_history_id: Option<String>,
}

impl From<NewTransaction> for transactions::ActiveModel {
    fn from(tx: NewTransaction) -> Self {
        Self {
            sender_account: Set(tx.sender_account),
            receiver_account: Set(tx.receiver_account),
            sender_name: Set(tx.sender_name),
            sender_bank: Set(tx.sender_bank),
            transaction_type: Set(tx.transaction_type),
            transaction_code: Set(tx.transaction_code),
            transaction_date_time: Set(tx.transaction_date_time),
            amount_display: Set(tx.amount_display),
            amount_numeric: Set(tx.amount_numeric),
            fee_display: Set(tx.fee_display),
            fee_numeric: Set(tx.fee_numeric),
            description: Set(tx.description),
            source_email_id: Set(tx.source_email_id),
            source_history_id: Set(tx.source_history_id),
            processed_at: Set(Utc::now()),
            ..Default::default()
        }
    }
}

pub struct TransactionRepository {
    conn: DatabaseConnection,
}

impl TransactionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// `page` is 1-based; callers validate `page >= 1` and `limit >= 1`.
    pub async fn list(
        &self,
        filter: &TransactionFilter,
        page: u64,
        limit: u64,
    ) -> Result<TransactionPage> {
        let paginator = Transactions::find()
            .filter(filter.condition())
            .order_by_desc(transactions::Column::TransactionDateTime)
            .order_by_desc(transactions::Column::Id)
            .paginate(&self.conn, limit);

        let counts = paginator
            .num_items_and_pages()
            .await
            .context("Failed to count transactions")?;

        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .context("Failed to fetch transactions page")?;

        Ok(TransactionPage {
            items,
            total_count: counts.number_of_items,
            total_pages: counts.number_of_pages,
        })
    }

    pub async fn get_by_code(&self, code: &str) -> Result<Option<transactions::Model>> {
        Transactions::find()
            .filter(transactions::Column::TransactionCode.eq(code))
            .one(&self.conn)
            .await
            .context("Failed to query transaction by code")
    }

    async fn sum_incoming(&self, window: Option<(DateTime<Utc>, DateTime<Utc>)>) -> Result<f64> {
        let mut query = Transactions::find()
            .select_only()
            .column_as(Expr::col(transactions::Column::AmountNumeric).sum(), "total")
            .filter(transactions::Column::AmountNumeric.gt(0.0));

        if let Some((start, end)) = window {
            query = query
                .filter(transactions::Column::TransactionDateTime.gte(start))
                .filter(transactions::Column::TransactionDateTime.lt(end));
        }

        let total = query
            .into_tuple::<Option<f64>>()
            .one(&self.conn)
            .await
            .context("Failed to sum incoming amounts")?;

        Ok(total.flatten().unwrap_or(0.0))
    }

    /// Counts and sums for the dashboard. `[day_start, day_end)` bounds "today".
    pub async fn totals(
        &self,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> Result<TransactionTotals> {
        let total_transactions = Transactions::find()
            .count(&self.conn)
            .await
            .context("Failed to count transactions")?;

        let today_transactions = Transactions::find()
            .filter(transactions::Column::TransactionDateTime.gte(day_start))
            .filter(transactions::Column::TransactionDateTime.lt(day_end))
            .count(&self.conn)
            .await
            .context("Failed to count today's transactions")?;

        let total_incoming = self.sum_incoming(None).await?;
        let today_amount = self.sum_incoming(Some((day_start, day_end))).await?;

        Ok(TransactionTotals {
            total_transactions,
            total_incoming,
            today_transactions,
            today_amount,
        })
    }

    /// Incoming transactions grouped by sender bank, busiest first.
    pub async fn top_sender_banks(&self, limit: u64) -> Result<Vec<BankStatRow>> {
        Transactions::find()
            .select_only()
            .column_as(transactions::Column::SenderBank, "bank")
            .column_as(Expr::col(transactions::Column::Id).count(), "tx_count")
            .column_as(
                Expr::col(transactions::Column::AmountNumeric).sum(),
                "total_amount",
            )
            .filter(transactions::Column::AmountNumeric.gt(0.0))
            .group_by(transactions::Column::SenderBank)
            .order_by_desc(Expr::cust("tx_count"))
            .order_by_asc(transactions::Column::SenderBank)
            .limit(limit)
            .into_model::<BankStatRow>()
            .all(&self.conn)
            .await
            .context("Failed to aggregate sender banks")
    }

    pub async fn insert_many(&self, rows: Vec<NewTransaction>) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let models = rows
            .into_iter()
            .map(transactions::ActiveModel::from)
            .collect::<Vec<_>>();

        let inserted = Transactions::insert_many(models)
            .on_conflict(
                OnConflict::column(transactions::Column::TransactionCode)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert transactions")?;

        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("DUY"), "DUY");
    }

    #[test]
    fn test_empty_filter_adds_no_conditions() {
        assert!(TransactionFilter::default().condition().is_empty());
    }

    #[test]
    fn test_search_is_or_across_fields_and_anded_with_bank() {
        let filter = TransactionFilter {
            search: Some("Duy".to_string()),
            sender_bank: Some("VCB".to_string()),
            ..TransactionFilter::default()
        };
        let sql = Transactions::find()
            .filter(filter.condition())
            .build(DbBackend::Sqlite)
            .to_string();

        assert!(sql.contains("LOWER(\"sender_name\") LIKE '%duy%'"));
        assert!(sql.contains("LOWER(\"description\") LIKE '%duy%'"));
        assert!(sql.contains(" OR "));
        assert!(sql.contains(" AND "));
        assert!(sql.contains("LOWER(\"sender_bank\") LIKE '%vcb%'"));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let filter = TransactionFilter {
            search: Some("   ".to_string()),
            ..TransactionFilter::default()
        };
        assert!(filter.condition().is_empty());
    }
}
