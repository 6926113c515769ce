//! Domain service for the read-only transaction ledger.
//!
//! Listing with filters and offset pagination, dashboard statistics and
//! single-record lookup. Records are written by the mail ingestion job and
//! never modified here.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::db::{BankStatRow, TransactionFilter, TransactionRecord};

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Transaction not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for TransactionError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for TransactionError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Ledger entry as exposed over the API, keeping the ledger's field names.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TransactionDto {
    pub id: i32,
    #[serde(rename = "taiKhoanChuyen")]
    pub sender_account: String,
    #[serde(rename = "taiKhoanNhan")]
    pub receiver_account: String,
    #[serde(rename = "tenNguoiChuyen")]
    pub sender_name: String,
    #[serde(rename = "nganHangChuyen")]
    pub sender_bank: String,
    #[serde(rename = "loaiGiaoDich")]
    pub transaction_type: String,
    #[serde(rename = "maGiaoDich")]
    pub transaction_code: String,
    #[serde(rename = "ngayGioGiaoDich")]
    pub transaction_date_time: DateTime<Utc>,
    #[serde(rename = "soTien")]
    pub amount_display: String,
    #[serde(rename = "soTienNumber")]
    pub amount_numeric: f64,
    #[serde(rename = "phiGiaoDich")]
    pub fee_display: String,
    #[serde(rename = "phiGiaoDichNumber")]
    pub fee_numeric: f64,
    #[serde(rename = "noiDungGiaoDich")]
    pub description: String,
    #[serde(rename = "emailId")]
    pub source_email_id: Option<String>,
    #[serde(rename = "historyId")]
    pub source_history_id: Option<String>,
    #[serde(rename = "processedAt")]
    pub processed_at: DateTime<Utc>,
}

impl From<TransactionRecord> for TransactionDto {
    fn from(model: TransactionRecord) -> Self {
        Self {
            id: model.id,
            sender_account: model.sender_account,
            receiver_account: model.receiver_account,
            sender_name: model.sender_name,
            sender_bank: model.sender_bank,
            transaction_type: model.transaction_type,
            transaction_code: model.transaction_code,
            transaction_date_time: model.transaction_date_time,
            amount_display: model.amount_display,
            amount_numeric: model.amount_numeric,
            fee_display: model.fee_display,
            fee_numeric: model.fee_numeric,
            description: model.description,
            source_email_id: model.source_email_id,
            source_history_id: model.source_history_id,
            processed_at: model.processed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_count: u64,
    pub limit: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    #[must_use]
    pub const fn new(current_page: u64, limit: u64, total_count: u64, total_pages: u64) -> Self {
        Self {
            current_page,
            total_pages,
            total_count,
            limit,
            has_next_page: current_page < total_pages,
            has_prev_page: current_page > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionList {
    pub transactions: Vec<TransactionDto>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BankStat {
    pub bank: String,
    pub count: u64,
    pub total_amount: f64,
}

impl From<BankStatRow> for BankStat {
    fn from(row: BankStatRow) -> Self {
        Self {
            bank: row.bank,
            count: u64::try_from(row.tx_count).unwrap_or(0),
            total_amount: row.total_amount.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStats {
    pub total_transactions: u64,
    /// Sum of positive amounts only
    pub total_incoming: f64,
    pub today_transactions: u64,
    /// Sum of today's positive amounts
    pub today_amount: f64,
    pub bank_stats: Vec<BankStat>,
}

/// UTC instants of `date`'s midnight and the following midnight in `tz`.
///
/// On a day where midnight falls in a DST gap the wall-clock time is read as UTC.
pub fn day_bounds<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_instant(tz, date, NaiveTime::MIN);
    let end = date
        .succ_opt()
        .map_or(DateTime::<Utc>::MAX_UTC, |next| local_instant(tz, next, NaiveTime::MIN));
    (start, end)
}

/// UTC instant of the wall-clock `date` + `time` in `tz`.
pub fn local_instant<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    let naive = date.and_time(time);
    tz.from_local_datetime(&naive)
        .earliest()
        .map_or_else(|| Utc.from_utc_datetime(&naive), |dt| dt.with_timezone(&Utc))
}

/// Domain service trait for ledger queries.
#[async_trait::async_trait]
pub trait TransactionService: Send + Sync {
    /// One page of records matching `filter`, newest first.
    ///
    /// `page` and `limit` must both be at least 1.
    async fn list(
        &self,
        filter: &TransactionFilter,
        page: u64,
        limit: u64,
    ) -> Result<TransactionList, TransactionError>;

    /// Dashboard aggregates; "today" is the server's local calendar day.
    async fn stats(&self) -> Result<TransactionStats, TransactionError>;

    /// Looks up one record by its transaction code.
    async fn get(&self, code: &str) -> Result<TransactionDto, TransactionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_day_bounds_in_utc_plus_seven() {
        let tz = FixedOffset::east_opt(7 * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        let (start, end) = day_bounds(&tz, date);

        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 9, 17, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 10, 17, 0, 0).unwrap());
    }

    #[test]
    fn test_pagination_flags() {
        let first = Pagination::new(1, 20, 45, 3);
        assert!(first.has_next_page);
        assert!(!first.has_prev_page);

        let last = Pagination::new(3, 20, 45, 3);
        assert!(!last.has_next_page);
        assert!(last.has_prev_page);

        let empty = Pagination::new(1, 20, 0, 0);
        assert!(!empty.has_next_page);
        assert!(!empty.has_prev_page);
    }

    #[test]
    fn test_dto_uses_ledger_field_names() {
        let dto = TransactionDto {
            id: 1,
            sender_account: "0011".to_string(),
            receiver_account: "0022".to_string(),
            sender_name: "LE ANH DUY".to_string(),
            sender_bank: "VCB".to_string(),
            transaction_type: "Chuyen tien".to_string(),
            transaction_code: "FT123".to_string(),
            transaction_date_time: Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
            amount_display: "+100,000 VND".to_string(),
            amount_numeric: 100_000.0,
            fee_display: "0 VND".to_string(),
            fee_numeric: 0.0,
            description: "thanh toan".to_string(),
            source_email_id: None,
            source_history_id: None,
            processed_at: Utc.with_ymd_and_hms(2025, 1, 1, 9, 1, 0).unwrap(),
        };

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["tenNguoiChuyen"], "LE ANH DUY");
        assert_eq!(json["maGiaoDich"], "FT123");
        assert_eq!(json["soTienNumber"], 100_000.0);
    }
}
