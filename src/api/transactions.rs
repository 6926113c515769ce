use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{
    DateBound, limit_or_default, page_or_default, parse_amount, parse_date_bound,
    validate_transaction_code,
};
use super::{ApiError, ApiResponse, AppState, StatsBody, TransactionBody};
use crate::db::TransactionFilter;
use crate::services::TransactionList;

/// Raw query string. Everything stays a string so bad numbers fall back to
/// defaults (page, limit) or produce a localized 400 (amounts, dates).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub transaction_type: Option<String>,
    pub min_amount: Option<String>,
    pub max_amount: Option<String>,
    pub sender_bank: Option<String>,
}

impl TransactionQuery {
    fn filter(&self) -> Result<TransactionFilter, ApiError> {
        Ok(TransactionFilter {
            search: self.search.clone(),
            date_from: parse_date_bound(
                "dateFrom",
                self.date_from.as_deref(),
                DateBound::StartOfDay,
            )?,
            date_to: parse_date_bound("dateTo", self.date_to.as_deref(), DateBound::EndOfDay)?,
            transaction_type: self.transaction_type.clone(),
            min_amount: parse_amount("minAmount", self.min_amount.as_deref())?,
            max_amount: parse_amount("maxAmount", self.max_amount.as_deref())?,
            sender_bank: self.sender_bank.clone(),
        })
    }
}

/// GET /transactions
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<ApiResponse<TransactionList>>, ApiError> {
    let filter = query.filter()?;
    let page = page_or_default(query.page.as_deref());
    let limit = limit_or_default(query.limit.as_deref());

    let list = state
        .transaction_service()
        .list(&filter, page, limit)
        .await?;

    Ok(Json(ApiResponse::success(list)))
}

/// GET /transactions/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<StatsBody>>, ApiError> {
    let stats = state.transaction_service().stats().await?;
    Ok(Json(ApiResponse::success(StatsBody { stats })))
}

/// GET /transactions/{code}
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<TransactionBody>>, ApiError> {
    let code = validate_transaction_code(&code)?;
    let transaction = state.transaction_service().get(code).await?;
    Ok(Json(ApiResponse::success(TransactionBody { transaction })))
}
