use axum::{
    Extension,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::Method,
    response::Response,
};
use std::sync::Arc;

use super::auth::BearerToken;
use super::proxy::{json_body, relay};
use super::validation::validate_record_id;
use super::{ApiError, AppState};
use crate::services::attendance::normalize_update;

/// PUT /attendance/admin/{id}
///
/// Time fields are normalized to UTC and checked for order before relaying.
pub async fn update_attendance(
    State(state): State<Arc<AppState>>,
    Extension(BearerToken(token)): Extension<BearerToken>,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Response, ApiError> {
    let id = validate_record_id(&id)?;

    let mut body = json_body(&body)?
        .ok_or_else(|| ApiError::validation("Thiếu dữ liệu chấm công"))?;

    normalize_update(&mut body).map_err(|e| {
        tracing::info!(attendance_id = %id, error = %e, "Attendance update rejected");
        ApiError::from(e)
    })?;

    let path = format!("/attendance/admin/{id}");
    relay(
        &state,
        Method::PUT,
        &path,
        query.as_deref(),
        &token,
        Some(&body),
    )
    .await
}
