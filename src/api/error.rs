use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::clients::workforce::UpstreamError;
use crate::constants::messages;
use crate::services::{AttendanceError, AuthError, TransactionError};

#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),

    Unauthorized(String),

    NotFound(String),

    /// Status and message relayed from the workforce API.
    Upstream { status: StatusCode, message: String },

    /// Detail is logged; clients get the generic message unless the server
    /// runs in development mode.
    InternalError(String),
}

/// Attached to 500 responses so `expose_error_details` can surface it.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::Upstream { status, message } => {
                write!(f, "Upstream error {status}: {message}")
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, detail) = match self {
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Upstream { status, message } => (status, message, None),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    messages::INTERNAL_ERROR.to_string(),
                    Some(ErrorDetail(msg)),
                )
            }
        };

        let mut response = (status, Json(ApiResponse::<()>::error(message))).into_response();
        if let Some(detail) = detail {
            response.extensions_mut().insert(detail);
        }
        response
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(format!("{err:#}"))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::Inactive => {
                ApiError::Unauthorized(messages::INVALID_CREDENTIALS.to_string())
            }
            AuthError::InvalidToken(_) | AuthError::StaleToken => {
                ApiError::Unauthorized(messages::TOKEN_INVALID.to_string())
            }
            AuthError::Validation(_) => {
                ApiError::ValidationError(messages::LOGIN_FIELDS_REQUIRED.to_string())
            }
            AuthError::Database(msg) | AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<TransactionError> for ApiError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::NotFound(_) => {
                ApiError::NotFound(messages::TRANSACTION_NOT_FOUND.to_string())
            }
            TransactionError::Validation(msg) => ApiError::ValidationError(msg),
            TransactionError::Database(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Rejected { status, message } => ApiError::Upstream { status, message },
            UpstreamError::Unreachable(detail) => {
                tracing::error!("Workforce API unreachable: {}", detail);
                ApiError::Upstream {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: messages::UPSTREAM_UNREACHABLE.to_string(),
                }
            }
            UpstreamError::InvalidResponse(detail) => {
                tracing::warn!("Workforce API returned a non-JSON body: {}", detail);
                ApiError::Upstream {
                    status: StatusCode::BAD_GATEWAY,
                    message: messages::UPSTREAM_FALLBACK.to_string(),
                }
            }
        }
    }
}

impl From<AttendanceError> for ApiError {
    fn from(err: AttendanceError) -> Self {
        match err {
            AttendanceError::EarlyCheckout => {
                ApiError::ValidationError(messages::EARLY_CHECKOUT.to_string())
            }
            other => ApiError::ValidationError(other.to_string()),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::TokenError;

    #[test]
    fn test_credential_failures_share_one_message() {
        let unknown = ApiError::from(AuthError::InvalidCredentials);
        let inactive = ApiError::from(AuthError::Inactive);

        let (ApiError::Unauthorized(a), ApiError::Unauthorized(b)) = (unknown, inactive) else {
            panic!("expected Unauthorized");
        };
        assert_eq!(a, b);
        assert_eq!(a, messages::INVALID_CREDENTIALS);
    }

    #[test]
    fn test_token_failures_map_to_401() {
        let response = ApiError::from(AuthError::InvalidToken(TokenError::Expired)).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_internal_error_hides_detail_but_keeps_it_as_extension() {
        let response = ApiError::internal("disk on fire").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = response.extensions().get::<ErrorDetail>().unwrap();
        assert_eq!(detail.0, "disk on fire");
    }

    #[test]
    fn test_upstream_status_is_preserved() {
        let response = ApiError::from(UpstreamError::Rejected {
            status: StatusCode::CONFLICT,
            message: "Trung don".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_unreachable_upstream_is_500() {
        let response =
            ApiError::from(UpstreamError::Unreachable("connection refused".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
