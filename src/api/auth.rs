use axum::{
    Extension, Json,
    extract::{Request, State, rejection::JsonRejection},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, LoginBody, UserBody};
use crate::constants::messages;
use crate::db::User;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    /// Username or email
    pub username: String,
    pub password: String,
}

/// Raw bearer token, for routes that forward it upstream.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// The account behind a locally verified token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

// ============================================================================
// Middleware
// ============================================================================

/// Verifies `Authorization: Bearer <token>` locally and reloads the account.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&headers)
        .ok_or_else(|| ApiError::unauthorized(messages::TOKEN_MISSING))?;

    let user = state.auth_service().verify_token(&token).await.map_err(|e| {
        tracing::debug!(error = %e, "Token rejected");
        ApiError::from(e)
    })?;

    tracing::Span::current().record("user_id", user.id.value());
    request.extensions_mut().insert(BearerToken(token));
    request.extensions_mut().insert(AuthUser(user));

    Ok(next.run(request).await)
}

/// Only checks that a bearer token is present. The workforce API validates it.
pub async fn require_bearer(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&headers)
        .ok_or_else(|| ApiError::unauthorized(messages::TOKEN_MISSING))?;

    request.extensions_mut().insert(BearerToken(token));
    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token.to_string())
    } else {
        None
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginBody>>, ApiError> {
    let Json(payload) =
        payload.map_err(|_| ApiError::validation(messages::LOGIN_FIELDS_REQUIRED))?;

    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation(messages::LOGIN_FIELDS_REQUIRED));
    }

    let result = state
        .auth_service()
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(LoginBody {
        token: result.token,
        user: result.user,
    })))
}

/// GET /auth/verify
pub async fn verify(Extension(AuthUser(user)): Extension<AuthUser>) -> Json<ApiResponse<UserBody>> {
    Json(ApiResponse::success(UserBody { user }))
}
