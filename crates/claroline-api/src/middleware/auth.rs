//! Session Middleware
//!
//! Extracts the session token from the `session_token` cookie or an
//! `Authorization: Bearer` header, validates it, and reloads the user from the
//! store so handlers always see current roles. The refreshed
//! [`UserAccount`] is made available to handlers via Axum's Extension.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Duration;
use claroline_auth::{AuthError, AuthResult, UserAccount};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::failure::RequestKind;
use crate::models::ErrorResponse;
use crate::AppState;

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "session_token";

/// `Set-Cookie` value opening a session that lasts `ttl`
pub fn session_cookie(token: &str, ttl: Duration) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl.num_seconds().max(0)
    )
}

/// Middleware guarding every protected route
///
/// Authentication failures (missing, invalid or expired token, vanished user)
/// are answered by the configured failure handler. Storage faults while
/// refreshing the user yield 500.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let kind = RequestKind::classify(request.headers());

    let account = match authenticate_session(&state, request.headers()).await {
        Ok(account) => account,
        Err(e) if e.is_authentication_failure() => {
            warn!(?kind, "Session rejected: {}", e);
            return state.failure_handler.on_authentication_failure(kind, &e);
        }
        Err(e) => {
            error!("Failed to refresh session user: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to load the session user".to_string(),
                    code: Some("INTERNAL_ERROR".to_string()),
                }),
            )
                .into_response();
        }
    };

    debug!(username = %account.user.username, "Session accepted");
    request.extensions_mut().insert(account);

    next.run(request).await
}

async fn authenticate_session(state: &AppState, headers: &HeaderMap) -> AuthResult<UserAccount> {
    let token = session_token(headers).ok_or_else(|| {
        AuthError::InvalidSession(
            "Missing session token (cookie or Authorization header)".to_string(),
        )
    })?;

    let claims = state.tokens.validate(token)?;

    state.provider().refresh_user(&claims).await
}

/// Cookie first (browsers), then the Authorization header (API clients)
fn session_token(headers: &HeaderMap) -> Option<&str> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .map(str::trim)
        .find_map(|cookie| {
            cookie
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        });

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
    })
}
