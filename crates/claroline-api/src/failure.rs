//! Authentication failure responses
//!
//! A failed login or an unusable session is answered according to who asked:
//! scripts issuing `XMLHttpRequest`s get a JSON payload they can show inline,
//! browsers get redirected back to the login form with the message in a flash
//! cookie.

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use claroline_auth::AuthError;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

/// Cookie holding the message of the last authentication failure
pub const FLASH_COOKIE: &str = "claroline_auth_error";

const REQUESTED_WITH: &str = "x-requested-with";

/// Shape of the incoming request, decided once at the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Sent by a script (`X-Requested-With: XMLHttpRequest`)
    Xhr,
    Standard,
}

impl RequestKind {
    pub fn classify(headers: &HeaderMap) -> Self {
        let is_xhr = headers
            .get(REQUESTED_WITH)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.eq_ignore_ascii_case("XMLHttpRequest"));

        if is_xhr {
            RequestKind::Xhr
        } else {
            RequestKind::Standard
        }
    }
}

/// Body returned to script callers
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthFailurePayload {
    /// Always `true`
    pub has_error: bool,
    pub error: String,
}

pub trait AuthenticationFailureHandler: Send + Sync {
    fn on_authentication_failure(&self, kind: RequestKind, error: &AuthError) -> Response;
}

/// Redirects to the login form and leaves the message in [`FLASH_COOKIE`]
#[derive(Debug, Clone)]
pub struct DefaultAuthenticationFailureHandler {
    failure_path: String,
}

impl DefaultAuthenticationFailureHandler {
    pub fn new(failure_path: impl Into<String>) -> Self {
        Self {
            failure_path: failure_path.into(),
        }
    }

    pub fn failure_path(&self) -> &str {
        &self.failure_path
    }
}

impl Default for DefaultAuthenticationFailureHandler {
    fn default() -> Self {
        Self::new("/login")
    }
}

impl AuthenticationFailureHandler for DefaultAuthenticationFailureHandler {
    fn on_authentication_failure(&self, _kind: RequestKind, error: &AuthError) -> Response {
        let mut response = Redirect::to(&self.failure_path).into_response();

        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            FLASH_COOKIE,
            urlencoding::encode(&error.to_string())
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!("Dropping authentication flash cookie: {}", e),
        }

        response
    }
}

/// Answers script callers with [`AuthFailurePayload`], everyone else through
/// the wrapped handler
#[derive(Debug, Clone, Default)]
pub struct AjaxAuthenticationFailureHandler {
    fallback: DefaultAuthenticationFailureHandler,
}

impl AjaxAuthenticationFailureHandler {
    pub fn new(fallback: DefaultAuthenticationFailureHandler) -> Self {
        Self { fallback }
    }
}

impl AuthenticationFailureHandler for AjaxAuthenticationFailureHandler {
    fn on_authentication_failure(&self, kind: RequestKind, error: &AuthError) -> Response {
        match kind {
            RequestKind::Xhr => (
                StatusCode::OK,
                Json(AuthFailurePayload {
                    has_error: true,
                    error: error.to_string(),
                }),
            )
                .into_response(),
            RequestKind::Standard => self.fallback.on_authentication_failure(kind, error),
        }
    }
}
