//! API Middleware
//!
//! Session checks for the protected part of the API.

pub mod auth;

pub use auth::{require_session, session_cookie, SESSION_COOKIE};
