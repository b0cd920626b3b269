//! Authentication for the Claroline directory
//!
//! Bridges the user store to the security layer: a [`UserProvider`] loads
//! and refreshes accounts, [`PasswordAuthenticator`] checks credentials, and
//! [`SessionTokens`] issues the signed session carried between requests.

pub mod authenticator;
pub mod error;
pub mod jwt;
pub mod password;
pub mod provider;

pub use authenticator::PasswordAuthenticator;
pub use error::{AuthError, AuthResult};
pub use jwt::{JwtError, SessionClaims, SessionTokens};
pub use password::{hash_password, verify_password, PasswordError};
pub use provider::{EntityUserProvider, SecurityUser, UserProvider, USER_CLASS};

// Re-export useful types
pub use async_trait::async_trait;
pub use claroline_db::UserAccount;
