//! Signed session tokens
//!
//! A session token carries the identity of an authenticated user between
//! requests. It is only a pointer: every request refreshes the user from the
//! store through the [`UserProvider`](crate::UserProvider).

use chrono::{DateTime, Duration, Utc};
use claroline_db::UserAccount;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::{SecurityUser, USER_CLASS};

/// Issuer stamped into every session token
pub const SESSION_ISSUER: &str = "claroline-directory";

/// Claims of a session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    /// Subject (username)
    pub sub: String,
    /// User id at issue time
    pub uid: i32,
    /// Class of the user record the session was opened for
    pub cls: String,
    /// Role names at issue time
    #[serde(default)]
    pub roles: Vec<String>,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

impl SessionClaims {
    pub fn new(account: &UserAccount, validity: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: account.user.username.clone(),
            uid: account.user.id,
            cls: USER_CLASS.to_string(),
            roles: account.role_names(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(validity)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
                .timestamp(),
            iss: SESSION_ISSUER.to_string(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

impl SecurityUser for SessionClaims {
    fn username(&self) -> &str {
        &self.sub
    }

    fn roles(&self) -> Vec<String> {
        self.roles.clone()
    }

    fn user_class(&self) -> &str {
        &self.cls
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT encoding error: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,
}

/// Issues and validates HS256 session tokens
pub struct SessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionTokens {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_issuer(&[SESSION_ISSUER]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Open a session for `account`
    pub fn issue(&self, account: &UserAccount) -> Result<String, JwtError> {
        self.encode(&SessionClaims::new(account, self.ttl))
    }

    pub fn encode(&self, claims: &SessionClaims) -> Result<String, JwtError> {
        Ok(encode(&Header::default(), claims, &self.encoding_key)?)
    }

    /// Check signature, issuer and expiry, returning the claims
    pub fn validate(&self, token: &str) -> Result<SessionClaims, JwtError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::InvalidToken,
            })
    }
}
