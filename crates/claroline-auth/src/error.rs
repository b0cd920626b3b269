//! Authentication errors

use claroline_db::RepositoryError;
use thiserror::Error;

use crate::jwt::JwtError;
use crate::password::PasswordError;

#[derive(Error, Debug)]
pub enum AuthError {
    /// No user carries this username
    #[error("Unable to find a user identified by \"{username}\"")]
    UsernameNotFound { username: String },

    /// The user exists but the password does not match
    #[error("Bad credentials")]
    BadCredentials,

    /// The provider was handed a user record it cannot reload
    #[error("Instances of \"{class}\" are not supported")]
    UnsupportedUser { class: String },

    /// The session token is missing, malformed or expired
    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl AuthError {
    /// Whether the caller failed to authenticate, as opposed to a
    /// configuration or storage fault
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AuthError::UsernameNotFound { .. }
                | AuthError::BadCredentials
                | AuthError::InvalidSession(_)
        )
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        AuthError::InvalidSession(err.to_string())
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
