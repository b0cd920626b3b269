//! Username/password authentication

use std::sync::Arc;

use claroline_db::UserAccount;
use tracing::{info, warn};

use crate::error::{AuthError, AuthResult};
use crate::password::verify_password;
use crate::provider::UserProvider;

/// Checks a username/password pair against the provider's records
#[derive(Clone)]
pub struct PasswordAuthenticator {
    provider: Arc<dyn UserProvider>,
}

impl PasswordAuthenticator {
    pub fn new(provider: Arc<dyn UserProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn UserProvider> {
        &self.provider
    }

    /// Authenticate one attempt; no state is kept between attempts
    ///
    /// # Errors
    /// - `AuthError::UsernameNotFound` if the username is unknown
    /// - `AuthError::BadCredentials` if the password does not match
    pub async fn authenticate(&self, username: &str, password: &str) -> AuthResult<UserAccount> {
        let account = self.provider.load_user_by_username(username).await?;

        if !verify_password(password, &account.user.password)? {
            warn!(username, "Password mismatch");
            return Err(AuthError::BadCredentials);
        }

        info!(username, user_id = account.user.id, "User authenticated");
        Ok(account)
    }
}
