//! Loading users for the security layer

use async_trait::async_trait;
use claroline_db::{UserAccount, UserRepository};
use tracing::debug;

use crate::error::{AuthError, AuthResult};

/// Class name of the user records [`EntityUserProvider`] produces
pub const USER_CLASS: &str = "claroline.user";

/// What the security layer needs to know about an authenticated user
pub trait SecurityUser: Send + Sync {
    fn username(&self) -> &str;

    /// Names of every role the user holds
    fn roles(&self) -> Vec<String>;

    /// Identifies the kind of record, so a provider can tell whether it can reload it
    fn user_class(&self) -> &str;
}

impl SecurityUser for UserAccount {
    fn username(&self) -> &str {
        &self.user.username
    }

    fn roles(&self) -> Vec<String> {
        self.role_names()
    }

    fn user_class(&self) -> &str {
        USER_CLASS
    }
}

/// Source of user records for authentication
///
/// Each call is independent; implementations hold no per-user state.
#[async_trait]
pub trait UserProvider: Send + Sync {
    /// Load a user by exact username
    ///
    /// # Errors
    /// `AuthError::UsernameNotFound` when no user carries the name.
    async fn load_user_by_username(&self, username: &str) -> AuthResult<UserAccount>;

    /// Reload a previously authenticated user with fresh roles and groups
    ///
    /// # Errors
    /// `AuthError::UnsupportedUser` if `user` is of a class this provider does
    /// not handle. That check runs before the store is touched.
    async fn refresh_user(&self, user: &dyn SecurityUser) -> AuthResult<UserAccount>;

    fn supports_class(&self, class: &str) -> bool;
}

/// [`UserProvider`] backed by the `claro_user` table
#[derive(Clone)]
pub struct EntityUserProvider {
    users: UserRepository,
}

impl EntityUserProvider {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserProvider for EntityUserProvider {
    async fn load_user_by_username(&self, username: &str) -> AuthResult<UserAccount> {
        self.users
            .load_account(username)
            .await?
            .ok_or_else(|| AuthError::UsernameNotFound {
                username: username.to_string(),
            })
    }

    async fn refresh_user(&self, user: &dyn SecurityUser) -> AuthResult<UserAccount> {
        if !self.supports_class(user.user_class()) {
            return Err(AuthError::UnsupportedUser {
                class: user.user_class().to_string(),
            });
        }

        debug!(username = user.username(), "Refreshing user");
        self.load_user_by_username(user.username()).await
    }

    fn supports_class(&self, class: &str) -> bool {
        class == USER_CLASS
    }
}
