//! API request and response models

use chrono::{DateTime, Utc};
use claroline_db::entities::{role, user};
use claroline_db::{Page, UserAccount, UserWithRoles};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Default page size when `limit` is omitted
pub const DEFAULT_PAGE_LIMIT: u64 = 20;
/// Largest page a caller may request
pub const MAX_PAGE_LIMIT: u64 = 200;

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Credentials posted to the login endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// User login response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Session token, also set as the `session_token` cookie
    pub token: String,
    /// Token expiration timestamp
    pub expires_at: DateTime<Utc>,
    pub user: CurrentUser,
}

/// A role as exposed over HTTP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RoleSummary {
    pub id: i32,
    /// Unique role name, e.g. `ROLE_WS_MANAGER_7`
    pub name: String,
    pub translation_key: String,
    /// `platform` or `workspace`
    pub role_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<i32>,
}

impl From<role::Model> for RoleSummary {
    fn from(role: role::Model) -> Self {
        Self {
            id: role.id,
            name: role.name,
            translation_key: role.translation_key,
            role_type: match role.role_type {
                role::RoleType::Platform => "platform".to_string(),
                role::RoleType::Workspace => "workspace".to_string(),
            },
            workspace_id: role.workspace_id,
        }
    }
}

/// A user as exposed over HTTP; the password hash never leaves the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Platform roles; only filled by the user directory listing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<RoleSummary>,
}

impl From<user::Model> for UserSummary {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            mail: user.mail,
            created_at: user.created_at,
            roles: Vec::new(),
        }
    }
}

impl From<UserWithRoles> for UserSummary {
    fn from(entry: UserWithRoles) -> Self {
        Self {
            roles: entry.roles.into_iter().map(RoleSummary::from).collect(),
            ..Self::from(entry.user)
        }
    }
}

/// The authenticated user with every role name it holds
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Direct and group-derived role names, sorted
    pub roles: Vec<String>,
    /// Names of the groups the user belongs to
    pub groups: Vec<String>,
}

impl From<&UserAccount> for CurrentUser {
    fn from(account: &UserAccount) -> Self {
        Self {
            id: account.user.id,
            username: account.user.username.clone(),
            first_name: account.user.first_name.clone(),
            last_name: account.user.last_name.clone(),
            roles: account.role_names(),
            groups: account.groups.iter().map(|g| g.name.clone()).collect(),
        }
    }
}

/// One page of users
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserPage {
    pub users: Vec<UserSummary>,
    /// Number of users matching the query across all pages
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

impl<T: Into<UserSummary>> From<Page<T>> for UserPage {
    fn from(page: Page<T>) -> Self {
        Self {
            users: page.items.into_iter().map(Into::into).collect(),
            total: page.total,
            offset: page.offset,
            limit: page.limit,
        }
    }
}

/// List of users
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserList {
    pub users: Vec<UserSummary>,
}

impl From<Vec<user::Model>> for UserList {
    fn from(users: Vec<user::Model>) -> Self {
        Self {
            users: users.into_iter().map(UserSummary::from).collect(),
        }
    }
}

/// List of roles
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleList {
    pub roles: Vec<RoleSummary>,
}

impl From<Vec<role::Model>> for RoleList {
    fn from(roles: Vec<role::Model>) -> Self {
        Self {
            roles: roles.into_iter().map(RoleSummary::from).collect(),
        }
    }
}

/// Search and pagination parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Substring matched against first name, last name and username, ignoring case
    pub search: Option<String>,
    /// Number of users to skip (default 0)
    pub offset: Option<u64>,
    /// Page size (default 20, at most 200)
    pub limit: Option<u64>,
}

impl PageQuery {
    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT)
    }

    /// Search text, if any non-blank text was given
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Filters for the workspace member listing
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WorkspaceUsersQuery {
    /// Only count this role of the workspace
    pub role_id: Option<i32>,
    /// Include users holding the role through one of their groups
    #[serde(default)]
    pub include_groups: bool,
}

/// Usernames to look up
///
/// Names are split on `,` and trimmed, so a username containing a comma or
/// surrounding whitespace cannot be looked up through this parameter.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UsernamesQuery {
    /// Comma separated usernames; commas and surrounding spaces are not part of any name
    pub names: String,
}

impl UsernamesQuery {
    pub fn usernames(&self) -> Vec<&str> {
        self.names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }
}
