use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Form, Json,
};
use chrono::Utc;
use claroline_auth::{AuthError, UserAccount};
use claroline_db::entities::role::WorkspaceRoleKind;
use claroline_db::{RepositoryError, RoleSubject};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::failure::RequestKind;
use crate::middleware::session_cookie;
use crate::models::*;
use crate::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: Some(code.to_string()),
        }),
    )
}

fn repository_error(e: RepositoryError) -> ApiError {
    match e {
        RepositoryError::UnexpectedRowCount { .. } => api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "DATA_INTEGRITY",
            e.to_string(),
        ),
        RepositoryError::Database(ref db_err) => {
            error!("Database error: {}", db_err);
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Database error",
            )
        }
    }
}

/// Hand authentication failures to the failure handler; anything else is a 500
fn login_failure(state: &AppState, kind: RequestKind, e: AuthError) -> Response {
    if e.is_authentication_failure() {
        warn!(?kind, "Login failed: {}", e);
        return state.failure_handler.on_authentication_failure(kind, &e);
    }

    error!("Login aborted: {}", e);
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "Authentication could not be completed",
    )
    .into_response()
}

/// Issue a session token for `account` along with its `Set-Cookie` value
fn open_session(state: &AppState, account: &UserAccount) -> Result<(String, String), ApiError> {
    let token = state.tokens.issue(account).map_err(|e| {
        error!("Failed to issue session token: {}", e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "TOKEN_ERROR",
            "Failed to issue session token",
        )
    })?;
    let cookie = session_cookie(&token, state.tokens.ttl());

    Ok((token, cookie))
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi;

    Json(crate::ApiDoc::openapi())
}

/// Log in with username and password
///
/// Script callers (`X-Requested-With: XMLHttpRequest`) receive failures as
/// `{"has_error": true, "error": ...}`; other callers are redirected to the
/// login form.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened, or failure payload for script callers", body = LoginResponse),
        (status = 303, description = "Authentication failed; redirect to the login form"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Response {
    let kind = RequestKind::classify(&headers);
    debug!(username = %req.username, ?kind, "Login attempt");

    let account = match state
        .authenticator
        .authenticate(&req.username, &req.password)
        .await
    {
        Ok(account) => account,
        Err(e) => return login_failure(&state, kind, e),
    };

    let expires_at = Utc::now() + state.tokens.ttl();
    match open_session(&state, &account) {
        Ok((token, cookie)) => (
            [(header::SET_COOKIE, cookie)],
            Json(LoginResponse {
                token,
                expires_at,
                user: CurrentUser::from(&account),
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Form login used by the browser login page
pub async fn login_check(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(req): Form<LoginRequest>,
) -> Response {
    let kind = RequestKind::classify(&headers);
    debug!(username = %req.username, ?kind, "Form login attempt");

    let account = match state
        .authenticator
        .authenticate(&req.username, &req.password)
        .await
    {
        Ok(account) => account,
        Err(e) => return login_failure(&state, kind, e),
    };

    match open_session(&state, &account) {
        Ok((_, cookie)) => ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response(),
        Err(e) => e.into_response(),
    }
}

/// The authenticated user, as refreshed for this request
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = CurrentUser)
    ),
    tag = "auth"
)]
pub async fn get_current_user(Extension(account): Extension<UserAccount>) -> Json<CurrentUser> {
    Json(CurrentUser::from(&account))
}

/// List users with their platform roles
#[utoipa::path(
    get,
    path = "/api/users",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of users", body = UserPage),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<UserPage>, ApiError> {
    debug!(?query, "Listing users");

    let page = match query.search() {
        Some(search) => {
            state
                .users
                .search_users(search, query.offset(), query.limit())
                .await
        }
        None => state.users.users(query.offset(), query.limit()).await,
    }
    .map_err(repository_error)?;

    Ok(Json(UserPage::from(page)))
}

/// Users matching any of the given usernames, ordered by username
#[utoipa::path(
    get,
    path = "/api/users/by-username",
    params(UsernamesQuery),
    responses(
        (status = 200, description = "Matching users; unknown names are skipped", body = UserList),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn users_by_username(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UsernamesQuery>,
) -> Result<Json<UserList>, ApiError> {
    let usernames = query.usernames();
    debug!(count = usernames.len(), "Finding users by username");

    let users = state
        .users
        .find_by_usernames(&usernames)
        .await
        .map_err(repository_error)?;

    Ok(Json(UserList::from(users)))
}

/// Users holding a role of the workspace
#[utoipa::path(
    get,
    path = "/api/workspaces/{id}/users",
    params(
        ("id" = i32, Path, description = "Workspace ID"),
        WorkspaceUsersQuery
    ),
    responses(
        (status = 200, description = "Workspace members", body = UserList),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "workspaces"
)]
pub async fn workspace_users(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<i32>,
    Query(query): Query<WorkspaceUsersQuery>,
) -> Result<Json<UserList>, ApiError> {
    debug!(workspace_id, ?query, "Listing workspace users");

    let users = state
        .users
        .users_of_workspace(workspace_id, query.role_id, query.include_groups)
        .await
        .map_err(repository_error)?;

    Ok(Json(UserList::from(users)))
}

/// Users registered in the workspace, directly or through a group
#[utoipa::path(
    get,
    path = "/api/workspaces/{id}/users/registered",
    params(
        ("id" = i32, Path, description = "Workspace ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Page of registered users", body = UserPage),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "workspaces"
)]
pub async fn registered_workspace_users(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<UserPage>, ApiError> {
    debug!(workspace_id, ?query, "Listing registered users");

    let page = match query.search() {
        Some(search) => {
            state
                .users
                .search_registered_users_of_workspace(
                    search,
                    workspace_id,
                    query.offset(),
                    query.limit(),
                )
                .await
        }
        None => {
            state
                .users
                .registered_users_of_workspace(workspace_id, query.offset(), query.limit())
                .await
        }
    }
    .map_err(repository_error)?;

    Ok(Json(UserPage::from(page)))
}

/// Users not registered in the workspace, the candidates for registration
#[utoipa::path(
    get,
    path = "/api/workspaces/{id}/users/unregistered",
    params(
        ("id" = i32, Path, description = "Workspace ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Page of unregistered users", body = UserPage),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "workspaces"
)]
pub async fn unregistered_workspace_users(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<UserPage>, ApiError> {
    debug!(workspace_id, ?query, "Listing unregistered users");

    let page = match query.search() {
        Some(search) => {
            state
                .users
                .search_unregistered_users_of_workspace(
                    search,
                    workspace_id,
                    query.offset(),
                    query.limit(),
                )
                .await
        }
        None => {
            state
                .users
                .unregistered_users_of_workspace(workspace_id, query.offset(), query.limit())
                .await
        }
    }
    .map_err(repository_error)?;

    Ok(Json(UserPage::from(page)))
}

/// Roles of the workspace
#[utoipa::path(
    get,
    path = "/api/workspaces/{id}/roles",
    params(
        ("id" = i32, Path, description = "Workspace ID")
    ),
    responses(
        (status = 200, description = "Workspace roles, platform administrator excluded", body = RoleList),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "workspaces"
)]
pub async fn workspace_roles(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<i32>,
) -> Result<Json<RoleList>, ApiError> {
    debug!(workspace_id, "Listing workspace roles");

    let roles = state
        .roles
        .find_by_workspace(workspace_id)
        .await
        .map_err(repository_error)?;

    Ok(Json(RoleList::from(roles)))
}

/// The manager, collaborator or visitor role of the workspace
#[utoipa::path(
    get,
    path = "/api/workspaces/{id}/roles/{kind}",
    params(
        ("id" = i32, Path, description = "Workspace ID"),
        ("kind" = String, Path, description = "manager, collaborator or visitor")
    ),
    responses(
        (status = 200, description = "The workspace role", body = RoleSummary),
        (status = 400, description = "Unknown role kind", body = ErrorResponse),
        (status = 500, description = "Missing or duplicated role", body = ErrorResponse)
    ),
    tag = "workspaces"
)]
pub async fn workspace_role_of_kind(
    State(state): State<Arc<AppState>>,
    Path((workspace_id, kind)): Path<(i32, String)>,
) -> Result<Json<RoleSummary>, ApiError> {
    debug!(workspace_id, kind = %kind, "Getting workspace role by kind");

    let kind: WorkspaceRoleKind = kind
        .parse()
        .map_err(|e: String| api_error(StatusCode::BAD_REQUEST, "INVALID_ROLE_KIND", e))?;

    let role = match kind {
        WorkspaceRoleKind::Manager => state.roles.find_manager_role(workspace_id).await,
        WorkspaceRoleKind::Collaborator => state.roles.find_collaborator_role(workspace_id).await,
        WorkspaceRoleKind::Visitor => state.roles.find_visitor_role(workspace_id).await,
    }
    .map_err(repository_error)?;

    Ok(Json(RoleSummary::from(role)))
}

/// Workspace roles a user holds, directly or through a group
#[utoipa::path(
    get,
    path = "/api/workspaces/{id}/users/{user_id}/roles",
    params(
        ("id" = i32, Path, description = "Workspace ID"),
        ("user_id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Roles of the user in the workspace", body = RoleList),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "workspaces"
)]
pub async fn user_workspace_roles(
    State(state): State<Arc<AppState>>,
    Path((workspace_id, user_id)): Path<(i32, i32)>,
) -> Result<Json<RoleList>, ApiError> {
    debug!(workspace_id, user_id, "Listing workspace roles of user");

    let roles = state
        .roles
        .roles_of_workspace_for_user(user_id, workspace_id)
        .await
        .map_err(repository_error)?;

    Ok(Json(RoleList::from(roles)))
}

/// The role binding a user to the workspace
#[utoipa::path(
    get,
    path = "/api/workspaces/{id}/users/{user_id}/role",
    params(
        ("id" = i32, Path, description = "Workspace ID"),
        ("user_id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "First workspace role the user holds", body = RoleSummary),
        (status = 404, description = "User has no role in the workspace", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "workspaces"
)]
pub async fn user_workspace_role(
    State(state): State<Arc<AppState>>,
    Path((workspace_id, user_id)): Path<(i32, i32)>,
) -> Result<Json<RoleSummary>, ApiError> {
    subject_workspace_role(&state, RoleSubject::User(user_id), workspace_id).await
}

/// The role binding a group to the workspace
#[utoipa::path(
    get,
    path = "/api/workspaces/{id}/groups/{group_id}/role",
    params(
        ("id" = i32, Path, description = "Workspace ID"),
        ("group_id" = i32, Path, description = "Group ID")
    ),
    responses(
        (status = 200, description = "First workspace role the group holds", body = RoleSummary),
        (status = 404, description = "Group has no role in the workspace", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "workspaces"
)]
pub async fn group_workspace_role(
    State(state): State<Arc<AppState>>,
    Path((workspace_id, group_id)): Path<(i32, i32)>,
) -> Result<Json<RoleSummary>, ApiError> {
    subject_workspace_role(&state, RoleSubject::Group(group_id), workspace_id).await
}

async fn subject_workspace_role(
    state: &AppState,
    subject: RoleSubject,
    workspace_id: i32,
) -> Result<Json<RoleSummary>, ApiError> {
    debug!(?subject, workspace_id, "Getting workspace role of subject");

    state
        .roles
        .find_workspace_role(subject, workspace_id)
        .await
        .map_err(repository_error)?
        .map(|role| Json(RoleSummary::from(role)))
        .ok_or_else(|| {
            api_error(
                StatusCode::NOT_FOUND,
                "ROLE_NOT_FOUND",
                format!("No role in workspace {}", workspace_id),
            )
        })
}

/// Members of the group
#[utoipa::path(
    get,
    path = "/api/groups/{id}/users",
    params(
        ("id" = i32, Path, description = "Group ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Page of group members", body = UserPage),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "groups"
)]
pub async fn group_users(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<UserPage>, ApiError> {
    debug!(group_id, ?query, "Listing group members");

    let page = match query.search() {
        Some(search) => {
            state
                .users
                .search_users_of_group(search, group_id, query.offset(), query.limit())
                .await
        }
        None => {
            state
                .users
                .users_of_group(group_id, query.offset(), query.limit())
                .await
        }
    }
    .map_err(repository_error)?;

    Ok(Json(UserPage::from(page)))
}

/// Users that are not members of the group
#[utoipa::path(
    get,
    path = "/api/groups/{id}/users/unregistered",
    params(
        ("id" = i32, Path, description = "Group ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Page of users outside the group", body = UserPage),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "groups"
)]
pub async fn unregistered_group_users(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<UserPage>, ApiError> {
    debug!(group_id, ?query, "Listing users outside group");

    let page = match query.search() {
        Some(search) => {
            state
                .users
                .search_unregistered_users_of_group(
                    search,
                    group_id,
                    query.offset(),
                    query.limit(),
                )
                .await
        }
        None => {
            state
                .users
                .unregistered_users_of_group(group_id, query.offset(), query.limit())
                .await
        }
    }
    .map_err(repository_error)?;

    Ok(Json(UserPage::from(page)))
}
