pub mod failure;
pub mod handlers;
pub mod middleware;
pub mod models;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use chrono::Duration;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use utoipa::OpenApi;

use claroline_auth::{EntityUserProvider, PasswordAuthenticator, SessionTokens, UserProvider};
use claroline_db::{RoleRepository, UserRepository};
use sea_orm::DatabaseConnection;

use crate::failure::{
    AjaxAuthenticationFailureHandler, AuthenticationFailureHandler,
    DefaultAuthenticationFailureHandler,
};

/// Application state shared across handlers
pub struct AppState {
    pub users: UserRepository,
    pub roles: RoleRepository,
    pub authenticator: PasswordAuthenticator,
    pub tokens: SessionTokens,
    pub failure_handler: Arc<dyn AuthenticationFailureHandler>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: &ApiServerConfig) -> Self {
        let users = UserRepository::new(db.clone());
        let provider: Arc<dyn UserProvider> = Arc::new(EntityUserProvider::new(users.clone()));

        Self {
            users,
            roles: RoleRepository::new(db),
            authenticator: PasswordAuthenticator::new(provider),
            tokens: SessionTokens::new(config.jwt_secret.as_bytes(), config.session_ttl),
            failure_handler: Arc::new(AjaxAuthenticationFailureHandler::new(
                DefaultAuthenticationFailureHandler::new(config.failure_path.clone()),
            )),
        }
    }

    pub fn provider(&self) -> &Arc<dyn UserProvider> {
        self.authenticator.provider()
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Claroline Directory API",
        version = "0.1.0",
        description = "Users, groups and workspace roles of a Claroline platform"
    ),
    paths(
        handlers::health_check,
        handlers::login,
        handlers::get_current_user,
        handlers::list_users,
        handlers::users_by_username,
        handlers::workspace_users,
        handlers::registered_workspace_users,
        handlers::unregistered_workspace_users,
        handlers::workspace_roles,
        handlers::workspace_role_of_kind,
        handlers::user_workspace_roles,
        handlers::user_workspace_role,
        handlers::group_workspace_role,
        handlers::group_users,
        handlers::unregistered_group_users,
    ),
    components(
        schemas(
            models::ErrorResponse,
            models::HealthResponse,
            models::LoginRequest,
            models::LoginResponse,
            models::CurrentUser,
            models::RoleSummary,
            models::UserSummary,
            models::UserPage,
            models::UserList,
            models::RoleList,
            failure::AuthFailurePayload,
        )
    ),
    tags(
        (name = "auth", description = "Login and session endpoints"),
        (name = "users", description = "User directory endpoints"),
        (name = "workspaces", description = "Workspace membership and role endpoints"),
        (name = "groups", description = "Group membership endpoints"),
        (name = "system", description = "System health and info endpoints")
    )
)]
pub struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable CORS for local development origins
    pub enable_cors: bool,
    /// Secret signing session tokens
    pub jwt_secret: String,
    /// How long a session token stays valid
    pub session_ttl: Duration,
    /// Where browsers are sent after a failed login
    pub failure_path: String,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            enable_cors: false,
            jwt_secret: String::new(),
            session_ttl: Duration::hours(12),
            failure_path: "/login".to_string(),
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, db: DatabaseConnection) -> Self {
        let state = Arc::new(AppState::new(db, &config));
        Self { config, state }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        // Build PUBLIC routes (no authentication required)
        let public_router = Router::new()
            .route("/api/health", get(handlers::health_check))
            .route("/api/openapi.json", get(handlers::openapi_json))
            .route("/api/login", post(handlers::login))
            .route("/login_check", post(handlers::login_check))
            .with_state(self.state.clone());

        // Build PROTECTED routes (require a valid session)
        let protected_router = Router::new()
            .route("/api/me", get(handlers::get_current_user))
            .route("/api/users", get(handlers::list_users))
            .route("/api/users/by-username", get(handlers::users_by_username))
            .route(
                "/api/workspaces/{id}/users",
                get(handlers::workspace_users),
            )
            .route(
                "/api/workspaces/{id}/users/registered",
                get(handlers::registered_workspace_users),
            )
            .route(
                "/api/workspaces/{id}/users/unregistered",
                get(handlers::unregistered_workspace_users),
            )
            .route(
                "/api/workspaces/{id}/users/{user_id}/roles",
                get(handlers::user_workspace_roles),
            )
            .route(
                "/api/workspaces/{id}/users/{user_id}/role",
                get(handlers::user_workspace_role),
            )
            .route(
                "/api/workspaces/{id}/groups/{group_id}/role",
                get(handlers::group_workspace_role),
            )
            .route("/api/workspaces/{id}/roles", get(handlers::workspace_roles))
            .route(
                "/api/workspaces/{id}/roles/{kind}",
                get(handlers::workspace_role_of_kind),
            )
            .route("/api/groups/{id}/users", get(handlers::group_users))
            .route(
                "/api/groups/{id}/users/unregistered",
                get(handlers::unregistered_group_users),
            )
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                self.state.clone(),
                middleware::require_session,
            ));

        let mut router = public_router
            .merge(protected_router)
            .layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            use tower_http::cors::AllowOrigin;

            // Cookies need credentials, which rules out a wildcard origin
            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::COOKIE,
                    header::HeaderName::from_static("x-requested-with"),
                ])
                .allow_credentials(true)
                .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
                    let origin_str = origin.to_str().unwrap_or("");
                    origin_str.starts_with("http://localhost:")
                        || origin_str.starts_with("http://127.0.0.1:")
                }));

            router = router.layer(cors);
        }

        router
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}
