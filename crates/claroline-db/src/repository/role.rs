use std::collections::HashSet;

use sea_orm::sea_query::{Expr, Query, SelectStatement};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entities::role::{self, WorkspaceRoleKind, ADMIN_ROLE};
use crate::entities::{group_role, user_group, user_role};
use crate::error::{exactly_one, RepositoryError};

/// Anything that can hold role assignments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum RoleSubject {
    /// A user; its roles include those of its groups
    User(i32),
    Group(i32),
}

/// Role lookups scoped to workspaces
#[derive(Clone)]
pub struct RoleRepository {
    db: DatabaseConnection,
}

impl RoleRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Roles of the workspace, never including `ROLE_ADMIN`
    pub async fn find_by_workspace(
        &self,
        workspace_id: i32,
    ) -> Result<Vec<role::Model>, RepositoryError> {
        debug!(workspace_id, "Listing workspace roles");

        let roles = role::Entity::find()
            .filter(role::Column::WorkspaceId.eq(workspace_id))
            .filter(role::Column::Name.ne(ADMIN_ROLE))
            .order_by_asc(role::Column::Id)
            .all(&self.db)
            .await?;

        Ok(roles)
    }

    /// Workspace roles that make the user a member, directly or through a group
    pub async fn roles_of_workspace_for_user(
        &self,
        user_id: i32,
        workspace_id: i32,
    ) -> Result<Vec<role::Model>, RepositoryError> {
        debug!(user_id, workspace_id, "Listing workspace roles of user");

        let roles = role::Entity::find()
            .filter(role::Column::WorkspaceId.eq(workspace_id))
            .filter(held_by(RoleSubject::User(user_id)))
            .order_by_asc(role::Column::Id)
            .all(&self.db)
            .await?;

        Ok(roles)
    }

    /// The role binding `subject` to the workspace, if any
    ///
    /// Workspace roles are tried in id order; the first one the subject holds wins.
    pub async fn find_workspace_role(
        &self,
        subject: RoleSubject,
        workspace_id: i32,
    ) -> Result<Option<role::Model>, RepositoryError> {
        debug!(?subject, workspace_id, "Finding workspace role");

        let subject_roles: HashSet<String> = role::Entity::find()
            .select_only()
            .column(role::Column::Name)
            .filter(held_by(subject))
            .into_tuple::<String>()
            .all(&self.db)
            .await?
            .into_iter()
            .collect();

        let workspace_roles = self.find_by_workspace(workspace_id).await?;

        Ok(workspace_roles
            .into_iter()
            .find(|role| subject_roles.contains(&role.name)))
    }

    /// The single role of `kind` generated for the workspace
    ///
    /// # Errors
    /// `RepositoryError::UnexpectedRowCount` if no role or several roles carry the name.
    pub async fn find_role_of_kind(
        &self,
        kind: WorkspaceRoleKind,
        workspace_id: i32,
    ) -> Result<role::Model, RepositoryError> {
        let name = kind.role_name(workspace_id);
        debug!(%kind, workspace_id, name = %name, "Finding workspace role by kind");

        let roles = role::Entity::find()
            .filter(role::Column::Name.eq(name.as_str()))
            .all(&self.db)
            .await?;

        exactly_one(roles, &format!("{} role for workspace {}", kind, workspace_id))
    }

    pub async fn find_manager_role(&self, workspace_id: i32) -> Result<role::Model, RepositoryError> {
        self.find_role_of_kind(WorkspaceRoleKind::Manager, workspace_id)
            .await
    }

    pub async fn find_collaborator_role(
        &self,
        workspace_id: i32,
    ) -> Result<role::Model, RepositoryError> {
        self.find_role_of_kind(WorkspaceRoleKind::Collaborator, workspace_id)
            .await
    }

    pub async fn find_visitor_role(&self, workspace_id: i32) -> Result<role::Model, RepositoryError> {
        self.find_role_of_kind(WorkspaceRoleKind::Visitor, workspace_id)
            .await
    }
}

/// `role.id` is assigned to the subject
fn held_by(subject: RoleSubject) -> Condition {
    match subject {
        RoleSubject::User(user_id) => Condition::any()
            .add(role::Column::Id.in_subquery(
                Query::select()
                    .column(user_role::Column::RoleId)
                    .from(user_role::Entity)
                    .and_where(user_role::Column::UserId.eq(user_id))
                    .to_owned(),
            ))
            .add(role::Column::Id.in_subquery(roles_inherited_by_user(user_id))),
        RoleSubject::Group(group_id) => Condition::all().add(
            role::Column::Id.in_subquery(
                Query::select()
                    .column(group_role::Column::RoleId)
                    .from(group_role::Entity)
                    .and_where(group_role::Column::GroupId.eq(group_id))
                    .to_owned(),
            ),
        ),
    }
}

fn roles_inherited_by_user(user_id: i32) -> SelectStatement {
    Query::select()
        .column((group_role::Entity, group_role::Column::RoleId))
        .from(group_role::Entity)
        .inner_join(
            user_group::Entity,
            Expr::col((user_group::Entity, user_group::Column::GroupId))
                .equals((group_role::Entity, group_role::Column::GroupId)),
        )
        .and_where(Expr::col((user_group::Entity, user_group::Column::UserId)).eq(user_id))
        .to_owned()
}
