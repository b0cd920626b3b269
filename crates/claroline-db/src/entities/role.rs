//! Role entity for platform-wide and workspace-scoped permissions

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the platform administrator role
pub const ADMIN_ROLE: &str = "ROLE_ADMIN";

/// Prefix shared by every generated workspace role name
pub const WORKSPACE_ROLE_PREFIX: &str = "ROLE_WS_";

/// Scope of a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    /// Applies to the whole platform
    #[sea_orm(string_value = "platform")]
    Platform,

    /// Bound to exactly one workspace
    #[sea_orm(string_value = "workspace")]
    Workspace,
}

/// The roles every workspace is created with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceRoleKind {
    Manager,
    Collaborator,
    Visitor,
}

impl WorkspaceRoleKind {
    pub const ALL: [WorkspaceRoleKind; 3] = [
        WorkspaceRoleKind::Manager,
        WorkspaceRoleKind::Collaborator,
        WorkspaceRoleKind::Visitor,
    ];

    fn as_upper(self) -> &'static str {
        match self {
            WorkspaceRoleKind::Manager => "MANAGER",
            WorkspaceRoleKind::Collaborator => "COLLABORATOR",
            WorkspaceRoleKind::Visitor => "VISITOR",
        }
    }

    /// Role name for this kind in the given workspace, e.g. `ROLE_WS_MANAGER_12`
    pub fn role_name(self, workspace_id: i32) -> String {
        format!("{}{}_{}", WORKSPACE_ROLE_PREFIX, self.as_upper(), workspace_id)
    }
}

impl fmt::Display for WorkspaceRoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_upper().to_lowercase())
    }
}

impl FromStr for WorkspaceRoleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manager" => Ok(WorkspaceRoleKind::Manager),
            "collaborator" => Ok(WorkspaceRoleKind::Collaborator),
            "visitor" => Ok(WorkspaceRoleKind::Visitor),
            other => Err(format!("Unknown workspace role kind '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "claro_role")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Role name (unique), e.g. `ROLE_ADMIN` or `ROLE_WS_VISITOR_3`
    #[sea_orm(unique)]
    pub name: String,

    /// Key used by the UI to display the role
    pub translation_key: String,

    pub role_type: RoleType,

    /// Owning workspace, set for workspace roles only
    pub workspace_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workspace::Entity",
        from = "Column::WorkspaceId",
        to = "super::workspace::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Workspace,

    #[sea_orm(has_many = "super::user_role::Entity")]
    UserAssignments,

    #[sea_orm(has_many = "super::group_role::Entity")]
    GroupAssignments,
}

impl Related<super::workspace::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workspace.def()
    }
}

impl Related<super::user_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserAssignments.def()
    }
}

impl Related<super::group_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupAssignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
