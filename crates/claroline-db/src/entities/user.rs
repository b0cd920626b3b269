//! User entity: the directory record behind every login

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "claro_user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Login key (unique, compared case-sensitively)
    #[sea_orm(unique)]
    pub username: String,

    pub first_name: String,

    pub last_name: String,

    /// Contact address (optional)
    pub mail: Option<String>,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password: String,

    /// The workspace provisioned for this user alone
    pub personal_workspace_id: Option<i32>,

    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workspace::Entity",
        from = "Column::PersonalWorkspaceId",
        to = "super::workspace::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    PersonalWorkspace,

    /// Direct role assignments
    #[sea_orm(has_many = "super::user_role::Entity")]
    RoleAssignments,

    /// Group memberships
    #[sea_orm(has_many = "super::user_group::Entity")]
    GroupMemberships,
}

impl Related<super::user_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoleAssignments.def()
    }
}

impl Related<super::user_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupMemberships.def()
    }
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_role::Relation::Role.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_role::Relation::User.def().rev())
    }
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_group::Relation::Group.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_group::Relation::User.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
