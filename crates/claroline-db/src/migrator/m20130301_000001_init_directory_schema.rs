//! Initial directory schema: workspaces, users, groups, roles and their assignments

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. Workspaces
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Workspace::Table)
                    .if_not_exists()
                    .col(pk_auto(Workspace::Id))
                    .col(string_len(Workspace::Name, 255).not_null())
                    .col(string_len(Workspace::Code, 255).not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 2. Users (each may point at its personal workspace)
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(pk_auto(User::Id))
                    .col(string_len(User::Username, 255).not_null().unique_key())
                    .col(string_len(User::FirstName, 50).not_null())
                    .col(string_len(User::LastName, 50).not_null())
                    .col(string_len_null(User::Mail, 255))
                    .col(string_len(User::Password, 255).not_null())
                    .col(ColumnDef::new(User::PersonalWorkspaceId).integer().null())
                    .col(
                        timestamp_with_time_zone(User::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_claro_user_personal_workspace_id")
                            .from(User::Table, User::PersonalWorkspaceId)
                            .to(Workspace::Table, Workspace::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 3. Groups
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Group::Table)
                    .if_not_exists()
                    .col(pk_auto(Group::Id))
                    .col(string_len(Group::Name, 255).not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 4. Roles
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Role::Table)
                    .if_not_exists()
                    .col(pk_auto(Role::Id))
                    .col(string_len(Role::Name, 255).not_null().unique_key())
                    .col(string_len(Role::TranslationKey, 255).not_null())
                    .col(
                        string_len(Role::RoleType, 16)
                            .not_null()
                            .default("platform"),
                    )
                    .col(ColumnDef::new(Role::WorkspaceId).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_claro_role_workspace_id")
                            .from(Role::Table, Role::WorkspaceId)
                            .to(Workspace::Table, Workspace::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_claro_role_workspace_id")
                    .table(Role::Table)
                    .col(Role::WorkspaceId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 5. Junction tables
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(UserGroup::Table)
                    .if_not_exists()
                    .col(integer(UserGroup::UserId).not_null())
                    .col(integer(UserGroup::GroupId).not_null())
                    .primary_key(
                        Index::create()
                            .col(UserGroup::UserId)
                            .col(UserGroup::GroupId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_claro_user_group_user_id")
                            .from(UserGroup::Table, UserGroup::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_claro_user_group_group_id")
                            .from(UserGroup::Table, UserGroup::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_claro_user_group_group_id")
                    .table(UserGroup::Table)
                    .col(UserGroup::GroupId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserRole::Table)
                    .if_not_exists()
                    .col(integer(UserRole::UserId).not_null())
                    .col(integer(UserRole::RoleId).not_null())
                    .primary_key(Index::create().col(UserRole::UserId).col(UserRole::RoleId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_claro_user_role_user_id")
                            .from(UserRole::Table, UserRole::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_claro_user_role_role_id")
                            .from(UserRole::Table, UserRole::RoleId)
                            .to(Role::Table, Role::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_claro_user_role_role_id")
                    .table(UserRole::Table)
                    .col(UserRole::RoleId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupRole::Table)
                    .if_not_exists()
                    .col(integer(GroupRole::GroupId).not_null())
                    .col(integer(GroupRole::RoleId).not_null())
                    .primary_key(
                        Index::create()
                            .col(GroupRole::GroupId)
                            .col(GroupRole::RoleId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_claro_group_role_group_id")
                            .from(GroupRole::Table, GroupRole::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_claro_group_role_role_id")
                            .from(GroupRole::Table, GroupRole::RoleId)
                            .to(Role::Table, Role::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_claro_group_role_role_id")
                    .table(GroupRole::Table)
                    .col(GroupRole::RoleId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Junction tables first, then the tables they reference
        manager
            .drop_table(Table::drop().table(GroupRole::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserRole::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserGroup::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Role::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Group::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Workspace::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Workspace {
    #[sea_orm(iden = "claro_workspace")]
    Table,
    Id,
    Name,
    Code,
}

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "claro_user")]
    Table,
    Id,
    Username,
    FirstName,
    LastName,
    Mail,
    Password,
    PersonalWorkspaceId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Group {
    #[sea_orm(iden = "claro_group")]
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Role {
    #[sea_orm(iden = "claro_role")]
    Table,
    Id,
    Name,
    TranslationKey,
    RoleType,
    WorkspaceId,
}

#[derive(DeriveIden)]
enum UserGroup {
    #[sea_orm(iden = "claro_user_group")]
    Table,
    UserId,
    GroupId,
}

#[derive(DeriveIden)]
enum UserRole {
    #[sea_orm(iden = "claro_user_role")]
    Table,
    UserId,
    RoleId,
}

#[derive(DeriveIden)]
enum GroupRole {
    #[sea_orm(iden = "claro_group_role")]
    Table,
    GroupId,
    RoleId,
}
