use std::collections::{BTreeMap, BTreeSet};

use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde::Serialize;
use tracing::debug;

use super::page::Page;
use super::predicates;
use crate::entities::{group, group_role, role, user, user_role};
use crate::error::RepositoryError;

const MAX_BOUND: u64 = i64::MAX as u64;

/// A user together with the platform roles it holds directly
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserWithRoles {
    #[serde(flatten)]
    pub user: user::Model,
    pub roles: Vec<role::Model>,
}

/// A user with every role assignment the security layer needs, loaded eagerly
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    pub user: user::Model,
    /// Roles assigned to the user directly
    pub roles: Vec<role::Model>,
    pub groups: Vec<group::Model>,
    /// Roles inherited through group membership
    pub group_roles: Vec<role::Model>,
}

impl UserAccount {
    /// Names of direct and inherited roles, de-duplicated and sorted
    pub fn role_names(&self) -> Vec<String> {
        self.roles
            .iter()
            .chain(self.group_roles.iter())
            .map(|role| role.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Directory and membership lookups over `claro_user`
#[derive(Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Users whose username is in `usernames`, ordered by username
    ///
    /// Names without a matching user are skipped.
    pub async fn find_by_usernames<S: AsRef<str>>(
        &self,
        usernames: &[S],
    ) -> Result<Vec<user::Model>, RepositoryError> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Finding {} users by username", usernames.len());

        let users = user::Entity::find()
            .filter(user::Column::Username.is_in(usernames.iter().map(AsRef::as_ref)))
            .order_by_asc(user::Column::Username)
            .all(&self.db)
            .await?;

        Ok(users)
    }

    /// Distinct users holding a role of the workspace
    ///
    /// With `role_id`, only that role counts. With `include_groups`, users
    /// who get the role through one of their groups are included too.
    pub async fn users_of_workspace(
        &self,
        workspace_id: i32,
        role_id: Option<i32>,
        include_groups: bool,
    ) -> Result<Vec<user::Model>, RepositoryError> {
        debug!(
            workspace_id,
            ?role_id,
            include_groups,
            "Listing users of workspace"
        );

        let mut membership = Condition::any().add(user::Column::Id.in_subquery(
            predicates::direct_workspace_members(workspace_id, role_id),
        ));
        if include_groups {
            membership = membership.add(user::Column::Id.in_subquery(
                predicates::group_workspace_members(workspace_id, role_id),
            ));
        }

        let users = user::Entity::find()
            .filter(membership)
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await?;

        Ok(users)
    }

    /// Users with no role in the workspace, neither directly nor through a group
    pub async fn unregistered_users_of_workspace(
        &self,
        workspace_id: i32,
        offset: u64,
        limit: u64,
    ) -> Result<Page<user::Model>, RepositoryError> {
        debug!(workspace_id, offset, limit, "Listing unregistered users");

        self.page(
            predicates::unregistered_in_workspace(workspace_id),
            offset,
            limit,
        )
        .await
    }

    /// Unregistered users whose first name, last name or username contains `search`
    pub async fn search_unregistered_users_of_workspace(
        &self,
        search: &str,
        workspace_id: i32,
        offset: u64,
        limit: u64,
    ) -> Result<Page<user::Model>, RepositoryError> {
        debug!(workspace_id, search, offset, limit, "Searching unregistered users");

        self.page(
            Condition::all()
                .add(predicates::name_matches(search))
                .add(predicates::unregistered_in_workspace(workspace_id)),
            offset,
            limit,
        )
        .await
    }

    pub async fn registered_users_of_workspace(
        &self,
        workspace_id: i32,
        offset: u64,
        limit: u64,
    ) -> Result<Page<user::Model>, RepositoryError> {
        debug!(workspace_id, offset, limit, "Listing registered users");

        self.page(
            predicates::registered_in_workspace(workspace_id),
            offset,
            limit,
        )
        .await
    }

    pub async fn search_registered_users_of_workspace(
        &self,
        search: &str,
        workspace_id: i32,
        offset: u64,
        limit: u64,
    ) -> Result<Page<user::Model>, RepositoryError> {
        debug!(workspace_id, search, offset, limit, "Searching registered users");

        self.page(
            Condition::all()
                .add(predicates::name_matches(search))
                .add(predicates::registered_in_workspace(workspace_id)),
            offset,
            limit,
        )
        .await
    }

    pub async fn users_of_group(
        &self,
        group_id: i32,
        offset: u64,
        limit: u64,
    ) -> Result<Page<user::Model>, RepositoryError> {
        debug!(group_id, offset, limit, "Listing group members");

        self.page(
            Condition::all().add(user::Column::Id.in_subquery(predicates::group_members(group_id))),
            offset,
            limit,
        )
        .await
    }

    pub async fn search_users_of_group(
        &self,
        search: &str,
        group_id: i32,
        offset: u64,
        limit: u64,
    ) -> Result<Page<user::Model>, RepositoryError> {
        debug!(group_id, search, offset, limit, "Searching group members");

        self.page(
            Condition::all()
                .add(predicates::name_matches(search))
                .add(user::Column::Id.in_subquery(predicates::group_members(group_id))),
            offset,
            limit,
        )
        .await
    }

    /// Users that are not direct members of the group
    pub async fn unregistered_users_of_group(
        &self,
        group_id: i32,
        offset: u64,
        limit: u64,
    ) -> Result<Page<user::Model>, RepositoryError> {
        debug!(group_id, offset, limit, "Listing users outside group");

        self.page(
            Condition::all()
                .add(user::Column::Id.not_in_subquery(predicates::group_members(group_id))),
            offset,
            limit,
        )
        .await
    }

    pub async fn search_unregistered_users_of_group(
        &self,
        search: &str,
        group_id: i32,
        offset: u64,
        limit: u64,
    ) -> Result<Page<user::Model>, RepositoryError> {
        debug!(group_id, search, offset, limit, "Searching users outside group");

        self.page(
            Condition::all()
                .add(predicates::name_matches(search))
                .add(user::Column::Id.not_in_subquery(predicates::group_members(group_id))),
            offset,
            limit,
        )
        .await
    }

    /// Every user, each with its platform roles
    pub async fn users(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Page<UserWithRoles>, RepositoryError> {
        debug!(offset, limit, "Listing users");

        let page = self.page(Condition::all(), offset, limit).await?;
        self.with_platform_roles(page).await
    }

    pub async fn search_users(
        &self,
        search: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Page<UserWithRoles>, RepositoryError> {
        debug!(search, offset, limit, "Searching users");

        let page = self
            .page(predicates::name_matches(search), offset, limit)
            .await?;
        self.with_platform_roles(page).await
    }

    /// Load a user by exact username with roles, groups and group roles
    pub async fn load_account(&self, username: &str) -> Result<Option<UserAccount>, RepositoryError> {
        debug!(username, "Loading account");

        let Some(user) = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let roles = user
            .find_related(role::Entity)
            .order_by_asc(role::Column::Id)
            .all(&self.db)
            .await?;

        let groups = user
            .find_related(group::Entity)
            .order_by_asc(group::Column::Id)
            .all(&self.db)
            .await?;

        let group_roles = if groups.is_empty() {
            Vec::new()
        } else {
            let group_ids: Vec<i32> = groups.iter().map(|g| g.id).collect();
            role::Entity::find()
                .filter(
                    role::Column::Id.in_subquery(
                        sea_orm::sea_query::Query::select()
                            .column(group_role::Column::RoleId)
                            .from(group_role::Entity)
                            .and_where(group_role::Column::GroupId.is_in(group_ids))
                            .to_owned(),
                    ),
                )
                .order_by_asc(role::Column::Id)
                .all(&self.db)
                .await?
        };

        Ok(Some(UserAccount {
            user,
            roles,
            groups,
            group_roles,
        }))
    }

    async fn page(
        &self,
        condition: Condition,
        offset: u64,
        limit: u64,
    ) -> Result<Page<user::Model>, RepositoryError> {
        // bound parameters are signed 64-bit on every backend
        let offset = offset.min(MAX_BOUND);
        let limit = limit.min(MAX_BOUND);

        let query = user::Entity::find()
            .filter(condition)
            .order_by_asc(user::Column::Id);

        let total = query.clone().count(&self.db).await?;
        let items = query.offset(offset).limit(limit).all(&self.db).await?;

        Ok(Page {
            items,
            total,
            offset,
            limit,
        })
    }

    async fn with_platform_roles(
        &self,
        page: Page<user::Model>,
    ) -> Result<Page<UserWithRoles>, RepositoryError> {
        let user_ids: Vec<i32> = page.items.iter().map(|u| u.id).collect();

        let mut roles_by_user: BTreeMap<i32, Vec<role::Model>> = BTreeMap::new();
        if !user_ids.is_empty() {
            let assignments = user_role::Entity::find()
                .find_also_related(role::Entity)
                .filter(user_role::Column::UserId.is_in(user_ids))
                .filter(role::Column::RoleType.eq(role::RoleType::Platform))
                .order_by_asc(role::Column::Id)
                .all(&self.db)
                .await?;

            for (assignment, role) in assignments {
                if let Some(role) = role {
                    roles_by_user
                        .entry(assignment.user_id)
                        .or_default()
                        .push(role);
                }
            }
        }

        Ok(page.map(|user| UserWithRoles {
            roles: roles_by_user.remove(&user.id).unwrap_or_default(),
            user,
        }))
    }
}
