//! Database entities

pub mod group;
pub mod group_role;
pub mod role;
pub mod user;
pub mod user_group;
pub mod user_role;
pub mod workspace;

pub use group::Entity as Group;
pub use group_role::Entity as GroupRole;
pub use role::Entity as Role;
pub use user::Entity as User;
pub use user_group::Entity as UserGroup;
pub use user_role::Entity as UserRole;
pub use workspace::Entity as Workspace;

pub mod prelude {
    pub use super::group::Entity as Group;
    pub use super::group_role::Entity as GroupRole;
    pub use super::role::Entity as Role;
    pub use super::user::Entity as User;
    pub use super::user_group::Entity as UserGroup;
    pub use super::user_role::Entity as UserRole;
    pub use super::workspace::Entity as Workspace;
}
