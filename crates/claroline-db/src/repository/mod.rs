//! Read-only directory queries
//!
//! Membership in a workspace is never stored directly: it is derived from
//! role assignments, held either by the user or by one of the user's groups.
//! The queries here express it as `IN` / `NOT IN` sub-selects so that a single
//! statement answers "registered" and "unregistered" lookups, and every
//! caller-supplied value is bound as a parameter.

mod page;
mod predicates;
mod role;
mod user;

pub use page::Page;
pub use role::{RoleRepository, RoleSubject};
pub use user::{UserAccount, UserRepository, UserWithRoles};
