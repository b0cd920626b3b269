//! Reusable sub-selects and conditions over `claro_user`

use sea_orm::sea_query::{BinOper, Expr, Func, Query, SelectStatement, SimpleExpr};
use sea_orm::{ColumnTrait, Condition};

use crate::entities::{group_role, role, user, user_group, user_role};

const LIKE_ESCAPE: char = '\\';

/// `SELECT ur.user_id FROM claro_user_role ur JOIN claro_role r ... WHERE r.workspace_id = ?`
pub(crate) fn direct_workspace_members(workspace_id: i32, role_id: Option<i32>) -> SelectStatement {
    let mut select = Query::select();
    select
        .column((user_role::Entity, user_role::Column::UserId))
        .from(user_role::Entity)
        .inner_join(
            role::Entity,
            Expr::col((role::Entity, role::Column::Id))
                .equals((user_role::Entity, user_role::Column::RoleId)),
        )
        .and_where(Expr::col((role::Entity, role::Column::WorkspaceId)).eq(workspace_id));

    if let Some(role_id) = role_id {
        select.and_where(Expr::col((role::Entity, role::Column::Id)).eq(role_id));
    }

    select
}

/// Users whose group holds a role of the workspace
pub(crate) fn group_workspace_members(workspace_id: i32, role_id: Option<i32>) -> SelectStatement {
    let mut select = Query::select();
    select
        .column((user_group::Entity, user_group::Column::UserId))
        .from(user_group::Entity)
        .inner_join(
            group_role::Entity,
            Expr::col((group_role::Entity, group_role::Column::GroupId))
                .equals((user_group::Entity, user_group::Column::GroupId)),
        )
        .inner_join(
            role::Entity,
            Expr::col((role::Entity, role::Column::Id))
                .equals((group_role::Entity, group_role::Column::RoleId)),
        )
        .and_where(Expr::col((role::Entity, role::Column::WorkspaceId)).eq(workspace_id));

    if let Some(role_id) = role_id {
        select.and_where(Expr::col((role::Entity, role::Column::Id)).eq(role_id));
    }

    select
}

/// `u.id IN direct(W) OR u.id IN via_group(W)`
pub(crate) fn registered_in_workspace(workspace_id: i32) -> Condition {
    Condition::any()
        .add(user::Column::Id.in_subquery(direct_workspace_members(workspace_id, None)))
        .add(user::Column::Id.in_subquery(group_workspace_members(workspace_id, None)))
}

/// Exact negation of [`registered_in_workspace`]
pub(crate) fn unregistered_in_workspace(workspace_id: i32) -> Condition {
    Condition::all()
        .add(user::Column::Id.not_in_subquery(direct_workspace_members(workspace_id, None)))
        .add(user::Column::Id.not_in_subquery(group_workspace_members(workspace_id, None)))
}

pub(crate) fn group_members(group_id: i32) -> SelectStatement {
    Query::select()
        .column(user_group::Column::UserId)
        .from(user_group::Entity)
        .and_where(user_group::Column::GroupId.eq(group_id))
        .to_owned()
}

/// First name, last name or username contains `text`, ignoring case
///
/// Both sides go through SQL `UPPER()` so the folding rules are the backend's
/// on either side of the `LIKE`.
pub(crate) fn name_matches(text: &str) -> Condition {
    let pattern = contains_pattern(text);

    [
        user::Column::FirstName,
        user::Column::LastName,
        user::Column::Username,
    ]
    .into_iter()
    .fold(Condition::any(), |condition, column| {
        condition.add(
            Expr::expr(Func::upper(Expr::col((user::Entity, column))))
                .binary(BinOper::Like, upper_like_pattern(&pattern)),
        )
    })
}

/// `UPPER(?) ESCAPE '\'`, the right-hand side of a `LIKE`
fn upper_like_pattern(pattern: &str) -> SimpleExpr {
    SimpleExpr::Binary(
        Box::new(Func::upper(Expr::val(pattern)).into()),
        BinOper::Escape,
        Box::new(SimpleExpr::Constant(LIKE_ESCAPE.into())),
    )
}

/// `%text%` with LIKE metacharacters escaped
fn contains_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
