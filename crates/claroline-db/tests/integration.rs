//! Integration tests for claroline-db
//!
//! Runs the directory queries against a real SQLite in-memory database

use std::collections::HashSet;

use chrono::Utc;
use claroline_db::entities::role::{RoleType, WorkspaceRoleKind, ADMIN_ROLE};
use claroline_db::entities::{group, group_role, role, user, user_group, user_role, workspace};
use claroline_db::{connect, migrate, RepositoryError, RoleRepository, RoleSubject, UserRepository};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, Set};

/// Helper to create a test database
async fn setup_test_db() -> DatabaseConnection {
    let db = connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    migrate(&db).await.expect("Failed to run migrations");

    db
}

async fn create_user(db: &DatabaseConnection, username: &str, first: &str, last: &str) -> user::Model {
    user::ActiveModel {
        username: Set(username.to_string()),
        first_name: Set(first.to_string()),
        last_name: Set(last.to_string()),
        mail: Set(None),
        password: Set("not-a-real-hash".to_string()),
        personal_workspace_id: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
}

async fn create_role(
    db: &DatabaseConnection,
    name: &str,
    role_type: RoleType,
    workspace_id: Option<i32>,
) -> role::Model {
    role::ActiveModel {
        name: Set(name.to_string()),
        translation_key: Set(name.to_lowercase()),
        role_type: Set(role_type),
        workspace_id: Set(workspace_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert role")
}

/// Creates a workspace along with its manager, collaborator and visitor roles
async fn create_workspace(db: &DatabaseConnection, code: &str) -> workspace::Model {
    let ws = workspace::ActiveModel {
        name: Set(format!("Workspace {}", code)),
        code: Set(code.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert workspace");

    for kind in WorkspaceRoleKind::ALL {
        create_role(db, &kind.role_name(ws.id), RoleType::Workspace, Some(ws.id)).await;
    }

    ws
}

async fn create_group(db: &DatabaseConnection, name: &str) -> group::Model {
    group::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert group")
}

async fn assign_user_role(db: &DatabaseConnection, user_id: i32, role_id: i32) {
    user_role::ActiveModel {
        user_id: Set(user_id),
        role_id: Set(role_id),
    }
    .insert(db)
    .await
    .expect("Failed to assign role to user");
}

async fn assign_group_role(db: &DatabaseConnection, group_id: i32, role_id: i32) {
    group_role::ActiveModel {
        group_id: Set(group_id),
        role_id: Set(role_id),
    }
    .insert(db)
    .await
    .expect("Failed to assign role to group");
}

async fn add_to_group(db: &DatabaseConnection, user_id: i32, group_id: i32) {
    user_group::ActiveModel {
        user_id: Set(user_id),
        group_id: Set(group_id),
    }
    .insert(db)
    .await
    .expect("Failed to add user to group");
}

fn usernames(users: &[user::Model]) -> Vec<&str> {
    users.iter().map(|u| u.username.as_str()).collect()
}

/// Fixture used by the membership tests
///
/// - alice: collaborator of `ws` directly
/// - bob: member of `teachers`, which is manager of `ws`
/// - carol: both collaborator directly and member of `teachers`
/// - dave, erin: no role in `ws` (dave is in `students`, which has no role in `ws`)
struct Directory {
    db: DatabaseConnection,
    ws: workspace::Model,
    other_ws: workspace::Model,
    teachers: group::Model,
    students: group::Model,
    alice: user::Model,
    bob: user::Model,
    carol: user::Model,
    dave: user::Model,
    erin: user::Model,
}

async fn setup_directory() -> Directory {
    let db = setup_test_db().await;

    let ws = create_workspace(&db, "WS1").await;
    let other_ws = create_workspace(&db, "WS2").await;

    let alice = create_user(&db, "alice", "Alice", "Liddell").await;
    let bob = create_user(&db, "bob", "Bob", "Marley").await;
    let carol = create_user(&db, "carol", "Carol", "Danvers").await;
    let dave = create_user(&db, "dave", "Dave", "Grohl").await;
    let erin = create_user(&db, "erin", "Erin", "Brockovich").await;

    let roles = RoleRepository::new(db.clone());
    let collaborator = roles.find_collaborator_role(ws.id).await.unwrap();
    let manager = roles.find_manager_role(ws.id).await.unwrap();
    let other_visitor = roles.find_visitor_role(other_ws.id).await.unwrap();

    let teachers = create_group(&db, "teachers").await;
    let students = create_group(&db, "students").await;

    assign_user_role(&db, alice.id, collaborator.id).await;
    assign_user_role(&db, carol.id, collaborator.id).await;
    assign_group_role(&db, teachers.id, manager.id).await;
    assign_group_role(&db, students.id, other_visitor.id).await;

    add_to_group(&db, bob.id, teachers.id).await;
    add_to_group(&db, carol.id, teachers.id).await;
    add_to_group(&db, dave.id, students.id).await;

    Directory {
        db,
        ws,
        other_ws,
        teachers,
        students,
        alice,
        bob,
        carol,
        dave,
        erin,
    }
}

#[tokio::test]
async fn test_database_connection() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let backend = db.get_database_backend();
    assert!(matches!(backend, sea_orm::DatabaseBackend::Sqlite));
}

#[tokio::test]
async fn test_migrations_run_successfully() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let result = migrate(&db).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_user_mail_is_optional() {
    let db = setup_test_db().await;

    let without = create_user(&db, "nomail", "No", "Mail").await;
    assert_eq!(without.mail, None);

    let with = user::ActiveModel {
        username: Set("withmail".to_string()),
        first_name: Set("With".to_string()),
        last_name: Set("Mail".to_string()),
        mail: Set(Some("with@example.com".to_string())),
        password: Set("not-a-real-hash".to_string()),
        personal_workspace_id: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&db)
    .await
    .expect("Failed to insert user with mail");
    assert_eq!(with.mail.as_deref(), Some("with@example.com"));
}

#[tokio::test]
async fn test_each_workspace_role_kind_resolves_to_one_stable_role() {
    let dir = setup_directory().await;
    let roles = RoleRepository::new(dir.db.clone());

    for ws in [&dir.ws, &dir.other_ws] {
        for kind in WorkspaceRoleKind::ALL {
            let first = roles.find_role_of_kind(kind, ws.id).await.unwrap();
            let second = roles.find_role_of_kind(kind, ws.id).await.unwrap();

            assert_eq!(first.id, second.id);
            assert_eq!(first.name, kind.role_name(ws.id));
            assert_eq!(first.workspace_id, Some(ws.id));
        }
    }
}

#[tokio::test]
async fn test_missing_workspace_role_is_a_data_integrity_error() {
    let db = setup_test_db().await;
    let roles = RoleRepository::new(db);

    let result = roles.find_manager_role(999).await;

    assert!(matches!(
        result,
        Err(RepositoryError::UnexpectedRowCount { found: 0, .. })
    ));
}

#[tokio::test]
async fn test_find_by_usernames_orders_and_skips_unknown() {
    let dir = setup_directory().await;
    let users = UserRepository::new(dir.db.clone());

    let found = users
        .find_by_usernames(&["carol", "nobody", "bob"])
        .await
        .unwrap();

    assert_eq!(usernames(&found), vec!["bob", "carol"]);
}

#[tokio::test]
async fn test_find_by_usernames_is_case_sensitive_and_parametrized() {
    let dir = setup_directory().await;
    let users = UserRepository::new(dir.db.clone());

    let found = users
        .find_by_usernames(&["ALICE", "x' OR '1'='1"])
        .await
        .unwrap();
    assert!(found.is_empty());

    let empty: [&str; 0] = [];
    assert!(users.find_by_usernames(&empty).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_users_of_workspace_direct_and_through_groups() {
    let dir = setup_directory().await;
    let users = UserRepository::new(dir.db.clone());

    let direct = users
        .users_of_workspace(dir.ws.id, None, false)
        .await
        .unwrap();
    assert_eq!(usernames(&direct), vec!["alice", "carol"]);

    // carol is both a direct collaborator and a teacher: listed once
    let all = users.users_of_workspace(dir.ws.id, None, true).await.unwrap();
    assert_eq!(usernames(&all), vec!["alice", "bob", "carol"]);
}

#[tokio::test]
async fn test_users_of_workspace_filtered_by_role() {
    let dir = setup_directory().await;
    let users = UserRepository::new(dir.db.clone());
    let roles = RoleRepository::new(dir.db.clone());
    let manager = roles.find_manager_role(dir.ws.id).await.unwrap();
    let visitor = roles.find_visitor_role(dir.ws.id).await.unwrap();

    let managers = users
        .users_of_workspace(dir.ws.id, Some(manager.id), true)
        .await
        .unwrap();
    assert_eq!(usernames(&managers), vec!["bob", "carol"]);

    let direct_managers = users
        .users_of_workspace(dir.ws.id, Some(manager.id), false)
        .await
        .unwrap();
    assert!(direct_managers.is_empty());

    let visitors = users
        .users_of_workspace(dir.ws.id, Some(visitor.id), true)
        .await
        .unwrap();
    assert!(visitors.is_empty());
}

#[tokio::test]
async fn test_registered_and_unregistered_partition_all_users() {
    let dir = setup_directory().await;
    let users = UserRepository::new(dir.db.clone());

    for ws in [&dir.ws, &dir.other_ws] {
        let registered = users
            .registered_users_of_workspace(ws.id, 0, 100)
            .await
            .unwrap();
        let unregistered = users
            .unregistered_users_of_workspace(ws.id, 0, 100)
            .await
            .unwrap();

        let registered_ids: HashSet<i32> = registered.items.iter().map(|u| u.id).collect();
        let unregistered_ids: HashSet<i32> = unregistered.items.iter().map(|u| u.id).collect();

        assert!(registered_ids.is_disjoint(&unregistered_ids));
        assert_eq!(registered_ids.len() + unregistered_ids.len(), 5);
        assert_eq!(registered.total + unregistered.total, 5);
    }

    let unregistered = users
        .unregistered_users_of_workspace(dir.ws.id, 0, 100)
        .await
        .unwrap();
    assert_eq!(usernames(&unregistered.items), vec!["dave", "erin"]);

    // dave reaches the other workspace only through the students group
    let registered_other = users
        .registered_users_of_workspace(dir.other_ws.id, 0, 100)
        .await
        .unwrap();
    assert_eq!(usernames(&registered_other.items), vec!["dave"]);
}

#[tokio::test]
async fn test_unregistered_pages_are_disjoint_and_complete() {
    let dir = setup_directory().await;
    for i in 0..7 {
        create_user(&dir.db, &format!("extra{}", i), "Extra", &format!("User{}", i)).await;
    }
    let users = UserRepository::new(dir.db.clone());

    let full = users
        .unregistered_users_of_workspace(dir.ws.id, 0, 100)
        .await
        .unwrap();
    assert_eq!(full.total, 9);

    let mut seen = HashSet::new();
    let mut offset = 0;
    loop {
        let page = users
            .unregistered_users_of_workspace(dir.ws.id, offset, 4)
            .await
            .unwrap();
        assert_eq!(page.total, 9);
        assert!(page.items.len() <= 4);
        for user in &page.items {
            assert!(seen.insert(user.id), "user {} returned twice", user.username);
        }
        if !page.has_more() {
            break;
        }
        offset += 4;
    }

    let expected: HashSet<i32> = full.items.iter().map(|u| u.id).collect();
    assert_eq!(seen, expected);

    let beyond = users
        .unregistered_users_of_workspace(dir.ws.id, 50, 4)
        .await
        .unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 9);
}

#[tokio::test]
async fn test_search_is_case_insensitive_substring() {
    let dir = setup_directory().await;
    let users = UserRepository::new(dir.db.clone());

    let page = users.search_users("ali", 0, 10).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].user.username, "alice");

    // last name match
    let page = users.search_users("BROCK", 0, 10).await.unwrap();
    assert_eq!(page.items[0].user.username, "erin");
}

#[tokio::test]
async fn test_search_unregistered_combines_text_and_membership() {
    let dir = setup_directory().await;
    let users = UserRepository::new(dir.db.clone());

    // "r" matches carol, dave (Grohl), erin, bob (Marley): only the unregistered survive
    let page = users
        .search_unregistered_users_of_workspace("r", dir.ws.id, 0, 10)
        .await
        .unwrap();
    assert_eq!(usernames(&page.items), vec!["dave", "erin"]);
    assert_eq!(page.total, 2);

    let page = users
        .search_registered_users_of_workspace("r", dir.ws.id, 0, 10)
        .await
        .unwrap();
    assert_eq!(usernames(&page.items), vec!["bob", "carol"]);
}

#[tokio::test]
async fn test_search_treats_like_wildcards_literally() {
    let dir = setup_directory().await;
    create_user(&dir.db, "percent", "100%", "Sure").await;
    let users = UserRepository::new(dir.db.clone());

    let page = users.search_users("%", 0, 10).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].user.username, "percent");

    let page = users.search_users("_", 0, 10).await.unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_search_matches_non_ascii_names() {
    let dir = setup_directory().await;
    create_user(&dir.db, "elodie", "élodie", "Zed").await;
    let users = UserRepository::new(dir.db.clone());

    let page = users.search_users("élo", 0, 10).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].user.username, "elodie");

    // ASCII letters still fold around the accented one
    let page = users.search_users("éLOD", 0, 10).await.unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn test_offset_beyond_signed_range_yields_empty_page() {
    let dir = setup_directory().await;
    let users = UserRepository::new(dir.db.clone());

    let page = users
        .unregistered_users_of_workspace(dir.ws.id, u64::MAX, 4)
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 2);
    assert_eq!(page.offset, i64::MAX as u64);

    let page = users.users(0, u64::MAX).await.unwrap();
    assert_eq!(page.items.len() as u64, page.total);
}

#[tokio::test]
async fn test_group_membership_queries() {
    let dir = setup_directory().await;
    let users = UserRepository::new(dir.db.clone());

    let members = users.users_of_group(dir.teachers.id, 0, 10).await.unwrap();
    assert_eq!(usernames(&members.items), vec!["bob", "carol"]);

    let outside = users
        .unregistered_users_of_group(dir.teachers.id, 0, 10)
        .await
        .unwrap();
    assert_eq!(usernames(&outside.items), vec!["alice", "dave", "erin"]);

    let searched = users
        .search_users_of_group("CAR", dir.teachers.id, 0, 10)
        .await
        .unwrap();
    assert_eq!(usernames(&searched.items), vec!["carol"]);

    let searched_outside = users
        .search_unregistered_users_of_group("d", dir.students.id, 0, 10)
        .await
        .unwrap();
    // carol (Danvers) and alice (Liddell) match; dave is in students
    assert_eq!(usernames(&searched_outside.items), vec!["alice", "carol"]);
}

#[tokio::test]
async fn test_users_carry_platform_roles_only() {
    let dir = setup_directory().await;
    let admin = create_role(&dir.db, ADMIN_ROLE, RoleType::Platform, None).await;
    let member = create_role(&dir.db, "ROLE_USER", RoleType::Platform, None).await;
    assign_user_role(&dir.db, dir.alice.id, admin.id).await;
    assign_user_role(&dir.db, dir.alice.id, member.id).await;
    assign_user_role(&dir.db, dir.bob.id, member.id).await;

    let users = UserRepository::new(dir.db.clone());
    let page = users.users(0, 10).await.unwrap();

    assert_eq!(page.total, 5);
    let alice = &page.items[0];
    assert_eq!(alice.user.username, "alice");
    let names: Vec<&str> = alice.roles.iter().map(|r| r.name.as_str()).collect();
    // alice is also a direct collaborator of ws, which must not show up here
    assert_eq!(names, vec![ADMIN_ROLE, "ROLE_USER"]);

    let erin = &page.items[4];
    assert!(erin.roles.is_empty());
}

#[tokio::test]
async fn test_roles_of_workspace_for_user() {
    let dir = setup_directory().await;
    let roles = RoleRepository::new(dir.db.clone());

    let carol_roles = roles
        .roles_of_workspace_for_user(dir.carol.id, dir.ws.id)
        .await
        .unwrap();
    let names: Vec<String> = carol_roles.into_iter().map(|r| r.name).collect();
    assert_eq!(
        names,
        vec![
            WorkspaceRoleKind::Manager.role_name(dir.ws.id),
            WorkspaceRoleKind::Collaborator.role_name(dir.ws.id),
        ]
    );

    let erin_roles = roles
        .roles_of_workspace_for_user(dir.erin.id, dir.ws.id)
        .await
        .unwrap();
    assert!(erin_roles.is_empty());

    let bob_roles = roles
        .roles_of_workspace_for_user(dir.bob.id, dir.other_ws.id)
        .await
        .unwrap();
    assert!(bob_roles.is_empty());

    let dave_roles = roles
        .roles_of_workspace_for_user(dir.dave.id, dir.other_ws.id)
        .await
        .unwrap();
    assert_eq!(dave_roles.len(), 1);
    assert_eq!(
        dave_roles[0].name,
        WorkspaceRoleKind::Visitor.role_name(dir.other_ws.id)
    );
}

#[tokio::test]
async fn test_find_workspace_role_for_users_and_groups() {
    let dir = setup_directory().await;
    let roles = RoleRepository::new(dir.db.clone());

    let alice_role = roles
        .find_workspace_role(RoleSubject::User(dir.alice.id), dir.ws.id)
        .await
        .unwrap()
        .expect("alice has a role in ws");
    assert_eq!(
        alice_role.name,
        WorkspaceRoleKind::Collaborator.role_name(dir.ws.id)
    );

    // manager role was created first, so it wins over carol's collaborator role
    let carol_role = roles
        .find_workspace_role(RoleSubject::User(dir.carol.id), dir.ws.id)
        .await
        .unwrap()
        .expect("carol has a role in ws");
    assert_eq!(carol_role.name, WorkspaceRoleKind::Manager.role_name(dir.ws.id));

    let group_role = roles
        .find_workspace_role(RoleSubject::Group(dir.teachers.id), dir.ws.id)
        .await
        .unwrap();
    assert_eq!(
        group_role.map(|r| r.name),
        Some(WorkspaceRoleKind::Manager.role_name(dir.ws.id))
    );

    let none = roles
        .find_workspace_role(RoleSubject::User(dir.erin.id), dir.ws.id)
        .await
        .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn test_find_by_workspace_excludes_admin_role() {
    let dir = setup_directory().await;
    create_role(&dir.db, ADMIN_ROLE, RoleType::Platform, Some(dir.ws.id)).await;
    let roles = RoleRepository::new(dir.db.clone());

    let listed = roles.find_by_workspace(dir.ws.id).await.unwrap();

    assert_eq!(listed.len(), 3);
    assert!(listed.iter().all(|r| r.name != ADMIN_ROLE));
}

#[tokio::test]
async fn test_load_account_eager_loads_roles_and_groups() {
    let dir = setup_directory().await;
    let users = UserRepository::new(dir.db.clone());

    let account = users
        .load_account("carol")
        .await
        .unwrap()
        .expect("carol exists");

    assert_eq!(account.user.id, dir.carol.id);
    assert_eq!(account.roles.len(), 1);
    assert_eq!(account.groups.len(), 1);
    assert_eq!(account.groups[0].name, "teachers");
    assert_eq!(account.group_roles.len(), 1);
    assert_eq!(
        account.role_names(),
        vec![
            WorkspaceRoleKind::Collaborator.role_name(dir.ws.id),
            WorkspaceRoleKind::Manager.role_name(dir.ws.id),
        ]
    );

    assert!(users.load_account("Carol").await.unwrap().is_none());
}
