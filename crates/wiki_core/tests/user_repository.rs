use wiki_core::{
    ApplicationSettings, DataStoreType, SqliteWikiRepository, User, UserRole, WikiRepository,
};

fn installed_repo() -> SqliteWikiRepository {
    let repo = SqliteWikiRepository::start(ApplicationSettings::new(
        DataStoreType::Sqlite,
        ":memory:",
    ))
    .unwrap();
    repo.install(DataStoreType::Sqlite, ":memory:").unwrap();
    repo
}

fn active_admin() -> User {
    User {
        firstname: "Ada".to_string(),
        lastname: "Admin".to_string(),
        password: "hash".to_string(),
        salt: "salt".to_string(),
        is_activated: true,
        is_admin: true,
        ..User::new("admin", "admin@example.com")
    }
}

fn pending_editor() -> User {
    User {
        is_editor: true,
        activation_key: Some("activate-me".to_string()),
        ..User::new("editor", "editor@example.com")
    }
}

#[test]
fn saved_user_round_trips_every_field() {
    let mut repo = installed_repo();
    let admin = active_admin();
    repo.save_or_update_user(&admin).unwrap();

    let stored = repo.get_user_by_id(admin.id, true).unwrap().unwrap();
    assert_eq!(stored, admin);
    assert!(stored.has_role(UserRole::Admin));
    assert!(!stored.has_role(UserRole::Editor));
}

#[test]
fn get_user_by_id_respects_activation_state() {
    let mut repo = installed_repo();
    let admin = active_admin();
    let editor = pending_editor();
    repo.save_or_update_user(&admin).unwrap();
    repo.save_or_update_user(&editor).unwrap();

    assert!(repo.get_user_by_id(admin.id, false).unwrap().is_none());
    assert!(repo.get_user_by_id(editor.id, true).unwrap().is_none());
    assert!(repo.get_user_by_id(editor.id, false).unwrap().is_some());
}

#[test]
fn role_lookups_filter_on_flags() {
    let mut repo = installed_repo();
    let admin = active_admin();
    let editor = pending_editor();
    repo.save_or_update_user(&admin).unwrap();
    repo.save_or_update_user(&editor).unwrap();

    assert!(repo.get_admin_by_id(admin.id).unwrap().is_some());
    assert!(repo.get_admin_by_id(editor.id).unwrap().is_none());
    assert!(repo.get_editor_by_id(editor.id).unwrap().is_some());
    assert!(repo.get_editor_by_id(admin.id).unwrap().is_none());

    let admins = repo.find_all_admins().unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].id, admin.id);

    let editors = repo.find_all_editors().unwrap();
    assert_eq!(editors.len(), 1);
    assert_eq!(editors[0].username, "editor");
}

#[test]
fn activation_key_only_matches_inactive_accounts() {
    let mut repo = installed_repo();
    let editor = pending_editor();
    repo.save_or_update_user(&editor).unwrap();

    let found = repo.get_user_by_activation_key("activate-me").unwrap();
    assert_eq!(found.map(|user| user.id), Some(editor.id));

    let activated = User {
        is_activated: true,
        ..editor
    };
    repo.save_or_update_user(&activated).unwrap();
    assert!(repo
        .get_user_by_activation_key("activate-me")
        .unwrap()
        .is_none());
}

#[test]
fn password_reset_key_lookup() {
    let mut repo = installed_repo();
    let admin = User {
        password_reset_key: Some("reset-123".to_string()),
        ..active_admin()
    };
    repo.save_or_update_user(&admin).unwrap();

    assert_eq!(
        repo.get_user_by_password_reset_key("reset-123")
            .unwrap()
            .map(|user| user.id),
        Some(admin.id)
    );
    assert!(repo
        .get_user_by_password_reset_key("other")
        .unwrap()
        .is_none());
}

#[test]
fn username_and_email_lookups() {
    let mut repo = installed_repo();
    let admin = active_admin();
    let editor = pending_editor();
    repo.save_or_update_user(&admin).unwrap();
    repo.save_or_update_user(&editor).unwrap();

    assert_eq!(
        repo.get_user_by_username("admin").unwrap().unwrap().id,
        admin.id
    );
    assert!(repo.get_user_by_username("nobody").unwrap().is_none());

    assert!(repo
        .get_user_by_email("admin@example.com", true)
        .unwrap()
        .is_some());
    assert!(repo
        .get_user_by_email("editor@example.com", true)
        .unwrap()
        .is_none());
    assert!(repo
        .get_user_by_email("editor@example.com", false)
        .unwrap()
        .is_some());

    let by_email = repo
        .get_user_by_username_or_email("unknown", "editor@example.com")
        .unwrap()
        .unwrap();
    assert_eq!(by_email.id, editor.id);
    let by_name = repo
        .get_user_by_username_or_email("admin", "unknown@example.com")
        .unwrap()
        .unwrap();
    assert_eq!(by_name.id, admin.id);
    assert!(repo
        .get_user_by_username_or_email("unknown", "unknown@example.com")
        .unwrap()
        .is_none());
}

#[test]
fn save_or_update_user_updates_existing_account() {
    let mut repo = installed_repo();
    let admin = active_admin();
    repo.save_or_update_user(&admin).unwrap();

    let changed = User {
        email: "new@example.com".to_string(),
        is_editor: true,
        ..admin.clone()
    };
    repo.save_or_update_user(&changed).unwrap();

    assert_eq!(repo.find_all_admins().unwrap().len(), 1);
    let stored = repo.get_user_by_id(admin.id, true).unwrap().unwrap();
    assert_eq!(stored.email, "new@example.com");
    assert!(stored.is_editor);
}

#[test]
fn deleting_users() {
    let mut repo = installed_repo();
    let admin = active_admin();
    let editor = pending_editor();
    repo.save_or_update_user(&admin).unwrap();
    repo.save_or_update_user(&editor).unwrap();

    repo.delete_user(admin.id).unwrap();
    assert!(repo.get_user_by_username("admin").unwrap().is_none());
    repo.delete_user(admin.id).unwrap();

    repo.delete_all_users().unwrap();
    assert!(repo.get_user_by_username("editor").unwrap().is_none());
}
