use wiki_core::{
    core_version, ApplicationSettings, DataStoreType, SitePreferences, SqliteWikiRepository,
    WikiRepository,
};

fn installed_repo(enable_cache: bool) -> SqliteWikiRepository {
    let mut settings = ApplicationSettings::new(DataStoreType::Sqlite, ":memory:");
    settings.enable_cache = enable_cache;
    let repo = SqliteWikiRepository::start(settings).unwrap();
    repo.install(DataStoreType::Sqlite, ":memory:").unwrap();
    repo
}

fn stored_rows(repo: &SqliteWikiRepository) -> Vec<(String, String)> {
    let conn = repo
        .context()
        .unwrap()
        .open_admin_connection(":memory:")
        .unwrap();
    let mut stmt = conn
        .prepare("SELECT content, version FROM site_preferences")
        .unwrap();
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    rows
}

#[test]
fn missing_preferences_yield_unsaved_defaults() {
    let repo = installed_repo(false);

    let preferences = repo.get_site_preferences().unwrap();

    assert_eq!(preferences, SitePreferences::default());
    assert!(stored_rows(&repo).is_empty());
}

#[test]
fn saved_preferences_round_trip_with_version_stamp() {
    let mut repo = installed_repo(false);
    let preferences = SitePreferences {
        site_name: "Team docs".to_string(),
        allow_user_signup: true,
        ..SitePreferences::default()
    };

    repo.save_site_preferences(&preferences).unwrap();

    assert_eq!(repo.get_site_preferences().unwrap(), preferences);
    let rows = stored_rows(&repo);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].1, core_version());
}

#[test]
fn saving_twice_keeps_a_single_row() {
    let mut repo = installed_repo(false);
    repo.save_site_preferences(&SitePreferences::default())
        .unwrap();

    let renamed = SitePreferences {
        site_name: "Renamed".to_string(),
        ..SitePreferences::default()
    };
    repo.save_site_preferences(&renamed).unwrap();

    assert_eq!(stored_rows(&repo).len(), 1);
    assert_eq!(repo.get_site_preferences().unwrap().site_name, "Renamed");
}

fn overwrite_stored_name(repo: &SqliteWikiRepository, name: &str) {
    let conn = repo
        .context()
        .unwrap()
        .open_admin_connection(":memory:")
        .unwrap();
    let content = SitePreferences {
        site_name: name.to_string(),
        ..SitePreferences::default()
    }
    .to_json()
    .unwrap();
    conn.execute("UPDATE site_preferences SET content = ?1", [content])
        .unwrap();
}

#[test]
fn cache_serves_preferences_when_enabled() {
    let mut repo = installed_repo(true);
    repo.save_site_preferences(&SitePreferences::default())
        .unwrap();

    overwrite_stored_name(&repo, "Changed behind the cache");

    assert_eq!(repo.get_site_preferences().unwrap().site_name, "My wiki");
}

#[test]
fn uncached_reads_see_store_changes() {
    let mut repo = installed_repo(false);
    repo.save_site_preferences(&SitePreferences::default())
        .unwrap();

    overwrite_stored_name(&repo, "Changed");

    assert_eq!(repo.get_site_preferences().unwrap().site_name, "Changed");
}

#[test]
fn install_clears_cached_preferences() {
    let mut repo = installed_repo(true);
    let custom = SitePreferences {
        site_name: "Custom".to_string(),
        ..SitePreferences::default()
    };
    repo.save_site_preferences(&custom).unwrap();

    repo.install(DataStoreType::Sqlite, ":memory:").unwrap();

    assert_eq!(repo.get_site_preferences().unwrap(), SitePreferences::default());
}
