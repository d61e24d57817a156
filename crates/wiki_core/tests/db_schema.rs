use rusqlite::Connection;
use wiki_core::db::migrations::{apply_migrations, current_version, latest_version};
use wiki_core::db::{schema, DataStoreType, DbError};

const INITIAL_SCHEMA: &str = include_str!("../src/db/migrations/0001_init.sql");
const TABLES: [&str; 4] = ["pages", "page_contents", "users", "site_preferences"];

#[test]
fn create_builds_every_table_at_latest_version() {
    let mut conn = Connection::open_in_memory().unwrap();

    schema::create(&mut conn, DataStoreType::Sqlite).unwrap();

    assert_eq!(current_version(&conn).unwrap(), latest_version());
    for table in TABLES {
        assert!(table_exists(&conn, table), "missing table {table}");
    }
    assert!(column_exists(&conn, "pages", "is_locked"));
}

#[test]
fn apply_migrations_is_idempotent() {
    let mut conn = Connection::open_in_memory().unwrap();

    assert_eq!(apply_migrations(&mut conn).unwrap(), 2);
    assert_eq!(apply_migrations(&mut conn).unwrap(), 0);
}

#[test]
fn drop_removes_tables_and_resets_version() {
    let mut conn = Connection::open_in_memory().unwrap();
    schema::create(&mut conn, DataStoreType::Postgres).unwrap();

    schema::drop(&mut conn, DataStoreType::Postgres).unwrap();

    assert_eq!(current_version(&conn).unwrap(), 0);
    for table in TABLES {
        assert!(!table_exists(&conn, table), "table {table} survived drop");
    }
}

#[test]
fn drop_on_empty_database_is_harmless() {
    let mut conn = Connection::open_in_memory().unwrap();
    schema::drop(&mut conn, DataStoreType::Sqlite).unwrap();
    schema::create(&mut conn, DataStoreType::Sqlite).unwrap();
    assert_eq!(current_version(&conn).unwrap(), latest_version());
}

#[test]
fn upgrade_reports_previous_version() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(INITIAL_SCHEMA).unwrap();
    conn.execute_batch("PRAGMA user_version = 1;").unwrap();

    let previous = schema::upgrade(&mut conn, DataStoreType::Sqlite).unwrap();

    assert_eq!(previous, 1);
    assert_eq!(current_version(&conn).unwrap(), latest_version());
    assert!(column_exists(&conn, "pages", "is_locked"));
}

#[test]
fn newer_schema_version_is_rejected() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();

    match apply_migrations(&mut conn).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn deleting_a_page_cascades_to_contents() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    schema::create(&mut conn, DataStoreType::Sqlite).unwrap();
    conn.execute_batch(
        "INSERT INTO pages (id, title) VALUES (1, 'Home');
         INSERT INTO page_contents (id, page_id, text, version_number)
         VALUES ('c1', 1, 'hello', 1);
         DELETE FROM pages WHERE id = 1;",
    )
    .unwrap();

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM page_contents", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

fn table_exists(conn: &Connection, table_name: &str) -> bool {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
        [table_name],
        |row| row.get::<_, i64>(0),
    )
    .unwrap()
        == 1
}

fn column_exists(conn: &Connection, table_name: &str, column_name: &str) -> bool {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table_name});"))
        .unwrap();
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    columns.iter().any(|column| column == column_name)
}
