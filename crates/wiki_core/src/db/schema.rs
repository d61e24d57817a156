//! Administrative schema procedures: drop, create, upgrade.
//!
//! # Invariants
//! - `drop` leaves the database at schema version 0.
//! - `create` and `upgrade` both end at `migrations::latest_version()`.

use super::migrations::{apply_migrations, current_version, latest_version};
use super::{DataStoreType, DbResult};
use log::info;
use rusqlite::Connection;

const DROP_SQL: &str = include_str!("drop_schema.sql");

/// Drops every wiki table and resets the recorded schema version.
pub fn drop(conn: &mut Connection, data_store: DataStoreType) -> DbResult<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(DROP_SQL)?;
    tx.execute_batch("PRAGMA user_version = 0;")?;
    tx.commit()?;

    info!(
        "event=schema_drop module=db status=ok data_store={}",
        data_store.name()
    );
    Ok(())
}

/// Creates the full schema on an empty database.
pub fn create(conn: &mut Connection, data_store: DataStoreType) -> DbResult<()> {
    let applied = apply_migrations(conn)?;
    info!(
        "event=schema_create module=db status=ok data_store={} applied={} version={}",
        data_store.name(),
        applied,
        latest_version()
    );
    Ok(())
}

/// Brings an existing schema up to the latest version.
///
/// Returns the version the database was at before upgrading.
pub fn upgrade(conn: &mut Connection, data_store: DataStoreType) -> DbResult<u32> {
    let previous = current_version(conn)?;
    let applied = apply_migrations(conn)?;
    info!(
        "event=schema_upgrade module=db status=ok data_store={} from_version={} to_version={} applied={}",
        data_store.name(),
        previous,
        latest_version(),
        applied
    );
    Ok(previous)
}
