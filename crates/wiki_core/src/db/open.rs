//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Resolve connection strings into file or shared in-memory targets.
//! - Configure connection pragmas required by repository behavior.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections expose `unicode_lower(text)`, a full Unicode
//!   lowercase fold (the built-in `lower` only folds ASCII).
//! - `open_existing` never creates a missing database file.
//! - Opening does not migrate; schema work belongs to `db::schema`.

use super::DbResult;
use log::{error, info};
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OpenFlags};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// SQL scalar function registered on every connection.
pub const UNICODE_LOWER_FN: &str = "unicode_lower";

/// Connection string that selects a private in-memory database.
pub const IN_MEMORY_CONNECTION_STRING: &str = ":memory:";

/// Physical location behind a connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    /// SQLite database file.
    File(PathBuf),
    /// Named shared-cache in-memory database (`file:...?mode=memory&cache=shared`).
    SharedMemory(String),
}

impl ConnectionTarget {
    /// Parses a connection string.
    ///
    /// Accepts a bare path or `:memory:`, or a `key=value;...` string whose
    /// `Data Source` entry names one of those; other keys are ignored.
    /// `:memory:` yields a uniquely named shared-cache database so several
    /// connections (one per unit of work) observe the same data.
    pub fn parse(connection_string: &str) -> Self {
        let source = data_source(connection_string);
        if source == IN_MEMORY_CONNECTION_STRING {
            return Self::SharedMemory(format!(
                "file:wiki-{}?mode=memory&cache=shared",
                Uuid::new_v4().simple()
            ));
        }
        Self::File(PathBuf::from(source))
    }

    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::SharedMemory(_) => "memory",
        }
    }

    fn open_with(&self, create: bool) -> rusqlite::Result<Connection> {
        match self {
            Self::File(path) if create => Connection::open(path),
            Self::File(path) => Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            ),
            Self::SharedMemory(uri) => Connection::open(uri),
        }
    }
}

fn data_source(connection_string: &str) -> &str {
    let trimmed = connection_string.trim();
    trimmed
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("data source"))
        .map_or(trimmed, |(_, value)| value.trim())
}

/// Opens a connection, creating the database file when missing.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_connection(target: &ConnectionTarget) -> DbResult<Connection> {
    open_target(target, true)
}

/// Opens a connection to an existing database only.
///
/// Used by connectivity probes, which must not leave new files behind.
pub fn open_existing(target: &ConnectionTarget) -> DbResult<Connection> {
    open_target(target, false)
}

fn open_target(target: &ConnectionTarget, create: bool) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = target.mode();
    info!("event=db_open module=db status=start mode={mode} create={create}");

    let conn = match target.open_with(create) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err.into())
        }
    }
}

fn bootstrap_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.create_scalar_function(
        UNICODE_LOWER_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text = ctx.get::<Option<String>>(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )?;
    Ok(())
}
