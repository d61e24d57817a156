//! SQLite storage bootstrap, schema procedures and migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the wiki store.
//! - Apply, drop and recreate the schema for a given data store type.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Units of work must not touch wiki tables before the schema is current.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod data_store;
pub mod migrations;
mod open;
pub mod schema;

pub use data_store::{DataStoreType, TagSearchPath};
pub use open::{
    open_connection, open_existing, ConnectionTarget, IN_MEMORY_CONNECTION_STRING, UNICODE_LOWER_FN,
};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    UnknownDataStoreType(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::UnknownDataStoreType(value) => write!(
                f,
                "unknown data store type `{value}`; expected sqlite|postgres"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::UnknownDataStoreType(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
