//! Store context: the started connection configuration shared by scopes.
//!
//! # Responsibility
//! - Remember the connection target and cache flag.
//! - Produce one unit of work per request scope.
//! - Open administrative connections and connectivity probes.
//!
//! # Invariants
//! - Units of work are only handed out for databases at the latest schema
//!   version.
//! - A shared in-memory database lives as long as its context.

use crate::db::migrations::{current_version, latest_version};
use crate::db::{open_connection, open_existing, ConnectionTarget, DataStoreType};
use crate::model::site_preferences::SitePreferences;
use crate::repo::wiki_repo::{RepoError, RepoResult};
use crate::store::unit_of_work::SqliteUnitOfWork;
use log::info;
use parking_lot::Mutex;
use rusqlite::Connection;

/// Shared, started persistence configuration.
pub struct StoreContext {
    connection_string: String,
    target: ConnectionTarget,
    enable_cache: bool,
    // Keeps shared-cache in-memory databases alive between scopes.
    _anchor: Option<Mutex<Connection>>,
    preferences_cache: Mutex<Option<SitePreferences>>,
}

impl StoreContext {
    /// Builds a context for the given connection string.
    ///
    /// # Errors
    /// - Returns `Db` when an in-memory anchor connection cannot be opened.
    pub fn new(
        data_store_type: DataStoreType,
        connection_string: &str,
        enable_cache: bool,
    ) -> RepoResult<Self> {
        let target = ConnectionTarget::parse(connection_string);
        let anchor = match &target {
            ConnectionTarget::SharedMemory(_) => Some(Mutex::new(open_connection(&target)?)),
            ConnectionTarget::File(_) => None,
        };

        info!(
            "event=store_startup module=store status=ok data_store={} enable_cache={}",
            data_store_type.name(),
            enable_cache
        );

        Ok(Self {
            connection_string: connection_string.trim().to_string(),
            target,
            enable_cache,
            _anchor: anchor,
            preferences_cache: Mutex::new(None),
        })
    }

    /// Opens a new unit of work for one request scope.
    ///
    /// # Errors
    /// - Returns `UninitializedConnection` when the schema is missing or stale.
    pub fn create_unit_of_work(&self) -> RepoResult<SqliteUnitOfWork> {
        let conn = open_connection(&self.target)?;
        let actual_version = current_version(&conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(SqliteUnitOfWork::new(conn))
    }

    /// Opens a raw connection for schema procedures.
    ///
    /// A connection string equal to the started one reuses this context's
    /// target, so in-memory stores resolve to the same database.
    pub fn open_admin_connection(&self, connection_string: &str) -> RepoResult<Connection> {
        Ok(open_connection(&self.resolve(connection_string))?)
    }

    /// Verifies that an existing database can be opened and queried.
    pub fn probe(&self, connection_string: &str) -> RepoResult<()> {
        let conn = open_existing(&self.resolve(connection_string))?;
        conn.query_row("SELECT 1;", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    pub(crate) fn cached_preferences(&self) -> Option<SitePreferences> {
        if !self.enable_cache {
            return None;
        }
        self.preferences_cache.lock().clone()
    }

    pub(crate) fn cache_preferences(&self, preferences: &SitePreferences) {
        if self.enable_cache {
            *self.preferences_cache.lock() = Some(preferences.clone());
        }
    }

    pub(crate) fn clear_preferences_cache(&self) {
        *self.preferences_cache.lock() = None;
    }

    fn resolve(&self, connection_string: &str) -> ConnectionTarget {
        if connection_string.trim() == self.connection_string {
            self.target.clone()
        } else {
            ConnectionTarget::parse(connection_string)
        }
    }
}
