//! Unit-of-work contract and SQLite implementation.
//!
//! # Responsibility
//! - Offer find/query/add/update/remove over `Entity` tables.
//! - Track pending writes until `save_changes` commits them.
//!
//! # Invariants
//! - The first write of a scope opens a transaction; reads never open one.
//! - `save_changes` is the only commit point.
//! - Dropping a unit of work with pending writes rolls them back.

use crate::repo::wiki_repo::RepoResult;
use crate::store::entity::Entity;
use crate::store::query::{Query, RawCommand};
use log::{debug, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

/// Scoped transactional context over entity tables.
pub trait UnitOfWork {
    /// Looks up one entity by key.
    fn find_by_id<E: Entity>(&self, key: &E::Key) -> RepoResult<Option<E>>;
    /// Returns every entity matching the query.
    fn query<E: Entity>(&self, query: &Query) -> RepoResult<Vec<E>>;
    /// Runs a raw parameterized `SELECT` whose columns decode as `E`.
    fn find_by_sql<E: Entity>(&self, command: &RawCommand) -> RepoResult<Vec<E>>;
    /// Inserts an entity; keyless entities receive their generated key.
    fn add<E: Entity>(&mut self, entity: &mut E) -> RepoResult<()>;
    /// Rewrites every non-key column. Returns `false` when no row matched.
    fn update<E: Entity>(&mut self, entity: &E) -> RepoResult<bool>;
    /// Removes one row by key. Returns `false` when no row matched.
    fn remove<E: Entity>(&mut self, key: &E::Key) -> RepoResult<bool>;
    /// Removes every row matching the query's filter.
    fn remove_all<E: Entity>(&mut self, query: &Query) -> RepoResult<usize>;
    /// Commits pending writes.
    fn save_changes(&mut self) -> RepoResult<()>;
    /// Drops pending writes.
    fn discard_changes(&mut self) -> RepoResult<()>;
    fn has_pending_changes(&self) -> bool;

    /// Returns the first entity matching the query.
    fn find_one<E: Entity>(&self, query: &Query) -> RepoResult<Option<E>> {
        Ok(self.query::<E>(&query.clone().limit(1))?.into_iter().next())
    }

    /// Runs `work`, then commits; discards everything `work` wrote on error.
    fn apply<T, F>(&mut self, work: F) -> RepoResult<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> RepoResult<T>,
    {
        match work(self) {
            Ok(value) => {
                self.save_changes()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(discard_err) = self.discard_changes() {
                    warn!(
                        "event=uow_discard module=store status=error error={}",
                        discard_err
                    );
                }
                Err(err)
            }
        }
    }
}

/// Unit of work bound to one SQLite connection.
pub struct SqliteUnitOfWork {
    conn: Connection,
    in_transaction: bool,
}

impl SqliteUnitOfWork {
    /// Wraps a bootstrapped connection whose schema is current.
    pub(crate) fn new(conn: Connection) -> Self {
        Self {
            conn,
            in_transaction: false,
        }
    }

    fn begin_if_needed(&mut self) -> RepoResult<()> {
        if !self.in_transaction {
            self.conn.execute_batch("BEGIN IMMEDIATE;")?;
            self.in_transaction = true;
        }
        Ok(())
    }

    fn select_entities<E: Entity>(&self, sql: &str, binds: Vec<Value>) -> RepoResult<Vec<E>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            entities.push(E::from_row(row)?);
        }
        Ok(entities)
    }
}

fn select_sql<E: Entity>() -> String {
    format!("SELECT {} FROM {}", E::COLUMNS.join(", "), E::TABLE)
}

impl UnitOfWork for SqliteUnitOfWork {
    fn find_by_id<E: Entity>(&self, key: &E::Key) -> RepoResult<Option<E>> {
        let sql = format!("{} WHERE {} = ?1", select_sql::<E>(), E::key_column());
        Ok(self
            .select_entities::<E>(&sql, vec![E::key_value(key)])?
            .into_iter()
            .next())
    }

    fn query<E: Entity>(&self, query: &Query) -> RepoResult<Vec<E>> {
        let (tail, binds) = query.to_sql();
        let sql = format!("{}{tail}", select_sql::<E>());
        self.select_entities::<E>(&sql, binds)
    }

    fn find_by_sql<E: Entity>(&self, command: &RawCommand) -> RepoResult<Vec<E>> {
        self.select_entities::<E>(&command.text, command.params.clone())
    }

    fn add<E: Entity>(&mut self, entity: &mut E) -> RepoResult<()> {
        self.begin_if_needed()?;

        let generate_key = !entity.has_key();
        let (columns, values) = if generate_key {
            (&E::COLUMNS[1..], entity.values().split_off(1))
        } else {
            (E::COLUMNS, entity.values())
        };
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({});",
            E::TABLE,
            columns.join(", "),
            placeholders.join(", ")
        );
        self.conn.execute(&sql, params_from_iter(values))?;

        if generate_key {
            entity.assign_generated_key(self.conn.last_insert_rowid());
        }
        debug!(
            "event=uow_add module=store status=ok table={} key={:?}",
            E::TABLE,
            entity.key()
        );
        Ok(())
    }

    fn update<E: Entity>(&mut self, entity: &E) -> RepoResult<bool> {
        self.begin_if_needed()?;

        let mut values = entity.values();
        let key = values.remove(0);
        let assignments: Vec<String> = E::COLUMNS[1..]
            .iter()
            .enumerate()
            .map(|(index, column)| format!("{column} = ?{}", index + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{};",
            E::TABLE,
            assignments.join(", "),
            E::key_column(),
            values.len() + 1
        );
        values.push(key);
        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        Ok(changed > 0)
    }

    fn remove<E: Entity>(&mut self, key: &E::Key) -> RepoResult<bool> {
        self.begin_if_needed()?;

        let sql = format!("DELETE FROM {} WHERE {} = ?1;", E::TABLE, E::key_column());
        let changed = self.conn.execute(&sql, [E::key_value(key)])?;
        Ok(changed > 0)
    }

    fn remove_all<E: Entity>(&mut self, query: &Query) -> RepoResult<usize> {
        self.begin_if_needed()?;

        let (where_clause, binds) = query.where_clause();
        let sql = format!("DELETE FROM {}{where_clause};", E::TABLE);
        let removed = self.conn.execute(&sql, params_from_iter(binds))?;
        debug!(
            "event=uow_remove_all module=store status=ok table={} removed={}",
            E::TABLE,
            removed
        );
        Ok(removed)
    }

    fn save_changes(&mut self) -> RepoResult<()> {
        if self.in_transaction {
            self.conn.execute_batch("COMMIT;")?;
            self.in_transaction = false;
            debug!("event=uow_save_changes module=store status=ok");
        }
        Ok(())
    }

    fn discard_changes(&mut self) -> RepoResult<()> {
        if self.in_transaction {
            self.in_transaction = false;
            self.conn.execute_batch("ROLLBACK;")?;
            debug!("event=uow_discard module=store status=ok");
        }
        Ok(())
    }

    fn has_pending_changes(&self) -> bool {
        self.in_transaction
    }
}

impl Drop for SqliteUnitOfWork {
    fn drop(&mut self) {
        if self.in_transaction {
            warn!("event=uow_drop module=store status=rollback reason=unsaved_changes");
            if let Err(err) = self.conn.execute_batch("ROLLBACK;") {
                warn!("event=uow_drop module=store status=error error={err}");
            }
        }
    }
}
