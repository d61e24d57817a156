//! Data store type descriptor.
//!
//! # Responsibility
//! - Name the backing engines a configuration may select.
//! - Select dialect-specific query paths at call time.
//!
//! # Invariants
//! - Every data store type is served by the bundled SQLite driver; the type
//!   only selects schema procedures and query strategies.
//! - Engines without an entry in an override table use the generic path.

use super::DbError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Backing engine named by configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStoreType {
    #[default]
    Sqlite,
    #[serde(alias = "postgresql")]
    Postgres,
}

/// How `find_pages_containing_tag` reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagSearchPath {
    /// Predicate query built by the unit of work.
    Generic,
    /// Raw parameterized `LIKE '%tag%'` command.
    RawLike,
}

// Postgres LIKE through the generic predicate path is broken upstream.
const TAG_SEARCH_OVERRIDES: &[(DataStoreType, TagSearchPath)] =
    &[(DataStoreType::Postgres, TagSearchPath::RawLike)];

impl DataStoreType {
    /// Stable lowercase name used in config files and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }

    /// Returns the tag search path for this engine.
    pub fn tag_search_path(self) -> TagSearchPath {
        TAG_SEARCH_OVERRIDES
            .iter()
            .find(|(data_store, _)| *data_store == self)
            .map_or(TagSearchPath::Generic, |(_, path)| *path)
    }
}

impl Display for DataStoreType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataStoreType {
    type Err = DbError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(DbError::UnknownDataStoreType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DataStoreType, TagSearchPath};

    #[test]
    fn parse_accepts_known_names_case_insensitively() {
        assert_eq!(
            "SQLite".parse::<DataStoreType>().unwrap(),
            DataStoreType::Sqlite
        );
        assert_eq!(
            " postgresql ".parse::<DataStoreType>().unwrap(),
            DataStoreType::Postgres
        );
        assert!("oracle".parse::<DataStoreType>().is_err());
    }

    #[test]
    fn only_postgres_overrides_tag_search() {
        assert_eq!(
            DataStoreType::Sqlite.tag_search_path(),
            TagSearchPath::Generic
        );
        assert_eq!(
            DataStoreType::Postgres.tag_search_path(),
            TagSearchPath::RawLike
        );
    }
}
