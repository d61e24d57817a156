//! Wiki repository contract and error taxonomy.
//!
//! # Responsibility
//! - Define the domain-level CRUD and query surface over pages, page
//!   contents, users and site preferences.
//! - Classify failures: configuration, data, upgrade.
//!
//! # Invariants
//! - Point lookups report absence as `Ok(None)`, never as an error.
//! - Implementations only hand out domain objects, never entities.

use crate::db::{DataStoreType, DbError};
use crate::model::page::{Page, PageContent, PageContentId, PageId};
use crate::model::site_preferences::SitePreferences;
use crate::model::user::{User, UserId, UserRole};
use crate::settings::ApplicationSettings;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for persistence, configuration and upgrade failures.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Store context or unit of work used before `startup()`.
    NotStarted(&'static str),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted data cannot be converted into a valid domain object.
    InvalidData(String),
    /// Site preferences document cannot be (de)serialized.
    Serialization(serde_json::Error),
    /// One upgrade step failed; `source` carries the cause.
    Upgrade {
        message: &'static str,
        source: Box<RepoError>,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotStarted(details) => write!(f, "store not started: {details}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Serialization(err) => write!(f, "site preferences serialization failed: {err}"),
            Self::Upgrade { message, source } => write!(f, "upgrade failed: {message}: {source}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Upgrade { source, .. } => Some(source.as_ref()),
            Self::NotStarted(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Repository interface for wiki content, accounts and site preferences.
///
/// One repository value serves one request scope. Mutating calls commit
/// before returning.
pub trait WikiRepository {
    // Pages.

    /// Gets one page by id.
    fn get_page_by_id(&self, id: PageId) -> RepoResult<Option<Page>>;
    /// Gets the first page with exactly this title.
    fn get_page_by_title(&self, title: &str) -> RepoResult<Option<Page>>;
    /// Returns every page. Ordering is unspecified.
    fn all_pages(&self) -> RepoResult<Vec<Page>>;
    fn find_pages_created_by(&self, username: &str) -> RepoResult<Vec<Page>>;
    fn find_pages_modified_by(&self, username: &str) -> RepoResult<Vec<Page>>;
    /// Case-insensitive substring match against each page's tag string.
    fn find_pages_containing_tag(&self, tag: &str) -> RepoResult<Vec<Page>>;
    /// Returns the raw tag string of every page.
    fn all_tags(&self) -> RepoResult<Vec<String>>;
    /// Inserts a page plus its version 1 content in one commit.
    fn add_new_page(
        &mut self,
        page: &Page,
        text: &str,
        edited_by: &str,
        edited_on: i64,
    ) -> RepoResult<PageContent>;
    /// Appends a content version to an existing page.
    ///
    /// Returns `Ok(None)` (and logs) when the page no longer exists.
    fn add_new_page_content_version(
        &mut self,
        page: &Page,
        text: &str,
        edited_by: &str,
        edited_on: i64,
        version: i32,
    ) -> RepoResult<Option<PageContent>>;
    /// Inserts the page when unknown, otherwise updates its metadata in place.
    fn save_or_update_page(&mut self, page: &Page) -> RepoResult<()>;
    /// Updates an existing page's metadata and appends a content version in
    /// one commit.
    ///
    /// Returns `Ok(None)` and writes nothing when the page does not exist.
    fn update_page_with_new_version(
        &mut self,
        page: &Page,
        text: &str,
        edited_by: &str,
        edited_on: i64,
        version: i32,
    ) -> RepoResult<Option<PageContent>>;
    fn delete_page(&mut self, id: PageId) -> RepoResult<()>;
    fn delete_all_pages(&mut self) -> RepoResult<()>;

    // Page contents.

    /// Most recently edited content of a page.
    fn get_latest_page_content(&self, page_id: PageId) -> RepoResult<Option<PageContent>>;
    fn get_page_content_by_id(&self, id: PageContentId) -> RepoResult<Option<PageContent>>;
    fn get_page_content_by_version_id(
        &self,
        version_id: PageContentId,
    ) -> RepoResult<Option<PageContent>>;
    fn get_page_content_by_page_id_and_version_number(
        &self,
        page_id: PageId,
        version_number: i32,
    ) -> RepoResult<Option<PageContent>>;
    fn get_page_content_by_edited_by(&self, username: &str) -> RepoResult<Option<PageContent>>;
    fn find_page_contents_by_page_id(&self, page_id: PageId) -> RepoResult<Vec<PageContent>>;
    fn find_page_contents_edited_by(&self, username: &str) -> RepoResult<Vec<PageContent>>;
    fn all_page_contents(&self) -> RepoResult<Vec<PageContent>>;
    /// Updates one existing content version in place. Unknown ids are a no-op.
    fn update_page_content(&mut self, content: &PageContent) -> RepoResult<()>;
    fn delete_page_content(&mut self, id: PageContentId) -> RepoResult<()>;
    fn delete_all_page_content(&mut self) -> RepoResult<()>;

    // Users.

    /// Gets an account by id filtered on activation state.
    ///
    /// Callers normally pass `is_activated = true`.
    fn get_user_by_id(&self, id: UserId, is_activated: bool) -> RepoResult<Option<User>>;
    fn get_admin_by_id(&self, id: UserId) -> RepoResult<Option<User>>;
    fn get_editor_by_id(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Looks up only among accounts that are not yet activated.
    fn get_user_by_activation_key(&self, key: &str) -> RepoResult<Option<User>>;
    fn get_user_by_password_reset_key(&self, key: &str) -> RepoResult<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    fn get_user_by_email(&self, email: &str, is_activated: bool) -> RepoResult<Option<User>>;
    fn get_user_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> RepoResult<Option<User>>;
    fn find_users_by_role(&self, role: UserRole) -> RepoResult<Vec<User>>;
    fn find_all_admins(&self) -> RepoResult<Vec<User>> {
        self.find_users_by_role(UserRole::Admin)
    }
    fn find_all_editors(&self) -> RepoResult<Vec<User>> {
        self.find_users_by_role(UserRole::Editor)
    }
    fn save_or_update_user(&mut self, user: &User) -> RepoResult<()>;
    fn delete_user(&mut self, id: UserId) -> RepoResult<()>;
    fn delete_all_users(&mut self) -> RepoResult<()>;

    // Site preferences.

    /// Returns the stored preferences, or an unpersisted default.
    fn get_site_preferences(&self) -> RepoResult<SitePreferences>;
    /// Upserts the singleton, stamping the current application version.
    fn save_site_preferences(&mut self, preferences: &SitePreferences) -> RepoResult<()>;

    // Administration.

    /// Configures the store context. Empty connection strings are ignored.
    fn startup(
        &mut self,
        data_store_type: DataStoreType,
        connection_string: &str,
        enable_cache: bool,
    ) -> RepoResult<()>;
    /// Drops and recreates the schema. Destructive; first-time setup only.
    fn install(&self, data_store_type: DataStoreType, connection_string: &str) -> RepoResult<()>;
    /// Verifies that the store can be reached.
    fn test(&self, data_store_type: DataStoreType, connection_string: &str) -> RepoResult<()>;
    /// Upgrades the schema, then re-saves default site preferences.
    fn upgrade(&mut self, settings: &ApplicationSettings) -> RepoResult<()>;
    /// Saves pending changes and releases the unit of work.
    fn dispose(self) -> RepoResult<()>
    where
        Self: Sized;
}
