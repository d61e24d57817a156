//! Core content store for the wiki.
//! Domain objects in, domain objects out; persistence stays behind the
//! repository.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod settings;
pub mod store;

pub use db::{DataStoreType, DbError};
pub use logging::{
    default_log_level, init_logging, init_logging_from_settings, logging_status, LoggingError,
};
pub use model::page::{Page, PageContent, PageContentId, PageId};
pub use model::site_preferences::SitePreferences;
pub use model::user::{User, UserId, UserRole};
pub use repo::sqlite_repo::SqliteWikiRepository;
pub use repo::wiki_repo::{RepoError, RepoResult, WikiRepository};
pub use service::page_service::{PageService, PageServiceError, PageView};
pub use settings::{ApplicationSettings, LoggingSettings, SettingsError};
pub use store::context::StoreContext;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version, stamped onto saved site preferences.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
