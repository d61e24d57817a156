//! SQLite-backed wiki repository.
//!
//! # Responsibility
//! - Translate domain calls into unit-of-work operations and map entity
//!   results back to domain objects.
//! - Run the administrative procedures (startup, install, test, upgrade).
//!
//! # Invariants
//! - Settings and the store context arrive through constructors or
//!   `startup()`; nothing is looked up globally.
//! - Every mutation ends in `save_changes` (via `UnitOfWork::apply`).
//! - Tag search picks its path from the configured data store type at call
//!   time.

use crate::core_version;
use crate::db::{schema, DataStoreType, TagSearchPath, UNICODE_LOWER_FN};
use crate::model::page::{Page, PageContent, PageContentId, PageId};
use crate::model::site_preferences::SitePreferences;
use crate::model::user::{User, UserId, UserRole};
use crate::repo::wiki_repo::{RepoError, RepoResult, WikiRepository};
use crate::settings::ApplicationSettings;
use crate::store::context::StoreContext;
use crate::store::entity::{
    apply_page_content_to_entity, apply_page_to_entity, apply_user_to_entity,
    page_content_from_entity, Entity, PageContentEntity, PageEntity, SitePreferencesEntity,
    UserEntity,
};
use crate::store::query::{Direction, Filter, Query, RawCommand};
use crate::store::unit_of_work::{SqliteUnitOfWork, UnitOfWork};
use log::{error, info, warn};
use once_cell::unsync::OnceCell;
use rusqlite::types::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

const NOT_STARTED: &str = "store context is unavailable - has startup() been called?";

/// Wiki repository for one request scope.
pub struct SqliteWikiRepository {
    settings: ApplicationSettings,
    context: Option<Arc<StoreContext>>,
    unit_of_work: OnceCell<SqliteUnitOfWork>,
}

impl SqliteWikiRepository {
    /// Creates an unstarted repository; call `startup()` before use.
    pub fn new(settings: ApplicationSettings) -> Self {
        Self {
            settings,
            context: None,
            unit_of_work: OnceCell::new(),
        }
    }

    /// Creates a repository scope over an already started context.
    pub fn with_context(settings: ApplicationSettings, context: Arc<StoreContext>) -> Self {
        Self {
            settings,
            context: Some(context),
            unit_of_work: OnceCell::new(),
        }
    }

    /// Builds a context from `settings` and starts a repository over it.
    pub fn start(settings: ApplicationSettings) -> RepoResult<Self> {
        let mut repo = Self::new(settings);
        let (data_store_type, connection_string, enable_cache) = (
            repo.settings.data_store_type,
            repo.settings.connection_string.clone(),
            repo.settings.enable_cache,
        );
        repo.startup(data_store_type, &connection_string, enable_cache)?;
        Ok(repo)
    }

    pub fn settings(&self) -> &ApplicationSettings {
        &self.settings
    }

    /// Returns the started context, e.g. to open further request scopes.
    ///
    /// # Errors
    /// - Returns `NotStarted` before a successful `startup()`.
    pub fn context(&self) -> RepoResult<&Arc<StoreContext>> {
        self.context.as_ref().ok_or(RepoError::NotStarted(NOT_STARTED))
    }

    fn unit_of_work(&self) -> RepoResult<&SqliteUnitOfWork> {
        let context = self.context()?;
        self.unit_of_work
            .get_or_try_init(|| context.create_unit_of_work())
    }

    fn unit_of_work_mut(&mut self) -> RepoResult<&mut SqliteUnitOfWork> {
        self.unit_of_work()?;
        self.unit_of_work
            .get_mut()
            .ok_or(RepoError::NotStarted(NOT_STARTED))
    }

    fn find_page(&self, query: Query) -> RepoResult<Option<Page>> {
        Ok(self
            .unit_of_work()?
            .find_one::<PageEntity>(&query)?
            .map(Page::from))
    }

    fn find_pages(&self, query: Query) -> RepoResult<Vec<Page>> {
        Ok(self
            .unit_of_work()?
            .query::<PageEntity>(&query)?
            .into_iter()
            .map(Page::from)
            .collect())
    }

    fn find_content(&self, query: Query) -> RepoResult<Option<PageContent>> {
        let uow = self.unit_of_work()?;
        match uow.find_one::<PageContentEntity>(&query)? {
            Some(entity) => Ok(Some(attach_page(uow, entity, &mut HashMap::new())?)),
            None => Ok(None),
        }
    }

    fn find_contents(&self, query: Query) -> RepoResult<Vec<PageContent>> {
        let uow = self.unit_of_work()?;
        let mut pages = HashMap::new();
        uow.query::<PageContentEntity>(&query)?
            .into_iter()
            .map(|entity| attach_page(uow, entity, &mut pages))
            .collect()
    }

    fn find_user(&self, filter: Filter) -> RepoResult<Option<User>> {
        Ok(self
            .unit_of_work()?
            .find_one::<UserEntity>(&Query::filter(filter))?
            .map(User::from))
    }

    fn remove_by_key<E: Entity>(&mut self, key: E::Key) -> RepoResult<()> {
        let removed = self
            .unit_of_work_mut()?
            .apply(|uow| uow.remove::<E>(&key))?;
        if !removed {
            info!(
                "event=delete module=repo status=noop table={} key={:?}",
                E::TABLE,
                key
            );
        }
        Ok(())
    }

    fn remove_every<E: Entity>(&mut self) -> RepoResult<()> {
        self.unit_of_work_mut()?
            .apply(|uow| uow.remove_all::<E>(&Query::all()))?;
        Ok(())
    }

    fn upgrade_schema(&self, settings: &ApplicationSettings) -> RepoResult<()> {
        let context = self.context()?;
        let mut conn = context.open_admin_connection(&settings.connection_string)?;
        schema::upgrade(&mut conn, settings.data_store_type)?;
        Ok(())
    }
}

/// Maps one content entity, loading its owning page once per call.
fn attach_page(
    uow: &SqliteUnitOfWork,
    entity: PageContentEntity,
    pages: &mut HashMap<PageId, Page>,
) -> RepoResult<PageContent> {
    let page = match pages.get(&entity.page_id) {
        Some(page) => page.clone(),
        None => {
            let page = uow
                .find_by_id::<PageEntity>(&entity.page_id)?
                .map(Page::from)
                .ok_or_else(|| {
                    RepoError::InvalidData(format!(
                        "page content {} references missing page {}",
                        entity.id, entity.page_id
                    ))
                })?;
            pages.insert(entity.page_id, page.clone());
            page
        }
    };
    Ok(page_content_from_entity(entity, page))
}

fn new_content_entity(
    page_id: PageId,
    text: &str,
    edited_by: &str,
    edited_on: i64,
    version_number: i32,
) -> PageContentEntity {
    PageContentEntity {
        id: Uuid::new_v4(),
        page_id,
        text: text.to_string(),
        edited_by: edited_by.to_string(),
        edited_on,
        version_number,
    }
}

fn tag_like_command(tag: &str) -> RawCommand {
    // Column names are case sensitive on this engine.
    RawCommand::new(format!(
        "SELECT {} FROM {} WHERE {UNICODE_LOWER_FN}(tags) LIKE ?1 ESCAPE '\\'",
        PageEntity::COLUMNS.join(", "),
        PageEntity::TABLE
    ))
    .bind(Value::Text(format!("%{}%", escape_like(&tag.to_lowercase()))))
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

impl WikiRepository for SqliteWikiRepository {
    fn get_page_by_id(&self, id: PageId) -> RepoResult<Option<Page>> {
        Ok(self
            .unit_of_work()?
            .find_by_id::<PageEntity>(&id)?
            .map(Page::from))
    }

    fn get_page_by_title(&self, title: &str) -> RepoResult<Option<Page>> {
        self.find_page(Query::filter(Filter::text("title", title)))
    }

    fn all_pages(&self) -> RepoResult<Vec<Page>> {
        self.find_pages(Query::all())
    }

    fn find_pages_created_by(&self, username: &str) -> RepoResult<Vec<Page>> {
        self.find_pages(Query::filter(Filter::text("created_by", username)))
    }

    fn find_pages_modified_by(&self, username: &str) -> RepoResult<Vec<Page>> {
        self.find_pages(Query::filter(Filter::text("modified_by", username)))
    }

    fn find_pages_containing_tag(&self, tag: &str) -> RepoResult<Vec<Page>> {
        let uow = self.unit_of_work()?;
        let entities = match self.settings.data_store_type.tag_search_path() {
            TagSearchPath::Generic => {
                uow.query::<PageEntity>(&Query::filter(Filter::contains_ignore_case("tags", tag)))?
            }
            TagSearchPath::RawLike => uow.find_by_sql::<PageEntity>(&tag_like_command(tag))?,
        };
        Ok(entities.into_iter().map(Page::from).collect())
    }

    fn all_tags(&self) -> RepoResult<Vec<String>> {
        Ok(self
            .find_pages(Query::all())?
            .into_iter()
            .map(|page| page.tags)
            .collect())
    }

    fn add_new_page(
        &mut self,
        page: &Page,
        text: &str,
        edited_by: &str,
        edited_on: i64,
    ) -> RepoResult<PageContent> {
        let uow = self.unit_of_work_mut()?;
        let (page_entity, content_entity) = uow.apply(|uow| {
            let mut page_entity = PageEntity::from(page);
            page_entity.id = 0;
            uow.add(&mut page_entity)?;

            let mut content_entity =
                new_content_entity(page_entity.id, text, edited_by, edited_on, 1);
            uow.add(&mut content_entity)?;
            Ok((page_entity, content_entity))
        })?;

        Ok(page_content_from_entity(
            content_entity,
            Page::from(page_entity),
        ))
    }

    fn add_new_page_content_version(
        &mut self,
        page: &Page,
        text: &str,
        edited_by: &str,
        edited_on: i64,
        version: i32,
    ) -> RepoResult<Option<PageContent>> {
        let uow = self.unit_of_work_mut()?;
        let Some(page_entity) = uow.find_by_id::<PageEntity>(&page.id)? else {
            error!(
                "event=page_content_append module=repo status=error error_code=page_not_found page_id={}",
                page.id
            );
            return Ok(None);
        };

        let content_entity = uow.apply(|uow| {
            let mut content_entity =
                new_content_entity(page_entity.id, text, edited_by, edited_on, version);
            uow.add(&mut content_entity)?;
            Ok(content_entity)
        })?;

        Ok(Some(page_content_from_entity(
            content_entity,
            Page::from(page_entity),
        )))
    }

    fn save_or_update_page(&mut self, page: &Page) -> RepoResult<()> {
        self.unit_of_work_mut()?.apply(|uow| {
            match uow.find_by_id::<PageEntity>(&page.id)? {
                Some(mut entity) => {
                    apply_page_to_entity(page, &mut entity);
                    uow.update(&entity)?;
                }
                None => {
                    let mut entity = PageEntity::from(page);
                    uow.add(&mut entity)?;
                }
            }
            Ok(())
        })
    }

    fn update_page_with_new_version(
        &mut self,
        page: &Page,
        text: &str,
        edited_by: &str,
        edited_on: i64,
        version: i32,
    ) -> RepoResult<Option<PageContent>> {
        let uow = self.unit_of_work_mut()?;
        let Some(mut page_entity) = uow.find_by_id::<PageEntity>(&page.id)? else {
            error!(
                "event=page_update module=repo status=error error_code=page_not_found page_id={}",
                page.id
            );
            return Ok(None);
        };

        let content_entity = uow.apply(|uow| {
            apply_page_to_entity(page, &mut page_entity);
            uow.update(&page_entity)?;

            let mut content_entity =
                new_content_entity(page_entity.id, text, edited_by, edited_on, version);
            uow.add(&mut content_entity)?;
            Ok(content_entity)
        })?;

        Ok(Some(page_content_from_entity(
            content_entity,
            Page::from(page_entity),
        )))
    }

    fn delete_page(&mut self, id: PageId) -> RepoResult<()> {
        self.remove_by_key::<PageEntity>(id)
    }

    fn delete_all_pages(&mut self) -> RepoResult<()> {
        self.remove_every::<PageEntity>()
    }

    fn get_latest_page_content(&self, page_id: PageId) -> RepoResult<Option<PageContent>> {
        self.find_content(
            Query::filter(Filter::int("page_id", page_id))
                .order_by("edited_on", Direction::Desc)
                .order_by("version_number", Direction::Desc),
        )
    }

    fn get_page_content_by_id(&self, id: PageContentId) -> RepoResult<Option<PageContent>> {
        let uow = self.unit_of_work()?;
        match uow.find_by_id::<PageContentEntity>(&id)? {
            Some(entity) => Ok(Some(attach_page(uow, entity, &mut HashMap::new())?)),
            None => Ok(None),
        }
    }

    fn get_page_content_by_version_id(
        &self,
        version_id: PageContentId,
    ) -> RepoResult<Option<PageContent>> {
        self.get_page_content_by_id(version_id)
    }

    fn get_page_content_by_page_id_and_version_number(
        &self,
        page_id: PageId,
        version_number: i32,
    ) -> RepoResult<Option<PageContent>> {
        self.find_content(Query::filter(
            Filter::int("page_id", page_id)
                .and(Filter::int("version_number", i64::from(version_number))),
        ))
    }

    fn get_page_content_by_edited_by(&self, username: &str) -> RepoResult<Option<PageContent>> {
        self.find_content(Query::filter(Filter::text("edited_by", username)))
    }

    fn find_page_contents_by_page_id(&self, page_id: PageId) -> RepoResult<Vec<PageContent>> {
        self.find_contents(Query::filter(Filter::int("page_id", page_id)))
    }

    fn find_page_contents_edited_by(&self, username: &str) -> RepoResult<Vec<PageContent>> {
        self.find_contents(Query::filter(Filter::text("edited_by", username)))
    }

    fn all_page_contents(&self) -> RepoResult<Vec<PageContent>> {
        self.find_contents(Query::all())
    }

    fn update_page_content(&mut self, content: &PageContent) -> RepoResult<()> {
        let uow = self.unit_of_work_mut()?;
        let Some(mut entity) = uow.find_by_id::<PageContentEntity>(&content.id)? else {
            return Ok(());
        };

        uow.apply(|uow| {
            apply_page_content_to_entity(content, &mut entity);
            uow.update(&entity)?;
            Ok(())
        })
    }

    fn delete_page_content(&mut self, id: PageContentId) -> RepoResult<()> {
        self.remove_by_key::<PageContentEntity>(id)
    }

    fn delete_all_page_content(&mut self) -> RepoResult<()> {
        self.remove_every::<PageContentEntity>()
    }

    fn get_user_by_id(&self, id: UserId, is_activated: bool) -> RepoResult<Option<User>> {
        self.find_user(
            Filter::text("id", &id.to_string()).and(Filter::flag("is_activated", is_activated)),
        )
    }

    fn get_admin_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        self.find_user(Filter::text("id", &id.to_string()).and(Filter::flag("is_admin", true)))
    }

    fn get_editor_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        self.find_user(Filter::text("id", &id.to_string()).and(Filter::flag("is_editor", true)))
    }

    fn get_user_by_activation_key(&self, key: &str) -> RepoResult<Option<User>> {
        self.find_user(
            Filter::text("activation_key", key).and(Filter::flag("is_activated", false)),
        )
    }

    fn get_user_by_password_reset_key(&self, key: &str) -> RepoResult<Option<User>> {
        self.find_user(Filter::text("password_reset_key", key))
    }

    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.find_user(Filter::text("username", username))
    }

    fn get_user_by_email(&self, email: &str, is_activated: bool) -> RepoResult<Option<User>> {
        self.find_user(
            Filter::text("email", email).and(Filter::flag("is_activated", is_activated)),
        )
    }

    fn get_user_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> RepoResult<Option<User>> {
        self.find_user(Filter::text("username", username).or(Filter::text("email", email)))
    }

    fn find_users_by_role(&self, role: UserRole) -> RepoResult<Vec<User>> {
        let column = match role {
            UserRole::Admin => "is_admin",
            UserRole::Editor => "is_editor",
        };
        Ok(self
            .unit_of_work()?
            .query::<UserEntity>(&Query::filter(Filter::flag(column, true)))?
            .into_iter()
            .map(User::from)
            .collect())
    }

    fn save_or_update_user(&mut self, user: &User) -> RepoResult<()> {
        self.unit_of_work_mut()?.apply(|uow| {
            match uow.find_by_id::<UserEntity>(&user.id)? {
                Some(mut entity) => {
                    apply_user_to_entity(user, &mut entity);
                    uow.update(&entity)?;
                }
                None => {
                    let mut entity = UserEntity::from(user);
                    uow.add(&mut entity)?;
                }
            }
            Ok(())
        })
    }

    fn delete_user(&mut self, id: UserId) -> RepoResult<()> {
        self.remove_by_key::<UserEntity>(id)
    }

    fn delete_all_users(&mut self) -> RepoResult<()> {
        self.remove_every::<UserEntity>()
    }

    fn get_site_preferences(&self) -> RepoResult<SitePreferences> {
        let context = self.context()?;
        if let Some(preferences) = context.cached_preferences() {
            return Ok(preferences);
        }

        match self
            .unit_of_work()?
            .find_one::<SitePreferencesEntity>(&Query::all())?
        {
            Some(entity) => {
                let preferences = SitePreferences::load_from_json(&entity.content)?;
                context.cache_preferences(&preferences);
                Ok(preferences)
            }
            None => {
                warn!(
                    "event=site_preferences_load module=repo status=default reason=not_found"
                );
                Ok(SitePreferences::default())
            }
        }
    }

    fn save_site_preferences(&mut self, preferences: &SitePreferences) -> RepoResult<()> {
        let content = preferences.to_json()?;
        let version = core_version().to_string();

        self.unit_of_work_mut()?.apply(|uow| {
            match uow.find_one::<SitePreferencesEntity>(&Query::all())? {
                Some(mut entity) => {
                    entity.content = content;
                    entity.version = version;
                    uow.update(&entity)?;
                }
                None => {
                    let mut entity = SitePreferencesEntity {
                        id: Uuid::new_v4(),
                        content,
                        version,
                    };
                    uow.add(&mut entity)?;
                }
            }
            Ok(())
        })?;

        self.context()?.cache_preferences(preferences);
        Ok(())
    }

    fn startup(
        &mut self,
        data_store_type: DataStoreType,
        connection_string: &str,
        enable_cache: bool,
    ) -> RepoResult<()> {
        if connection_string.trim().is_empty() {
            warn!("event=store_startup module=repo status=skipped reason=empty_connection_string");
            return Ok(());
        }

        let context = StoreContext::new(data_store_type, connection_string, enable_cache)?;
        self.context = Some(Arc::new(context));
        self.unit_of_work = OnceCell::new();
        Ok(())
    }

    fn install(&self, data_store_type: DataStoreType, connection_string: &str) -> RepoResult<()> {
        let context = self.context()?;
        let mut conn = context.open_admin_connection(connection_string)?;
        schema::drop(&mut conn, data_store_type)?;
        schema::create(&mut conn, data_store_type)?;
        context.clear_preferences_cache();

        info!(
            "event=install module=repo status=ok data_store={}",
            data_store_type.name()
        );
        Ok(())
    }

    fn test(&self, data_store_type: DataStoreType, connection_string: &str) -> RepoResult<()> {
        let context = self.context()?;
        match context.probe(connection_string) {
            Ok(()) => {
                info!(
                    "event=connection_test module=repo status=ok data_store={}",
                    data_store_type.name()
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=connection_test module=repo status=error data_store={} error={}",
                    data_store_type.name(),
                    err
                );
                Err(err)
            }
        }
    }

    fn upgrade(&mut self, settings: &ApplicationSettings) -> RepoResult<()> {
        if let Err(err) = self.upgrade_schema(settings) {
            error!("event=upgrade module=repo status=error step=schema error={err}");
            return Err(RepoError::Upgrade {
                message: "a problem occurred upgrading the database schema",
                source: Box::new(err),
            });
        }

        if let Err(err) = self.save_site_preferences(&SitePreferences::default()) {
            error!("event=upgrade module=repo status=error step=site_preferences error={err}");
            return Err(RepoError::Upgrade {
                message: "a problem occurred saving the site preferences",
                source: Box::new(err),
            });
        }

        info!(
            "event=upgrade module=repo status=ok version={}",
            core_version()
        );
        Ok(())
    }

    fn dispose(self) -> RepoResult<()> {
        if let Some(mut uow) = self.unit_of_work.into_inner() {
            uow.save_changes()?;
        }
        Ok(())
    }
}
