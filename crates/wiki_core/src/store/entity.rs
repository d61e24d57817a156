//! Persisted entity records and their domain mappings.
//!
//! # Responsibility
//! - Mirror table rows (`pages`, `page_contents`, `users`,
//!   `site_preferences`) as plain records.
//! - Keep domain <-> entity conversions next to the field-mapping tables
//!   that document them.
//!
//! # Invariants
//! - `Entity::COLUMNS` lists the key column first; `values()` follows the
//!   same order.
//! - Every column appears in exactly one `FieldMapping` of its table.
//! - Conversions copy identifiers unchanged in both directions.

use crate::model::page::{Page, PageContent, PageContentId, PageId};
use crate::model::user::{User, UserId};
use crate::repo::wiki_repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::Row;
use std::fmt::Debug;
use uuid::Uuid;

/// Table-backed record type handled by a unit of work.
pub trait Entity: Sized {
    type Key: Clone + Debug;

    const TABLE: &'static str;
    /// All columns, key column first.
    const COLUMNS: &'static [&'static str];

    fn key(&self) -> Self::Key;
    fn key_value(key: &Self::Key) -> Value;
    /// Column values in `COLUMNS` order.
    fn values(&self) -> Vec<Value>;
    fn from_row(row: &Row<'_>) -> RepoResult<Self>;

    /// Returns `false` when the store should generate the key on insert.
    fn has_key(&self) -> bool {
        true
    }

    /// Receives the row id generated for a keyless insert.
    fn assign_generated_key(&mut self, _rowid: i64) {}

    fn key_column() -> &'static str {
        Self::COLUMNS[0]
    }
}

/// One domain field and the column it is persisted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub field: &'static str,
    pub column: &'static str,
    /// Whether in-place updates rewrite this column.
    pub updatable: bool,
    /// Whether this is the table's key column.
    pub is_key: bool,
}

const fn key(field: &'static str, column: &'static str) -> FieldMapping {
    FieldMapping {
        field,
        column,
        updatable: false,
        is_key: true,
    }
}

/// Non-key column that is written on insert only.
const fn fixed(field: &'static str, column: &'static str) -> FieldMapping {
    FieldMapping {
        field,
        column,
        updatable: false,
        is_key: false,
    }
}

const fn column(field: &'static str, column: &'static str) -> FieldMapping {
    FieldMapping {
        field,
        column,
        updatable: true,
        is_key: false,
    }
}

// ---------------------------------------------------------------------------
// pages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntity {
    pub id: PageId,
    pub title: String,
    pub tags: String,
    pub created_by: String,
    pub created_on: i64,
    pub modified_by: String,
    pub modified_on: i64,
    pub is_locked: bool,
}

pub const PAGE_FIELD_MAP: &[FieldMapping] = &[
    key("id", "id"),
    column("title", "title"),
    column("tags", "tags"),
    column("created_by", "created_by"),
    column("created_on", "created_on"),
    column("modified_by", "modified_by"),
    column("modified_on", "modified_on"),
    column("is_locked", "is_locked"),
];

impl Entity for PageEntity {
    type Key = PageId;

    const TABLE: &'static str = "pages";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "tags",
        "created_by",
        "created_on",
        "modified_by",
        "modified_on",
        "is_locked",
    ];

    fn key(&self) -> PageId {
        self.id
    }

    fn key_value(key: &PageId) -> Value {
        Value::Integer(*key)
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.id),
            Value::Text(self.title.clone()),
            Value::Text(self.tags.clone()),
            Value::Text(self.created_by.clone()),
            Value::Integer(self.created_on),
            Value::Text(self.modified_by.clone()),
            Value::Integer(self.modified_on),
            flag_value(self.is_locked),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            tags: row.get("tags")?,
            created_by: row.get("created_by")?,
            created_on: row.get("created_on")?,
            modified_by: row.get("modified_by")?,
            modified_on: row.get("modified_on")?,
            is_locked: parse_flag(row, "pages", "is_locked")?,
        })
    }

    fn has_key(&self) -> bool {
        self.id > 0
    }

    fn assign_generated_key(&mut self, rowid: i64) {
        self.id = rowid;
    }
}

impl From<&Page> for PageEntity {
    fn from(page: &Page) -> Self {
        Self {
            id: page.id,
            title: page.title.clone(),
            tags: page.tags.clone(),
            created_by: page.created_by.clone(),
            created_on: page.created_on,
            modified_by: page.modified_by.clone(),
            modified_on: page.modified_on,
            is_locked: page.is_locked,
        }
    }
}

impl From<PageEntity> for Page {
    fn from(entity: PageEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            tags: entity.tags,
            created_by: entity.created_by,
            created_on: entity.created_on,
            modified_by: entity.modified_by,
            modified_on: entity.modified_on,
            is_locked: entity.is_locked,
        }
    }
}

/// Rewrites the updatable page columns from the domain object.
pub fn apply_page_to_entity(page: &Page, entity: &mut PageEntity) {
    entity.title.clone_from(&page.title);
    entity.tags.clone_from(&page.tags);
    entity.created_by.clone_from(&page.created_by);
    entity.created_on = page.created_on;
    entity.modified_by.clone_from(&page.modified_by);
    entity.modified_on = page.modified_on;
    entity.is_locked = page.is_locked;
}

// ---------------------------------------------------------------------------
// page_contents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContentEntity {
    pub id: PageContentId,
    pub page_id: PageId,
    pub text: String,
    pub edited_by: String,
    pub edited_on: i64,
    pub version_number: i32,
}

pub const PAGE_CONTENT_FIELD_MAP: &[FieldMapping] = &[
    key("id", "id"),
    fixed("page", "page_id"),
    column("text", "text"),
    column("edited_by", "edited_by"),
    column("edited_on", "edited_on"),
    column("version_number", "version_number"),
];

impl Entity for PageContentEntity {
    type Key = PageContentId;

    const TABLE: &'static str = "page_contents";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "page_id",
        "text",
        "edited_by",
        "edited_on",
        "version_number",
    ];

    fn key(&self) -> PageContentId {
        self.id
    }

    fn key_value(key: &PageContentId) -> Value {
        Value::Text(key.to_string())
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.id.to_string()),
            Value::Integer(self.page_id),
            Value::Text(self.text.clone()),
            Value::Text(self.edited_by.clone()),
            Value::Integer(self.edited_on),
            Value::Integer(i64::from(self.version_number)),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: parse_uuid(row, "page_contents", "id")?,
            page_id: row.get("page_id")?,
            text: row.get("text")?,
            edited_by: row.get("edited_by")?,
            edited_on: row.get("edited_on")?,
            version_number: row.get("version_number")?,
        })
    }
}

/// Builds the domain content from its entity and the owning page.
pub fn page_content_from_entity(entity: PageContentEntity, page: Page) -> PageContent {
    PageContent {
        id: entity.id,
        page,
        text: entity.text,
        edited_by: entity.edited_by,
        edited_on: entity.edited_on,
        version_number: entity.version_number,
    }
}

/// Rewrites the updatable content columns; the owning page never changes.
pub fn apply_page_content_to_entity(content: &PageContent, entity: &mut PageContentEntity) {
    entity.text.clone_from(&content.text);
    entity.edited_by.clone_from(&content.edited_by);
    entity.edited_on = content.edited_on;
    entity.version_number = content.version_number;
}

// ---------------------------------------------------------------------------
// users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntity {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub password: String,
    pub salt: String,
    pub is_activated: bool,
    pub is_admin: bool,
    pub is_editor: bool,
    pub activation_key: Option<String>,
    pub password_reset_key: Option<String>,
}

pub const USER_FIELD_MAP: &[FieldMapping] = &[
    key("id", "id"),
    column("username", "username"),
    column("email", "email"),
    column("firstname", "firstname"),
    column("lastname", "lastname"),
    column("password", "password"),
    column("salt", "salt"),
    column("is_activated", "is_activated"),
    column("is_admin", "is_admin"),
    column("is_editor", "is_editor"),
    column("activation_key", "activation_key"),
    column("password_reset_key", "password_reset_key"),
];

impl Entity for UserEntity {
    type Key = UserId;

    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "username",
        "email",
        "firstname",
        "lastname",
        "password",
        "salt",
        "is_activated",
        "is_admin",
        "is_editor",
        "activation_key",
        "password_reset_key",
    ];

    fn key(&self) -> UserId {
        self.id
    }

    fn key_value(key: &UserId) -> Value {
        Value::Text(key.to_string())
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.id.to_string()),
            Value::Text(self.username.clone()),
            Value::Text(self.email.clone()),
            Value::Text(self.firstname.clone()),
            Value::Text(self.lastname.clone()),
            Value::Text(self.password.clone()),
            Value::Text(self.salt.clone()),
            flag_value(self.is_activated),
            flag_value(self.is_admin),
            flag_value(self.is_editor),
            optional_text(self.activation_key.as_deref()),
            optional_text(self.password_reset_key.as_deref()),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: parse_uuid(row, "users", "id")?,
            username: row.get("username")?,
            email: row.get("email")?,
            firstname: row.get("firstname")?,
            lastname: row.get("lastname")?,
            password: row.get("password")?,
            salt: row.get("salt")?,
            is_activated: parse_flag(row, "users", "is_activated")?,
            is_admin: parse_flag(row, "users", "is_admin")?,
            is_editor: parse_flag(row, "users", "is_editor")?,
            activation_key: row.get("activation_key")?,
            password_reset_key: row.get("password_reset_key")?,
        })
    }
}

impl From<&User> for UserEntity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            firstname: user.firstname.clone(),
            lastname: user.lastname.clone(),
            password: user.password.clone(),
            salt: user.salt.clone(),
            is_activated: user.is_activated,
            is_admin: user.is_admin,
            is_editor: user.is_editor,
            activation_key: user.activation_key.clone(),
            password_reset_key: user.password_reset_key.clone(),
        }
    }
}

impl From<UserEntity> for User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            username: entity.username,
            email: entity.email,
            firstname: entity.firstname,
            lastname: entity.lastname,
            password: entity.password,
            salt: entity.salt,
            is_activated: entity.is_activated,
            is_admin: entity.is_admin,
            is_editor: entity.is_editor,
            activation_key: entity.activation_key,
            password_reset_key: entity.password_reset_key,
        }
    }
}

/// Rewrites every account column except the id.
pub fn apply_user_to_entity(user: &User, entity: &mut UserEntity) {
    entity.username.clone_from(&user.username);
    entity.email.clone_from(&user.email);
    entity.firstname.clone_from(&user.firstname);
    entity.lastname.clone_from(&user.lastname);
    entity.password.clone_from(&user.password);
    entity.salt.clone_from(&user.salt);
    entity.is_activated = user.is_activated;
    entity.is_admin = user.is_admin;
    entity.is_editor = user.is_editor;
    entity.activation_key.clone_from(&user.activation_key);
    entity.password_reset_key.clone_from(&user.password_reset_key);
}

// ---------------------------------------------------------------------------
// site_preferences
// ---------------------------------------------------------------------------

/// Singleton row holding the serialized preferences document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePreferencesEntity {
    pub id: Uuid,
    /// JSON produced by `SitePreferences::to_json`.
    pub content: String,
    /// Application version that last wrote `content`.
    pub version: String,
}

impl Entity for SitePreferencesEntity {
    type Key = Uuid;

    const TABLE: &'static str = "site_preferences";
    const COLUMNS: &'static [&'static str] = &["id", "content", "version"];

    fn key(&self) -> Uuid {
        self.id
    }

    fn key_value(key: &Uuid) -> Value {
        Value::Text(key.to_string())
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.id.to_string()),
            Value::Text(self.content.clone()),
            Value::Text(self.version.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: parse_uuid(row, "site_preferences", "id")?,
            content: row.get("content")?,
            version: row.get("version")?,
        })
    }
}

fn flag_value(value: bool) -> Value {
    Value::Integer(if value { 1 } else { 0 })
}

fn optional_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

fn parse_flag(row: &Row<'_>, table: &str, column: &str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {table}.{column}"
        ))),
    }
}

fn parse_uuid(row: &Row<'_>, table: &str, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{text}` in {table}.{column}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeSet;

    fn serialized_fields<T: Serialize>(value: &T) -> BTreeSet<String> {
        match serde_json::to_value(value).expect("domain value should serialize") {
            serde_json::Value::Object(map) => map.keys().cloned().collect(),
            other => panic!("expected object, got {other}"),
        }
    }

    fn assert_map_complete<E: Entity, T: Serialize>(map: &[FieldMapping], domain: &T) {
        let mapped_columns: BTreeSet<&str> = map.iter().map(|m| m.column).collect();
        let entity_columns: BTreeSet<&str> = E::COLUMNS.iter().copied().collect();
        assert_eq!(mapped_columns, entity_columns, "{} columns", E::TABLE);
        assert_eq!(map.len(), E::COLUMNS.len(), "{} has duplicates", E::TABLE);

        let keys: Vec<&str> = map.iter().filter(|m| m.is_key).map(|m| m.column).collect();
        assert_eq!(keys, vec![E::key_column()], "{} key column", E::TABLE);
        assert!(
            map.iter().all(|m| !(m.is_key && m.updatable)),
            "{} key must not be updatable",
            E::TABLE
        );

        let mapped_fields: BTreeSet<String> = map.iter().map(|m| m.field.to_string()).collect();
        assert_eq!(mapped_fields, serialized_fields(domain), "{} fields", E::TABLE);
    }

    /// Checks that exactly the updatable columns differ between two entities.
    fn assert_updates_match_map<E: Entity>(map: &[FieldMapping], before: &E, after: &E) {
        let before_values = before.values();
        let after_values = after.values();
        for (index, column) in E::COLUMNS.iter().enumerate() {
            let mapping = map
                .iter()
                .find(|m| m.column == *column)
                .expect("column should be mapped");
            let changed = before_values[index] != after_values[index];
            assert_eq!(
                changed, mapping.updatable,
                "{}.{} changed={changed}",
                E::TABLE, column
            );
        }
    }

    fn sample_page() -> Page {
        Page {
            id: 4,
            title: "Hello world".to_string(),
            tags: "tag1, tag2".to_string(),
            created_by: "admin".to_string(),
            created_on: 1_000,
            modified_by: "editor".to_string(),
            modified_on: 2_000,
            is_locked: true,
        }
    }

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "editor".to_string(),
            email: "editor@example.com".to_string(),
            firstname: "Ed".to_string(),
            lastname: "Itor".to_string(),
            password: "hash".to_string(),
            salt: "salt".to_string(),
            is_activated: true,
            is_admin: true,
            is_editor: true,
            activation_key: Some("activate".to_string()),
            password_reset_key: Some("reset".to_string()),
        }
    }

    #[test]
    fn page_field_map_covers_entity_and_domain() {
        assert_map_complete::<PageEntity, _>(PAGE_FIELD_MAP, &sample_page());
    }

    #[test]
    fn page_content_field_map_covers_entity_and_domain() {
        let content = PageContent {
            id: Uuid::new_v4(),
            page: sample_page(),
            text: "body".to_string(),
            edited_by: "editor".to_string(),
            edited_on: 3_000,
            version_number: 2,
        };
        assert_map_complete::<PageContentEntity, _>(PAGE_CONTENT_FIELD_MAP, &content);
    }

    #[test]
    fn user_field_map_covers_entity_and_domain() {
        assert_map_complete::<UserEntity, _>(USER_FIELD_MAP, &sample_user());
    }

    #[test]
    fn apply_page_rewrites_only_updatable_columns() {
        let before = PageEntity {
            id: 4,
            title: "old".to_string(),
            tags: String::new(),
            created_by: "someone".to_string(),
            created_on: 1,
            modified_by: "someone".to_string(),
            modified_on: 1,
            is_locked: false,
        };
        let mut after = before.clone();
        let mut page = sample_page();
        page.id = 99;
        apply_page_to_entity(&page, &mut after);

        assert_updates_match_map(PAGE_FIELD_MAP, &before, &after);
    }

    #[test]
    fn apply_page_content_keeps_identity_and_owner() {
        let before = PageContentEntity {
            id: Uuid::new_v4(),
            page_id: 1,
            text: "v1".to_string(),
            edited_by: "a".to_string(),
            edited_on: 1,
            version_number: 1,
        };
        let mut after = before.clone();
        let mut page = sample_page();
        page.id = 2;
        let content = PageContent {
            id: Uuid::new_v4(),
            page,
            text: "v2".to_string(),
            edited_by: "b".to_string(),
            edited_on: 2,
            version_number: 2,
        };
        apply_page_content_to_entity(&content, &mut after);

        assert_updates_match_map(PAGE_CONTENT_FIELD_MAP, &before, &after);
    }

    #[test]
    fn apply_user_rewrites_everything_but_id() {
        let before = UserEntity {
            id: Uuid::new_v4(),
            username: "old".to_string(),
            email: "old@example.com".to_string(),
            firstname: String::new(),
            lastname: String::new(),
            password: String::new(),
            salt: String::new(),
            is_activated: false,
            is_admin: false,
            is_editor: false,
            activation_key: None,
            password_reset_key: None,
        };
        let mut after = before.clone();
        apply_user_to_entity(&sample_user(), &mut after);

        assert_updates_match_map(USER_FIELD_MAP, &before, &after);
    }

    #[test]
    fn conversions_preserve_identifiers() {
        let page = sample_page();
        assert_eq!(Page::from(PageEntity::from(&page)), page);

        let user = sample_user();
        assert_eq!(User::from(UserEntity::from(&user)), user);
    }
}
