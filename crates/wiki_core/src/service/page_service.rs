//! Page use-case service.
//!
//! # Responsibility
//! - Provide the page operations an API controller needs: list, get,
//!   add, update, delete, tag lookups.
//! - Normalize raw tag input before it reaches the repository.
//!
//! # Invariants
//! - `update_page` never rewrites an existing content version; it appends the
//!   next version number.
//! - Stored tag strings are trimmed, deduplicated case-insensitively and
//!   joined with `", "`.

use crate::model::page::{Page, PageId};
use crate::repo::wiki_repo::{RepoError, WikiRepository};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

static TAG_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,;]+").expect("valid tag separator regex"));

/// Service error for page use-cases.
#[derive(Debug)]
pub enum PageServiceError {
    /// Title is blank after trimming.
    InvalidTitle,
    /// Target page does not exist.
    PageNotFound(PageId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// The page already holds the highest representable version number.
    VersionOverflow(PageId),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for PageServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "page title cannot be empty"),
            Self::PageNotFound(id) => write!(f, "page not found: {id}"),
            Self::VersionOverflow(id) => {
                write!(f, "page {id} cannot take another content version")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent page state: {details}"),
        }
    }
}

impl Error for PageServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for PageServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type PageServiceResult<T> = Result<T, PageServiceError>;

/// View model exchanged with API/UI callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageView {
    pub id: PageId,
    pub title: String,
    /// Tags as typed by the editor.
    pub raw_tags: String,
    /// Latest content text; empty when not loaded.
    pub content: String,
    pub created_by: String,
    pub created_on: i64,
    pub modified_by: String,
    pub modified_on: i64,
    pub is_locked: bool,
    /// Latest content version; 0 when not loaded.
    pub version_number: i32,
}

impl PageView {
    /// Builds a view of page metadata without content.
    pub fn from_page(page: &Page) -> Self {
        Self {
            id: page.id,
            title: page.title.clone(),
            raw_tags: page.tags.clone(),
            content: String::new(),
            created_by: page.created_by.clone(),
            created_on: page.created_on,
            modified_by: page.modified_by.clone(),
            modified_on: page.modified_on,
            is_locked: page.is_locked,
            version_number: 0,
        }
    }

    /// Parsed tag list.
    pub fn tags(&self) -> Vec<String> {
        parse_tags(&self.raw_tags)
    }
}

/// Page service facade over repository implementations.
pub struct PageService<R: WikiRepository> {
    repo: R,
}

impl<R: WikiRepository> PageService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Gives access to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Releases the service and returns its repository.
    pub fn into_repository(self) -> R {
        self.repo
    }

    /// Lists every page without loading content.
    pub fn all_pages(&self) -> PageServiceResult<Vec<PageView>> {
        Ok(self
            .repo
            .all_pages()?
            .iter()
            .map(PageView::from_page)
            .collect())
    }

    /// Gets one page, optionally with its latest content.
    pub fn get_by_id(&self, id: PageId, load_content: bool) -> PageServiceResult<Option<PageView>> {
        let Some(page) = self.repo.get_page_by_id(id)? else {
            return Ok(None);
        };

        let mut view = PageView::from_page(&page);
        if load_content {
            if let Some(content) = self.repo.get_latest_page_content(id)? {
                view.content = content.text;
                view.version_number = content.version_number;
            }
        }
        Ok(Some(view))
    }

    /// Creates a page and its first content version.
    pub fn add_page(&mut self, model: &PageView, editor: &str) -> PageServiceResult<PageView> {
        let title = model.title.trim();
        if title.is_empty() {
            return Err(PageServiceError::InvalidTitle);
        }

        let now = now_epoch_ms();
        let page = Page {
            id: 0,
            title: title.to_string(),
            tags: join_tags(&parse_tags(&model.raw_tags)),
            created_by: editor.to_string(),
            created_on: now,
            modified_by: editor.to_string(),
            modified_on: now,
            is_locked: model.is_locked,
        };

        let content = self.repo.add_new_page(&page, &model.content, editor, now)?;
        self.get_by_id(content.page.id, true)?
            .ok_or(PageServiceError::InconsistentState(
                "created page not found in read-back",
            ))
    }

    /// Updates page metadata and appends the next content version in one
    /// commit.
    pub fn update_page(&mut self, model: &PageView, editor: &str) -> PageServiceResult<PageView> {
        let title = model.title.trim();
        if title.is_empty() {
            return Err(PageServiceError::InvalidTitle);
        }

        let existing = self
            .repo
            .get_page_by_id(model.id)?
            .ok_or(PageServiceError::PageNotFound(model.id))?;

        let highest_version = self
            .repo
            .find_page_contents_by_page_id(existing.id)?
            .iter()
            .map(|content| content.version_number)
            .max();
        let next_version = match highest_version {
            Some(version) => version
                .checked_add(1)
                .ok_or(PageServiceError::VersionOverflow(existing.id))?,
            None => 1,
        };

        let now = now_epoch_ms();
        let page = Page {
            title: title.to_string(),
            tags: join_tags(&parse_tags(&model.raw_tags)),
            modified_by: editor.to_string(),
            modified_on: now,
            is_locked: model.is_locked,
            ..existing
        };
        self.repo
            .update_page_with_new_version(&page, &model.content, editor, now, next_version)?
            .ok_or(PageServiceError::PageNotFound(page.id))?;

        self.get_by_id(page.id, true)?
            .ok_or(PageServiceError::InconsistentState(
                "updated page not found in read-back",
            ))
    }

    /// Deletes a page together with all of its content versions.
    pub fn delete_page(&mut self, id: PageId) -> PageServiceResult<()> {
        for content in self.repo.find_page_contents_by_page_id(id)? {
            self.repo.delete_page_content(content.id)?;
        }
        self.repo.delete_page(id)?;
        Ok(())
    }

    /// Lists pages whose tag string contains `tag` (case-insensitive).
    pub fn find_by_tag(&self, tag: &str) -> PageServiceResult<Vec<PageView>> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .repo
            .find_pages_containing_tag(tag)?
            .iter()
            .map(PageView::from_page)
            .collect())
    }

    /// Returns every distinct tag across all pages, lowercased and sorted.
    pub fn all_tags(&self) -> PageServiceResult<Vec<String>> {
        let mut unique = BTreeSet::new();
        for raw in self.repo.all_tags()? {
            for tag in parse_tags(&raw) {
                unique.insert(tag.to_lowercase());
            }
        }
        Ok(unique.into_iter().collect())
    }
}

/// Splits a raw tag string on `,`/`;`, trimming and dropping duplicates.
///
/// Duplicates are detected case-insensitively; the first spelling wins.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut tags = Vec::new();
    for part in TAG_SEPARATOR_RE.split(raw) {
        let tag = part.trim();
        if tag.is_empty() {
            continue;
        }
        if seen.insert(tag.to_lowercase()) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Joins tags into the stored raw form.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
