//! Page and page content domain model.
//!
//! # Responsibility
//! - Describe wiki article metadata (`Page`) and its versioned bodies
//!   (`PageContent`).
//!
//! # Invariants
//! - `Page` never holds body text; bodies live in `PageContent`.
//! - A `PageContent` is immutable once written; edits create new versions.
//! - `PageId` 0 means "not yet persisted"; the store assigns the real id.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-assigned page identifier.
pub type PageId = i64;

/// Globally unique identifier of one content version.
pub type PageContentId = Uuid;

/// Wiki article metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub title: String,
    /// Raw tag string as typed by editors, e.g. `"tag1, tag2"`.
    pub tags: String,
    pub created_by: String,
    /// Unix epoch milliseconds.
    pub created_on: i64,
    pub modified_by: String,
    /// Unix epoch milliseconds.
    pub modified_on: i64,
    pub is_locked: bool,
}

impl Page {
    /// Creates an unsaved page with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Returns whether the store has assigned an id to this page.
    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }
}

/// One versioned revision of a page body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    pub id: PageContentId,
    /// Owning page.
    pub page: Page,
    pub text: String,
    pub edited_by: String,
    /// Unix epoch milliseconds.
    pub edited_on: i64,
    pub version_number: i32,
}
