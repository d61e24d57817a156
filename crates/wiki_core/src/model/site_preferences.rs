//! Site-wide preferences document.
//!
//! # Responsibility
//! - Hold the singleton configuration blob editable from the admin UI.
//! - Round-trip through the JSON text persisted in `site_preferences.content`.
//!
//! # Invariants
//! - Missing JSON fields fall back to `SitePreferences::default()` values, so
//!   documents written by older versions stay loadable.

use serde::{Deserialize, Serialize};

/// Singleton site configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SitePreferences {
    pub site_name: String,
    pub site_url: String,
    pub theme: String,
    /// Markup dialect used to render page bodies (`creole`, `markdown`, ...).
    pub markup_type: String,
    /// Comma separated upload extensions.
    pub allowed_file_types: String,
    pub allow_user_signup: bool,
    pub is_recaptcha_enabled: bool,
    pub recaptcha_private_key: String,
    pub recaptcha_public_key: String,
    pub overwrite_existing_files: bool,
    pub menu_markup: String,
}

impl Default for SitePreferences {
    fn default() -> Self {
        Self {
            site_name: "My wiki".to_string(),
            site_url: String::new(),
            theme: "Responsive".to_string(),
            markup_type: "creole".to_string(),
            allowed_file_types: "jpg,png,gif,zip,xml,pdf".to_string(),
            allow_user_signup: false,
            is_recaptcha_enabled: false,
            recaptcha_private_key: String::new(),
            recaptcha_public_key: String::new(),
            overwrite_existing_files: false,
            menu_markup: "* %mainpage%\n* %categories%\n* %allpages%\n* %newpage%\n* %managefiles%\n* %sitesettings%".to_string(),
        }
    }
}

impl SitePreferences {
    /// Parses a persisted preferences document.
    pub fn load_from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Serializes preferences for persistence.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
