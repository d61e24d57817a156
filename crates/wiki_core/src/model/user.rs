//! User account domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Globally unique account identifier.
pub type UserId = Uuid;

/// Role flags that can be queried for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Editor,
}

/// Wiki account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    /// Password hash; never plain text.
    pub password: String,
    pub salt: String,
    pub is_activated: bool,
    pub is_admin: bool,
    pub is_editor: bool,
    /// Set while the account waits for email activation.
    pub activation_key: Option<String>,
    /// Set while a password reset is pending.
    pub password_reset_key: Option<String>,
}

impl User {
    /// Creates an inactive account with a generated id and no roles.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            firstname: String::new(),
            lastname: String::new(),
            password: String::new(),
            salt: String::new(),
            is_activated: false,
            is_admin: false,
            is_editor: false,
            activation_key: None,
            password_reset_key: None,
        }
    }

    /// Returns whether the account carries the given role flag.
    pub fn has_role(&self, role: UserRole) -> bool {
        match role {
            UserRole::Admin => self.is_admin,
            UserRole::Editor => self.is_editor,
        }
    }
}
