//! Domain model exposed to repository callers.
//!
//! # Responsibility
//! - Define the page, page content, user and site preference shapes.
//! - Stay free of storage identifiers other than the domain keys.
//!
//! # Invariants
//! - Every page content belongs to exactly one page.
//! - Site preferences exist at most once per store.

pub mod page;
pub mod site_preferences;
pub mod user;
