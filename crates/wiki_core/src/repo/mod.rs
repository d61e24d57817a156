//! Repository layer: domain-level data access over the store.
//!
//! # Responsibility
//! - Define the wiki repository contract and its error taxonomy.
//! - Isolate unit-of-work and SQL details from services.
//!
//! # Invariants
//! - Repository APIs report absence as empty results, not errors.
//! - Configuration failures (`NotStarted`) propagate unchanged.

pub mod sqlite_repo;
pub mod wiki_repo;
