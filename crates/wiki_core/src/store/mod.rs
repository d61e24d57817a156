//! Persistence boundary between the repository and SQLite.
//!
//! # Responsibility
//! - Define entity records and their field mappings.
//! - Provide the unit-of-work abstraction and the context that creates it.
//!
//! # Invariants
//! - Nothing outside this module and `repo` sees entity types.

pub mod context;
pub mod entity;
pub mod query;
pub mod unit_of_work;
