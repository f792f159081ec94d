//! Repository layer: the authoritative order store.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes validate input before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `OutOfRange`) in
//!   addition to DB transport errors.

pub mod todo_repo;
