//! Domain model for orderable todo collections.
//!
//! # Invariants
//! - Every todo is identified by a stable `TodoId`.
//! - Positions within one collection are dense and contiguous.

pub mod todo;
