//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep wire handlers and the reorder coordinator decoupled from storage.

pub mod todo_service;
