//! In-process REST surface for todo collections.
//!
//! # Responsibility
//! - Own the request/response contract consumed by remote clients,
//!   including the relocation request `PATCH /todos/{id} {"order": n}`.

pub mod todo_api;
