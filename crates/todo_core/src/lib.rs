//! Core of the todo list application.
//!
//! Owns the authoritative order store for each owner's todo collection and
//! the client-side coordinator that reorders a cached page optimistically.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reorder;
pub mod repo;
pub mod service;

pub use api::todo_api::ApiResponse;
pub use config::ReorderConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::todo::{
    NewTodo, Todo, TodoId, TodoPatch, TodoPriority, TodoStatus, TodoValidationError,
};
pub use reorder::cache::{CachedPage, InMemoryPageCache, PageCache};
pub use reorder::coordinator::{MoveOutcome, PendingMove, ReorderBlock, ReorderCoordinator};
pub use reorder::notify::{LogNotifier, Notification, Notifier, RecordingNotifier};
pub use reorder::transport::{RelocationTransport, ReorderError, StoreTransport};
pub use repo::todo_repo::{
    RepoError, RepoResult, SortDirection, SortField, SqliteTodoRepository, TodoListQuery,
    TodoPage, TodoRepository,
};
pub use service::todo_service::TodoService;

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
