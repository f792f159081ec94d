//! Todo use-case service.
//!
//! # Responsibility
//! - Provide stable entry points for todo CRUD, listing, and relocation.
//! - Emit metadata-only diagnostics for order-mutating operations.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/transaction contracts.
//! - Logs carry ids and positions only, never titles or descriptions.

use crate::model::todo::{NewTodo, Todo, TodoId, TodoPatch, TodoStatus};
use crate::repo::todo_repo::{RepoError, RepoResult, TodoListQuery, TodoPage, TodoRepository};
use log::{info, warn};
use std::time::Instant;

/// Use-case service wrapper over one collection's repository.
pub struct TodoService<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a todo at the end of the collection.
    pub fn create_todo(&self, draft: &NewTodo) -> RepoResult<Todo> {
        let todo = self.repo.create_todo(draft)?;
        info!(
            "event=todo_create module=service status=ok todo_id={} order={}",
            todo.id, todo.order
        );
        Ok(todo)
    }

    pub fn get_todo(&self, id: TodoId) -> RepoResult<Option<Todo>> {
        self.repo.get_todo(id)
    }

    pub fn list_todos(&self, query: &TodoListQuery) -> RepoResult<TodoPage> {
        self.repo.list_todos(query)
    }

    pub fn count_todos(&self) -> RepoResult<i64> {
        self.repo.count_todos()
    }

    /// Moves one todo to an absolute position.
    ///
    /// # Errors
    /// - `RepoError::NotFound` for an unknown id.
    /// - `RepoError::OutOfRange` when `new_order` is outside `[0, n-1]`.
    pub fn relocate(&self, id: TodoId, new_order: i64) -> RepoResult<Todo> {
        let started_at = Instant::now();
        let result = self.repo.relocate(id, new_order);
        log_write("todo_relocate", id, new_order, started_at, &result);
        result
    }

    /// Applies a partial update. An `order` field relocates atomically.
    pub fn update_todo(&self, id: TodoId, patch: &TodoPatch) -> RepoResult<Todo> {
        let started_at = Instant::now();
        let result = self.repo.update_todo(id, patch);
        log_write(
            "todo_update",
            id,
            patch.order.unwrap_or(-1),
            started_at,
            &result,
        );
        result
    }

    pub fn set_status(&self, id: TodoId, status: TodoStatus) -> RepoResult<Todo> {
        self.update_todo(id, &TodoPatch::status(status))
    }

    /// Deletes a todo and compacts later positions.
    pub fn delete_todo(&self, id: TodoId) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.repo.delete_todo(id);
        match &result {
            Ok(()) => info!(
                "event=todo_delete module=service status=ok todo_id={id} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=todo_delete module=service status=error todo_id={id} error_code={} error={err}",
                error_code(err)
            ),
        }
        result
    }
}

fn log_write(
    event: &str,
    id: TodoId,
    target_order: i64,
    started_at: Instant,
    result: &RepoResult<Todo>,
) {
    match result {
        Ok(todo) => info!(
            "event={event} module=service status=ok todo_id={id} target_order={target_order} order={} duration_ms={}",
            todo.order,
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event={event} module=service status=error todo_id={id} target_order={target_order} error_code={} error={err}",
            error_code(err)
        ),
    }
}

/// Stable machine-readable code for a repository error.
pub fn error_code(err: &RepoError) -> &'static str {
    match err {
        RepoError::Validation(_) => "validation_failed",
        RepoError::Db(_) => "db_error",
        RepoError::NotFound(_) => "not_found",
        RepoError::OutOfRange { .. } => "out_of_range",
        RepoError::UninitializedConnection { .. }
        | RepoError::MissingRequiredTable(_)
        | RepoError::MissingRequiredColumn { .. }
        | RepoError::MissingRequiredFunction(_) => "uninitialized_store",
        RepoError::InvalidData(_) => "invalid_data",
    }
}
