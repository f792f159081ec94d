//! JSON request/response handlers for the todo REST endpoints.
//!
//! # Responsibility
//! - Map `GET/POST/PATCH/DELETE /todos` exchanges onto `TodoService`.
//! - Translate repository errors into HTTP-style status codes with a
//!   human-readable `message` body.
//!
//! # Invariants
//! - Unknown or malformed todo ids answer `404 {"message": "Todo not found"}`.
//! - Handlers never panic; every failure becomes an `ApiResponse`.

use crate::model::todo::{NewTodo, TodoId, TodoPatch, TodoStatus};
use crate::repo::todo_repo::{RepoError, SortDirection, SortField, TodoListQuery, TodoRepository};
use crate::service::todo_service::TodoService;
use serde::Serialize;
use serde_json::{json, Value};

pub const TODO_NOT_FOUND_MESSAGE: &str = "Todo not found";
pub const TODO_DELETED_MESSAGE: &str = "Todo deleted successfully";

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Status code plus JSON body, as a transport would carry it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn json(status: u16, payload: &impl Serialize) -> Self {
        match serde_json::to_value(payload) {
            Ok(body) => Self { status, body },
            Err(err) => Self::with_message(
                STATUS_INTERNAL_ERROR,
                format!("cannot encode response: {err}"),
            ),
        }
    }

    fn with_message(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "message": message.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Server-provided `message`, when the body carries one.
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

impl From<RepoError> for ApiResponse {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(_) => {
                Self::with_message(STATUS_NOT_FOUND, TODO_NOT_FOUND_MESSAGE)
            }
            RepoError::OutOfRange { .. } | RepoError::Validation(_) => {
                Self::with_message(STATUS_BAD_REQUEST, err.to_string())
            }
            other => Self::with_message(STATUS_INTERNAL_ERROR, other.to_string()),
        }
    }
}

/// `GET /todos` with an already-parsed query.
pub fn list<R: TodoRepository>(service: &TodoService<R>, query: &TodoListQuery) -> ApiResponse {
    match service.list_todos(query) {
        Ok(page) => ApiResponse::json(STATUS_OK, &page),
        Err(err) => err.into(),
    }
}

/// `GET /todos?...` with raw query-string pairs.
pub fn list_with_params<R: TodoRepository>(
    service: &TodoService<R>,
    params: &[(&str, &str)],
) -> ApiResponse {
    match parse_list_params(params) {
        Ok(query) => list(service, &query),
        Err(message) => ApiResponse::with_message(STATUS_BAD_REQUEST, message),
    }
}

/// `POST /todos`.
pub fn create<R: TodoRepository>(service: &TodoService<R>, body: &str) -> ApiResponse {
    let draft: NewTodo = match serde_json::from_str(body) {
        Ok(draft) => draft,
        Err(err) => return invalid_body(err),
    };
    match service.create_todo(&draft) {
        Ok(todo) => ApiResponse::json(STATUS_CREATED, &todo),
        Err(err) => err.into(),
    }
}

/// `PATCH /todos/{id}`. A body carrying `order` is the relocation request.
pub fn patch<R: TodoRepository>(service: &TodoService<R>, id: &str, body: &str) -> ApiResponse {
    let Some(id) = parse_todo_id(id) else {
        return ApiResponse::with_message(STATUS_NOT_FOUND, TODO_NOT_FOUND_MESSAGE);
    };
    let patch: TodoPatch = match serde_json::from_str(body) {
        Ok(patch) => patch,
        Err(err) => return invalid_body(err),
    };
    match service.update_todo(id, &patch) {
        Ok(todo) => ApiResponse::json(STATUS_OK, &todo),
        Err(err) => err.into(),
    }
}

/// `DELETE /todos/{id}`.
pub fn delete<R: TodoRepository>(service: &TodoService<R>, id: &str) -> ApiResponse {
    let Some(id) = parse_todo_id(id) else {
        return ApiResponse::with_message(STATUS_NOT_FOUND, TODO_NOT_FOUND_MESSAGE);
    };
    match service.delete_todo(id) {
        Ok(()) => ApiResponse::with_message(STATUS_OK, TODO_DELETED_MESSAGE),
        Err(err) => err.into(),
    }
}

/// Builds a relocation request body: `{"order": <n>}`.
pub fn relocation_body(new_order: i64) -> String {
    json!({ "order": new_order }).to_string()
}

/// Parses `page`, `limit`, `status`, `search`, `sortBy`, `sortOrder`.
///
/// Unknown keys are ignored; empty values fall back to defaults.
pub fn parse_list_params(params: &[(&str, &str)]) -> Result<TodoListQuery, String> {
    let mut query = TodoListQuery::default();
    for (key, raw) in params {
        let value = raw.trim();
        if value.is_empty() {
            continue;
        }
        match *key {
            "page" => {
                query.page = value
                    .parse()
                    .map_err(|_| format!("invalid page `{value}`"))?;
            }
            "limit" => {
                query.limit = value
                    .parse()
                    .map_err(|_| format!("invalid limit `{value}`"))?;
            }
            "status" => {
                query.status = Some(
                    TodoStatus::parse(value).ok_or_else(|| format!("invalid status `{value}`"))?,
                );
            }
            "search" => query.search = Some(value.to_string()),
            "sortBy" => {
                query.sort_by =
                    SortField::parse(value).ok_or_else(|| format!("invalid sortBy `{value}`"))?;
            }
            "sortOrder" => {
                query.direction = SortDirection::parse(value)
                    .ok_or_else(|| format!("invalid sortOrder `{value}`"))?;
            }
            _ => {}
        }
    }
    Ok(query)
}

fn invalid_body(err: serde_json::Error) -> ApiResponse {
    ApiResponse::with_message(STATUS_BAD_REQUEST, format!("invalid body: {err}"))
}

fn parse_todo_id(value: &str) -> Option<TodoId> {
    TodoId::parse_str(value.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::{parse_list_params, relocation_body};
    use crate::model::todo::TodoStatus;
    use crate::repo::todo_repo::{SortDirection, SortField};

    #[test]
    fn list_params_follow_query_string_names() {
        let query = parse_list_params(&[
            ("page", "2"),
            ("limit", "5"),
            ("status", "in_progress"),
            ("search", "deploy"),
            ("sortBy", "order"),
            ("sortOrder", "asc"),
            ("unused", "x"),
        ])
        .unwrap();
        assert_eq!(query.page, 2);
        assert_eq!(query.limit, 5);
        assert_eq!(query.status, Some(TodoStatus::InProgress));
        assert_eq!(query.search.as_deref(), Some("deploy"));
        assert_eq!(query.sort_by, SortField::Order);
        assert_eq!(query.direction, SortDirection::Asc);
    }

    #[test]
    fn list_params_reject_unknown_sort_key() {
        let err = parse_list_params(&[("sortBy", "title")]).unwrap_err();
        assert!(err.contains("sortBy"));
    }

    #[test]
    fn relocation_body_carries_only_order() {
        assert_eq!(relocation_body(3), r#"{"order":3}"#);
    }
}
