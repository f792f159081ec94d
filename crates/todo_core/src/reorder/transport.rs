//! Relocation request transport and its error taxonomy.
//!
//! # Invariants
//! - One call issues exactly one `PATCH /todos/{id} {"order": n}` exchange.
//! - Error variants keep the server-provided message when there is one.

use crate::api::todo_api::{self, ApiResponse, STATUS_BAD_REQUEST, STATUS_NOT_FOUND, STATUS_OK};
use crate::model::todo::{Todo, TodoId};
use crate::repo::todo_repo::SqliteTodoRepository;
use crate::service::todo_service::TodoService;
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Why a relocation request did not commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderError {
    /// Store does not know the todo id (`404`).
    NotFound { message: String },
    /// Target position outside the collection (`400`).
    OutOfRange { message: String },
    /// Request did not complete: network, server, or decoding failure.
    Transport { message: Option<String> },
    /// No response within the configured request timeout.
    Timeout(Duration),
}

impl ReorderError {
    /// Message supplied by the server, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::NotFound { message } | Self::OutOfRange { message } => {
                Some(message.as_str())
            }
            Self::Transport { message } => message.as_deref(),
            Self::Timeout(_) => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::OutOfRange { .. } => "out_of_range",
            Self::Transport { .. } => "transport",
            Self::Timeout(_) => "timeout",
        }
    }
}

impl Display for ReorderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { message } => write!(f, "not found: {message}"),
            Self::OutOfRange { message } => write!(f, "out of range: {message}"),
            Self::Transport {
                message: Some(message),
            } => write!(f, "transport failure: {message}"),
            Self::Transport { message: None } => write!(f, "transport failure"),
            Self::Timeout(after) => {
                write!(f, "relocation request timed out after {}ms", after.as_millis())
            }
        }
    }
}

impl Error for ReorderError {}

/// Issues relocation requests against the authoritative store.
#[async_trait]
pub trait RelocationTransport: Send + Sync {
    async fn relocate(&self, id: TodoId, new_order: i64) -> Result<Todo, ReorderError>;
}

/// Interprets a `PATCH /todos/{id}` response.
pub fn decode_relocation_response(response: ApiResponse) -> Result<Todo, ReorderError> {
    let message = response.message().map(str::to_string);
    match response.status {
        STATUS_OK => serde_json::from_value(response.body).map_err(|err| {
            ReorderError::Transport {
                message: Some(format!("invalid response body: {err}")),
            }
        }),
        STATUS_NOT_FOUND => Err(ReorderError::NotFound {
            message: message.unwrap_or_else(|| todo_api::TODO_NOT_FOUND_MESSAGE.to_string()),
        }),
        STATUS_BAD_REQUEST => Err(ReorderError::OutOfRange {
            message: message.unwrap_or_else(|| "order out of range".to_string()),
        }),
        _ => Err(ReorderError::Transport { message }),
    }
}

/// In-process transport that routes requests through the JSON handlers of
/// one owner's collection.
pub struct StoreTransport {
    conn: Mutex<Connection>,
    owner_id: String,
}

impl StoreTransport {
    pub fn new(conn: Connection, owner_id: impl Into<String>) -> Self {
        Self {
            conn: Mutex::new(conn),
            owner_id: owner_id.into(),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Runs `f` with exclusive access to the store connection.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        let conn = self.conn.lock();
        f(&conn)
    }

    fn dispatch(&self, id: TodoId, new_order: i64) -> Result<Todo, ReorderError> {
        let conn = self.conn.lock();
        let repo = SqliteTodoRepository::try_new(&conn, self.owner_id.as_str()).map_err(|err| {
            ReorderError::Transport {
                message: Some(err.to_string()),
            }
        })?;
        let service = TodoService::new(repo);
        let response = todo_api::patch(
            &service,
            &id.to_string(),
            &todo_api::relocation_body(new_order),
        );
        decode_relocation_response(response)
    }
}

#[async_trait]
impl RelocationTransport for StoreTransport {
    async fn relocate(&self, id: TodoId, new_order: i64) -> Result<Todo, ReorderError> {
        self.dispatch(id, new_order)
    }
}
