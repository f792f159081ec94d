//! Todo domain model.
//!
//! # Responsibility
//! - Define the orderable todo record owned by one collection.
//! - Define create/patch request shapes and their validation rules.
//!
//! # Invariants
//! - `id` is stable and never reused for another todo.
//! - `order` is dense within the owning collection: `{0, 1, ..., n-1}`.
//! - `title` is never blank once persisted.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one todo.
pub type TodoId = Uuid;

static DUE_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").expect("valid due date regex")
});

/// Workflow state of a todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TodoStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "todo" => Some(Self::Todo),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

/// Optional urgency marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoPriority {
    Low,
    Medium,
    High,
}

impl TodoPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Persisted todo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TodoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TodoPriority>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Calendar date in `YYYY-MM-DD` form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Dense position within the owning collection.
    pub order: i64,
    /// Epoch ms.
    pub created_at: i64,
    /// Epoch ms. Refreshed whenever the row changes, including order shifts.
    pub updated_at: i64,
}

/// Create request. Position is always assigned by the store (append).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TodoStatus>,
    #[serde(default)]
    pub priority: Option<TodoPriority>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

impl NewTodo {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Returns a trimmed copy, or the first violated rule.
    pub fn normalized(&self) -> Result<Self, TodoValidationError> {
        Ok(Self {
            title: normalize_title(&self.title)?,
            description: normalize_description(self.description.as_deref()),
            status: self.status,
            priority: self.priority,
            tags: normalize_tags(&self.tags)?,
            due_date: normalize_due_date(self.due_date.as_deref())?,
        })
    }
}

/// Partial update. `None` leaves the stored field untouched.
///
/// `order` routes through relocation, so neighbours are renumbered in the
/// same transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TodoStatus>,
    #[serde(default)]
    pub priority: Option<TodoPriority>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
}

impl TodoPatch {
    pub fn order(order: i64) -> Self {
        Self {
            order: Some(order),
            ..Self::default()
        }
    }

    pub fn status(status: TodoStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn normalized(&self) -> Result<Self, TodoValidationError> {
        Ok(Self {
            title: self.title.as_deref().map(normalize_title).transpose()?,
            description: self
                .description
                .as_deref()
                .map(|value| normalize_description(Some(value)).unwrap_or_default()),
            status: self.status,
            priority: self.priority,
            tags: self.tags.as_deref().map(normalize_tags).transpose()?,
            due_date: self
                .due_date
                .as_deref()
                .map(|value| normalize_due_date(Some(value)).map(Option::unwrap_or_default))
                .transpose()?,
            order: self.order,
        })
    }

    /// Returns whether any non-order field is set.
    pub fn touches_fields(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.status.is_some()
            || self.priority.is_some()
            || self.tags.is_some()
            || self.due_date.is_some()
    }
}

/// Validation failures for todo input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    BlankTitle,
    BlankTag,
    InvalidDueDate(String),
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "Title is required"),
            Self::BlankTag => write!(f, "tags must not be blank"),
            Self::InvalidDueDate(value) => {
                write!(f, "due date `{value}` must use YYYY-MM-DD format")
            }
        }
    }
}

impl Error for TodoValidationError {}

fn normalize_title(value: &str) -> Result<String, TodoValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TodoValidationError::BlankTitle);
    }
    Ok(trimmed.to_string())
}

// Empty description is stored as NULL.
fn normalize_description(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}

fn normalize_tags(tags: &[String]) -> Result<Vec<String>, TodoValidationError> {
    tags.iter()
        .map(|tag| {
            let trimmed = tag.trim();
            if trimmed.is_empty() {
                Err(TodoValidationError::BlankTag)
            } else {
                Ok(trimmed.to_string())
            }
        })
        .collect()
}

fn normalize_due_date(value: Option<&str>) -> Result<Option<String>, TodoValidationError> {
    let Some(trimmed) = value.map(str::trim).filter(|trimmed| !trimmed.is_empty()) else {
        return Ok(None);
    };
    if !DUE_DATE_RE.is_match(trimmed) {
        return Err(TodoValidationError::InvalidDueDate(trimmed.to_string()));
    }
    Ok(Some(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{NewTodo, TodoPatch, TodoStatus, TodoValidationError};

    #[test]
    fn new_todo_rejects_blank_title() {
        let err = NewTodo::titled("   ").normalized().unwrap_err();
        assert_eq!(err, TodoValidationError::BlankTitle);
    }

    #[test]
    fn new_todo_trims_fields_and_drops_empty_description() {
        let draft = NewTodo {
            title: "  Write tests ".to_string(),
            description: Some("  ".to_string()),
            tags: vec![" testing ".to_string()],
            due_date: Some(" 2024-01-10 ".to_string()),
            ..NewTodo::default()
        };
        let normalized = draft.normalized().unwrap();
        assert_eq!(normalized.title, "Write tests");
        assert_eq!(normalized.description, None);
        assert_eq!(normalized.tags, vec!["testing".to_string()]);
        assert_eq!(normalized.due_date.as_deref(), Some("2024-01-10"));
    }

    #[test]
    fn due_date_must_be_calendar_shaped() {
        let draft = NewTodo {
            due_date: Some("2024-13-01".to_string()),
            ..NewTodo::titled("Deploy")
        };
        assert!(matches!(
            draft.normalized(),
            Err(TodoValidationError::InvalidDueDate(_))
        ));
    }

    #[test]
    fn patch_with_only_order_touches_no_fields() {
        assert!(!TodoPatch::order(3).touches_fields());
        assert!(TodoPatch::status(TodoStatus::Done).touches_fields());
    }

    #[test]
    fn status_round_trips_through_storage_text() {
        for status in [TodoStatus::Todo, TodoStatus::InProgress, TodoStatus::Done] {
            assert_eq!(TodoStatus::parse(status.as_str()), Some(status));
        }
    }
}
