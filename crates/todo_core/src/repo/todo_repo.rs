//! Todo order store: repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, listing, and relocation APIs over one owner's collection.
//! - Keep SQL details and renumbering behavior inside repository boundary.
//!
//! # Invariants
//! - `sort_order` values of one collection are exactly `{0, ..., n-1}`.
//! - Every order-mutating write (append, relocate, delete compaction) runs in
//!   one `BEGIN IMMEDIATE` transaction, so writers are serialized and readers
//!   never see a duplicate or missing position.
//! - Failed writes roll back completely; no partial renumbering survives.
//! - Listing is deterministic: ties on the sort key break on insertion
//!   sequence (`rowid`) in the requested direction.

use crate::db::migrations::latest_version;
use crate::db::{fold_case, DbError, FOLD_CASE_FUNCTION};
use crate::model::todo::{
    NewTodo, Todo, TodoId, TodoPatch, TodoPriority, TodoStatus, TodoValidationError,
};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TODO_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    description,
    status,
    priority,
    tags,
    due_date,
    sort_order,
    created_at,
    updated_at
FROM todos";

const NOW_MS_SQL: &str = "(CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))";

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from todo repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Input failed model validation.
    Validation(TodoValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Todo id is unknown to this collection.
    NotFound(TodoId),
    /// Target position is outside `[0, len - 1]`.
    OutOfRange { requested: i64, len: i64 },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Connection was not opened through `open_db` and lacks a SQL function.
    MissingRequiredFunction(&'static str),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "todo not found: {id}"),
            Self::OutOfRange { requested, len } => write!(
                f,
                "order {requested} is out of range for a collection of {len} todos"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "todo repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "todo repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "todo repository requires column `{column}` in table `{table}`"
            ),
            Self::MissingRequiredFunction(name) => {
                write!(f, "todo repository requires SQL function `{name}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted todo data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TodoValidationError> for RepoError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Listing sort key. Wire names follow the REST query parameter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortField {
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "dueDate")]
    DueDate,
    #[serde(rename = "priority")]
    Priority,
    /// Manual (drag-and-drop) order.
    #[serde(rename = "order")]
    Order,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::DueDate => "dueDate",
            Self::Priority => "priority",
            Self::Order => "order",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "createdAt" => Some(Self::CreatedAt),
            "dueDate" => Some(Self::DueDate),
            "priority" => Some(Self::Priority),
            "order" => Some(Self::Order),
            _ => None,
        }
    }

    fn order_by_sql(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            // Missing due dates sort lowest.
            Self::DueDate => "COALESCE(due_date, '')",
            Self::Priority => {
                "CASE priority WHEN 'high' THEN 3 WHEN 'medium' THEN 2 WHEN 'low' THEN 1 ELSE 0 END"
            }
            Self::Order => "sort_order",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filter, sort, and pagination options for listing one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoListQuery {
    pub status: Option<TodoStatus>,
    /// Case-insensitive substring over title and description.
    pub search: Option<String>,
    pub sort_by: SortField,
    #[serde(rename = "sortOrder")]
    pub direction: SortDirection,
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
}

impl Default for TodoListQuery {
    fn default() -> Self {
        Self {
            status: None,
            search: None,
            sort_by: SortField::default(),
            direction: SortDirection::default(),
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl TodoListQuery {
    /// Manual-order view: ascending by `order`, first page.
    pub fn manual_order() -> Self {
        Self {
            sort_by: SortField::Order,
            direction: SortDirection::Asc,
            ..Self::default()
        }
    }

    pub fn effective_page(&self) -> u32 {
        self.page.max(1)
    }

    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_PAGE_LIMIT)
    }

    /// Number of todos preceding the first row of the requested page.
    pub fn offset(&self) -> i64 {
        i64::from(self.effective_page() - 1) * i64::from(self.effective_limit())
    }

    /// Returns whether the view hides todos by status or search text.
    pub fn is_filtered(&self) -> bool {
        self.status.is_some()
            || self
                .search
                .as_deref()
                .is_some_and(|search| !search.trim().is_empty())
    }
}

/// One page of listing results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPage {
    pub todos: Vec<Todo>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

/// Repository interface for one collection of todos.
pub trait TodoRepository {
    /// Appends a todo at `order = n`.
    fn create_todo(&self, draft: &NewTodo) -> RepoResult<Todo>;
    fn get_todo(&self, id: TodoId) -> RepoResult<Option<Todo>>;
    fn list_todos(&self, query: &TodoListQuery) -> RepoResult<TodoPage>;
    /// Collection size `n`.
    fn count_todos(&self) -> RepoResult<i64>;
    /// Moves one todo to `new_order` and shifts everything in between by one.
    fn relocate(&self, id: TodoId, new_order: i64) -> RepoResult<Todo>;
    /// Applies a partial update; `patch.order` relocates in the same transaction.
    fn update_todo(&self, id: TodoId, patch: &TodoPatch) -> RepoResult<Todo>;
    /// Removes one todo and compacts the positions after it.
    fn delete_todo(&self, id: TodoId) -> RepoResult<()>;
}

/// SQLite-backed todo repository scoped to one owner's collection.
pub struct SqliteTodoRepository<'conn> {
    conn: &'conn Connection,
    owner_id: String,
}

impl<'conn> SqliteTodoRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection, owner_id: impl Into<String>) -> RepoResult<Self> {
        ensure_todo_connection_ready(conn)?;
        Ok(Self {
            conn,
            owner_id: owner_id.into(),
        })
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    fn begin_write(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn create_todo(&self, draft: &NewTodo) -> RepoResult<Todo> {
        let draft = draft.normalized()?;
        let id = Uuid::new_v4();

        let tx = self.begin_write()?;
        let order = collection_len(&tx, &self.owner_id)?;
        tx.execute(
            "INSERT INTO todos (
                uuid,
                owner_id,
                title,
                description,
                status,
                priority,
                tags,
                due_date,
                sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                id.to_string(),
                self.owner_id,
                draft.title,
                draft.description,
                draft.status.unwrap_or_default().as_str(),
                draft.priority.map(TodoPriority::as_str),
                tags_to_db(&draft.tags)?,
                draft.due_date,
                order,
            ],
        )?;
        let todo = load_required_todo(&tx, &self.owner_id, id)?;
        tx.commit()?;
        Ok(todo)
    }

    fn get_todo(&self, id: TodoId) -> RepoResult<Option<Todo>> {
        load_todo(self.conn, &self.owner_id, id)
    }

    fn list_todos(&self, query: &TodoListQuery) -> RepoResult<TodoPage> {
        let mut where_sql = String::from(" WHERE owner_id = ?");
        let mut bind_values = vec![Value::Text(self.owner_id.clone())];

        if let Some(status) = query.status {
            where_sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }

        if let Some(search) = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|search| !search.is_empty())
        {
            where_sql.push_str(
                " AND (instr(fold_case(title), ?) > 0 OR instr(fold_case(COALESCE(description, '')), ?) > 0)",
            );
            let needle = fold_case(search);
            bind_values.push(Value::Text(needle.clone()));
            bind_values.push(Value::Text(needle));
        }

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM todos{where_sql};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;

        let limit = query.effective_limit();
        let sql = format!(
            "{TODO_SELECT_SQL}{where_sql} ORDER BY {} {direction}, rowid {direction} LIMIT ? OFFSET ?;",
            query.sort_by.order_by_sql(),
            direction = query.direction.as_sql()
        );
        bind_values.push(Value::Integer(i64::from(limit)));
        bind_values.push(Value::Integer(query.offset()));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut todos = Vec::new();
        while let Some(row) = rows.next()? {
            todos.push(parse_todo_row(row)?);
        }

        Ok(TodoPage {
            todos,
            total,
            page: query.effective_page(),
            limit,
            total_pages: (total + i64::from(limit) - 1) / i64::from(limit),
        })
    }

    fn count_todos(&self) -> RepoResult<i64> {
        collection_len(self.conn, &self.owner_id)
    }

    fn relocate(&self, id: TodoId, new_order: i64) -> RepoResult<Todo> {
        let tx = self.begin_write()?;
        relocate_in_tx(&tx, &self.owner_id, id, new_order)?;
        let todo = load_required_todo(&tx, &self.owner_id, id)?;
        tx.commit()?;
        Ok(todo)
    }

    fn update_todo(&self, id: TodoId, patch: &TodoPatch) -> RepoResult<Todo> {
        let patch = patch.normalized()?;

        let tx = self.begin_write()?;
        match patch.order {
            Some(new_order) => {
                relocate_in_tx(&tx, &self.owner_id, id, new_order)?;
            }
            None => {
                current_order(&tx, &self.owner_id, id)?;
            }
        }
        if patch.touches_fields() {
            apply_field_patch(&tx, &self.owner_id, id, &patch)?;
        } else {
            touch_todo(&tx, &self.owner_id, id)?;
        }
        let todo = load_required_todo(&tx, &self.owner_id, id)?;
        tx.commit()?;
        Ok(todo)
    }

    fn delete_todo(&self, id: TodoId) -> RepoResult<()> {
        let tx = self.begin_write()?;
        let removed_order = current_order(&tx, &self.owner_id, id)?;
        tx.execute(
            "DELETE FROM todos WHERE uuid = ?1 AND owner_id = ?2;",
            params![id.to_string(), self.owner_id],
        )?;
        tx.execute(
            &format!(
                "UPDATE todos
                 SET sort_order = sort_order - 1,
                     updated_at = {NOW_MS_SQL}
                 WHERE owner_id = ?1
                   AND sort_order > ?2;"
            ),
            params![self.owner_id, removed_order],
        )?;
        tx.commit()?;
        Ok(())
    }
}

/// Renumbers one collection for a single move. Caller owns the transaction.
///
/// Returns the previous position of the moved todo.
fn relocate_in_tx(
    tx: &Transaction<'_>,
    owner_id: &str,
    id: TodoId,
    new_order: i64,
) -> RepoResult<i64> {
    let old_order = current_order(tx, owner_id, id)?;
    let len = collection_len(tx, owner_id)?;
    if !(0..len).contains(&new_order) {
        return Err(RepoError::OutOfRange {
            requested: new_order,
            len,
        });
    }
    if new_order == old_order {
        return Ok(old_order);
    }

    let shift_sql = if new_order < old_order {
        // Moving earlier: [new, old) slides one slot later.
        format!(
            "UPDATE todos
             SET sort_order = sort_order + 1,
                 updated_at = {NOW_MS_SQL}
             WHERE owner_id = ?1
               AND uuid <> ?2
               AND sort_order >= ?3
               AND sort_order < ?4;"
        )
    } else {
        // Moving later: (old, new] slides one slot earlier.
        format!(
            "UPDATE todos
             SET sort_order = sort_order - 1,
                 updated_at = {NOW_MS_SQL}
             WHERE owner_id = ?1
               AND uuid <> ?2
               AND sort_order > ?4
               AND sort_order <= ?3;"
        )
    };
    let shifted = tx.execute(
        &shift_sql,
        params![owner_id, id.to_string(), new_order, old_order],
    )?;
    if shifted as i64 != (new_order - old_order).abs() {
        return Err(RepoError::InvalidData(format!(
            "collection `{owner_id}` is not densely ordered: moved {old_order}->{new_order} but shifted {shifted} rows"
        )));
    }

    tx.execute(
        &format!(
            "UPDATE todos
             SET sort_order = ?3,
                 updated_at = {NOW_MS_SQL}
             WHERE uuid = ?1
               AND owner_id = ?2;"
        ),
        params![id.to_string(), owner_id, new_order],
    )?;
    Ok(old_order)
}

fn apply_field_patch(
    tx: &Transaction<'_>,
    owner_id: &str,
    id: TodoId,
    patch: &TodoPatch,
) -> RepoResult<()> {
    let mut assignments = Vec::new();
    let mut bind_values: Vec<Value> = Vec::new();

    if let Some(title) = &patch.title {
        assignments.push("title = ?");
        bind_values.push(Value::Text(title.clone()));
    }
    if let Some(description) = &patch.description {
        assignments.push("description = ?");
        bind_values.push(text_or_null(description));
    }
    if let Some(status) = patch.status {
        assignments.push("status = ?");
        bind_values.push(Value::Text(status.as_str().to_string()));
    }
    if let Some(priority) = patch.priority {
        assignments.push("priority = ?");
        bind_values.push(Value::Text(priority.as_str().to_string()));
    }
    if let Some(tags) = &patch.tags {
        assignments.push("tags = ?");
        bind_values.push(Value::Text(tags_to_db(tags)?));
    }
    if let Some(due_date) = &patch.due_date {
        assignments.push("due_date = ?");
        bind_values.push(text_or_null(due_date));
    }

    let sql = format!(
        "UPDATE todos SET {}, updated_at = {NOW_MS_SQL} WHERE uuid = ? AND owner_id = ?;",
        assignments.join(", ")
    );
    bind_values.push(Value::Text(id.to_string()));
    bind_values.push(Value::Text(owner_id.to_string()));

    let changed = tx.execute(&sql, params_from_iter(bind_values))?;
    if changed == 0 {
        return Err(RepoError::NotFound(id));
    }
    Ok(())
}

// Empty patches and no-op moves still count as an update.
fn touch_todo(tx: &Transaction<'_>, owner_id: &str, id: TodoId) -> RepoResult<()> {
    tx.execute(
        &format!(
            "UPDATE todos
             SET updated_at = {NOW_MS_SQL}
             WHERE uuid = ?1
               AND owner_id = ?2;"
        ),
        params![id.to_string(), owner_id],
    )?;
    Ok(())
}

fn current_order(conn: &Connection, owner_id: &str, id: TodoId) -> RepoResult<i64> {
    conn.query_row(
        "SELECT sort_order
         FROM todos
         WHERE uuid = ?1
           AND owner_id = ?2;",
        params![id.to_string(), owner_id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or(RepoError::NotFound(id))
}

fn collection_len(conn: &Connection, owner_id: &str) -> RepoResult<i64> {
    let len = conn.query_row(
        "SELECT COUNT(*) FROM todos WHERE owner_id = ?1;",
        [owner_id],
        |row| row.get(0),
    )?;
    Ok(len)
}

fn load_todo(conn: &Connection, owner_id: &str, id: TodoId) -> RepoResult<Option<Todo>> {
    let mut stmt = conn.prepare(&format!(
        "{TODO_SELECT_SQL}
         WHERE uuid = ?1
           AND owner_id = ?2;"
    ))?;
    let mut rows = stmt.query(params![id.to_string(), owner_id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_todo_row(row)?));
    }
    Ok(None)
}

fn load_required_todo(conn: &Connection, owner_id: &str, id: TodoId) -> RepoResult<Todo> {
    load_todo(conn, owner_id, id)?.ok_or(RepoError::NotFound(id))
}

fn parse_todo_row(row: &Row<'_>) -> RepoResult<Todo> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in todos.uuid"))
    })?;

    let status_text: String = row.get("status")?;
    let status = TodoStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in todos.status"))
    })?;

    let priority = row
        .get::<_, Option<String>>("priority")?
        .map(|value| {
            TodoPriority::parse(&value).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid priority `{value}` in todos.priority"))
            })
        })
        .transpose()?;

    let tags_text: String = row.get("tags")?;
    let tags = serde_json::from_str::<Vec<String>>(&tags_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid tags json in todos.tags: {err}"))
    })?;

    Ok(Todo {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        status,
        priority,
        tags,
        due_date: row.get("due_date")?,
        order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn tags_to_db(tags: &[String]) -> RepoResult<String> {
    serde_json::to_string(tags)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode tags: {err}")))
}

// Empty patch text clears the column.
fn text_or_null(value: &str) -> Value {
    if value.is_empty() {
        Value::Null
    } else {
        Value::Text(value.to_string())
    }
}

fn ensure_todo_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "todos")? {
        return Err(RepoError::MissingRequiredTable("todos"));
    }

    for column in [
        "uuid",
        "owner_id",
        "title",
        "description",
        "status",
        "priority",
        "tags",
        "due_date",
        "sort_order",
        "created_at",
        "updated_at",
    ] {
        if !table_has_column(conn, "todos", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "todos",
                column,
            });
        }
    }

    if conn
        .query_row(&format!("SELECT {FOLD_CASE_FUNCTION}('');"), [], |row| {
            row.get::<_, String>(0)
        })
        .is_err()
    {
        return Err(RepoError::MissingRequiredFunction(FOLD_CASE_FUNCTION));
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
