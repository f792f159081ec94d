use rusqlite::Connection;
use todo_core::db::open_db_in_memory;
use todo_core::{
    NewTodo, RepoError, SortDirection, SortField, SqliteTodoRepository, TodoListQuery, TodoPatch,
    TodoPriority, TodoService, TodoStatus,
};

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn draft(
    title: &str,
    status: TodoStatus,
    priority: Option<TodoPriority>,
    due_date: Option<&str>,
) -> NewTodo {
    NewTodo {
        title: title.to_string(),
        description: Some(format!("{title} description")),
        status: Some(status),
        priority,
        tags: vec!["seed".to_string()],
        due_date: due_date.map(str::to_string),
    }
}

fn seed_service(conn: &Connection) -> TodoService<SqliteTodoRepository<'_>> {
    let service = TodoService::new(SqliteTodoRepository::try_new(conn, "alice").unwrap());
    for new in [
        draft(
            "Learn React",
            TodoStatus::InProgress,
            Some(TodoPriority::High),
            Some("2024-01-15"),
        ),
        draft(
            "Build Todo App",
            TodoStatus::Todo,
            Some(TodoPriority::Medium),
            Some("2024-02-01"),
        ),
        draft(
            "Write Tests",
            TodoStatus::Done,
            Some(TodoPriority::Low),
            Some("2024-01-10"),
        ),
        draft("Deploy Application", TodoStatus::Todo, None, None),
        draft(
            "Code Review",
            TodoStatus::InProgress,
            Some(TodoPriority::Medium),
            Some("2024-01-12"),
        ),
    ] {
        service.create_todo(&new).unwrap();
    }
    service
}

fn titles(service: &TodoService<SqliteTodoRepository<'_>>, query: &TodoListQuery) -> Vec<String> {
    service
        .list_todos(query)
        .unwrap()
        .todos
        .into_iter()
        .map(|todo| todo.title)
        .collect()
}

#[test]
fn create_persists_all_fields() {
    let conn = setup();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn, "alice").unwrap());

    let created = service
        .create_todo(&draft(
            "  Security Audit ",
            TodoStatus::Todo,
            Some(TodoPriority::High),
            Some("2024-01-30"),
        ))
        .unwrap();
    let loaded = service.get_todo(created.id).unwrap().unwrap();

    assert_eq!(loaded, created);
    assert_eq!(loaded.title, "Security Audit");
    assert_eq!(loaded.priority, Some(TodoPriority::High));
    assert_eq!(loaded.tags, vec!["seed".to_string()]);
    assert_eq!(loaded.due_date.as_deref(), Some("2024-01-30"));
    assert_eq!(loaded.order, 0);
    assert!(loaded.created_at > 0);
}

#[test]
fn create_rejects_blank_title() {
    let conn = setup();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn, "alice").unwrap());

    let err = service.create_todo(&NewTodo::titled(" ")).unwrap_err();

    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(service.count_todos().unwrap(), 0);
}

#[test]
fn manual_order_ascending_lists_in_creation_sequence() {
    let conn = setup();
    let service = seed_service(&conn);

    let listed = titles(&service, &TodoListQuery::manual_order());

    assert_eq!(
        listed,
        vec![
            "Learn React",
            "Build Todo App",
            "Write Tests",
            "Deploy Application",
            "Code Review"
        ]
    );
}

#[test]
fn status_filter_and_search_narrow_results() {
    let conn = setup();
    let service = seed_service(&conn);

    let in_progress = TodoListQuery {
        status: Some(TodoStatus::InProgress),
        ..TodoListQuery::manual_order()
    };
    assert_eq!(
        titles(&service, &in_progress),
        vec!["Learn React", "Code Review"]
    );

    let search = TodoListQuery {
        search: Some("TODO".to_string()),
        ..TodoListQuery::manual_order()
    };
    assert_eq!(titles(&service, &search), vec!["Build Todo App"]);

    let description_hit = TodoListQuery {
        search: Some("tests description".to_string()),
        ..TodoListQuery::manual_order()
    };
    assert_eq!(titles(&service, &description_hit), vec!["Write Tests"]);
}

#[test]
fn priority_sort_puts_missing_priority_last_when_descending() {
    let conn = setup();
    let service = seed_service(&conn);

    let query = TodoListQuery {
        sort_by: SortField::Priority,
        direction: SortDirection::Desc,
        ..TodoListQuery::default()
    };
    let listed = titles(&service, &query);

    assert_eq!(listed[0], "Learn React");
    assert_eq!(listed[3], "Write Tests");
    assert_eq!(listed[4], "Deploy Application");
}

#[test]
fn due_date_sort_ascending_puts_missing_date_first() {
    let conn = setup();
    let service = seed_service(&conn);

    let query = TodoListQuery {
        sort_by: SortField::DueDate,
        direction: SortDirection::Asc,
        ..TodoListQuery::default()
    };

    assert_eq!(
        titles(&service, &query),
        vec![
            "Deploy Application",
            "Write Tests",
            "Code Review",
            "Learn React",
            "Build Todo App"
        ]
    );
}

#[test]
fn pagination_reports_totals_and_slices() {
    let conn = setup();
    let service = seed_service(&conn);

    let query = TodoListQuery {
        page: 2,
        limit: 2,
        ..TodoListQuery::manual_order()
    };
    let page = service.list_todos(&query).unwrap();

    assert_eq!(page.total, 5);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.page, 2);
    assert_eq!(page.limit, 2);
    let orders: Vec<i64> = page.todos.iter().map(|todo| todo.order).collect();
    assert_eq!(orders, vec![2, 3]);

    let past_end = TodoListQuery {
        page: 9,
        ..query
    };
    assert!(service.list_todos(&past_end).unwrap().todos.is_empty());
}

#[test]
fn patch_updates_fields_and_clears_optional_values() {
    let conn = setup();
    let service = seed_service(&conn);
    let target = service
        .list_todos(&TodoListQuery::manual_order())
        .unwrap()
        .todos[0]
        .clone();

    let patch = TodoPatch {
        description: Some(String::new()),
        due_date: Some(String::new()),
        tags: Some(vec!["react".to_string(), "learning".to_string()]),
        priority: Some(TodoPriority::Low),
        ..TodoPatch::status(TodoStatus::Done)
    };
    let updated = service.update_todo(target.id, &patch).unwrap();

    assert_eq!(updated.status, TodoStatus::Done);
    assert_eq!(updated.priority, Some(TodoPriority::Low));
    assert_eq!(updated.description, None);
    assert_eq!(updated.due_date, None);
    assert_eq!(updated.tags, vec!["react".to_string(), "learning".to_string()]);
    assert_eq!(updated.order, target.order);
    assert_eq!(updated.title, target.title);
}

#[test]
fn set_status_marks_todo_done() {
    let conn = setup();
    let service = seed_service(&conn);
    let first = service
        .list_todos(&TodoListQuery::manual_order())
        .unwrap()
        .todos[0]
        .id;

    let done = service.set_status(first, TodoStatus::Done).unwrap();

    assert_eq!(done.status, TodoStatus::Done);
}

#[test]
fn default_listing_is_newest_first_even_within_one_millisecond() {
    let conn = setup();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn, "alice").unwrap());
    for title in ["first", "second", "third"] {
        service.create_todo(&NewTodo::titled(title)).unwrap();
    }

    assert_eq!(
        titles(&service, &TodoListQuery::default()),
        vec!["third", "second", "first"]
    );
    let oldest_first = TodoListQuery {
        direction: SortDirection::Asc,
        ..TodoListQuery::default()
    };
    assert_eq!(
        titles(&service, &oldest_first),
        vec!["first", "second", "third"]
    );
}

#[test]
fn created_at_is_stamped_in_epoch_milliseconds() {
    let conn = setup();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn, "alice").unwrap());
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64;

    let created = service.create_todo(&NewTodo::titled("stamp")).unwrap();

    assert!((created.created_at - now_ms).abs() < 60_000);
}

#[test]
fn search_folds_non_ascii_case() {
    let conn = setup();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn, "alice").unwrap());
    service.create_todo(&NewTodo::titled("Ärger melden")).unwrap();
    service.create_todo(&NewTodo::titled("Arbeit")).unwrap();

    for needle in ["ärger", "ÄRGER", "MELDEN"] {
        let query = TodoListQuery {
            search: Some(needle.to_string()),
            ..TodoListQuery::manual_order()
        };
        let page = service.list_todos(&query).unwrap();
        assert_eq!(page.total, 1, "search `{needle}`");
        assert_eq!(page.todos[0].title, "Ärger melden");
    }
}
