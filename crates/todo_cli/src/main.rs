//! Command-line driver for the todo order store.
//!
//! # Responsibility
//! - Open the database named by `TODO_DB_PATH` and act on one collection.
//! - Keep output line-oriented and deterministic for quick local checks.
//!
//! Environment: `TODO_DB_PATH` (required except for `ping`), `TODO_OWNER`
//! (default `local`), `TODO_LOG_DIR` and `TODO_LOG_LEVEL` (optional).

use log::info;
use std::process::ExitCode;
use todo_core::db::open_db;
use todo_core::{
    default_log_level, init_logging, NewTodo, SqliteTodoRepository, Todo, TodoListQuery,
    TodoService, TodoStatus,
};
use uuid::Uuid;

const DEFAULT_OWNER: &str = "local";
const USAGE: &str = "usage: todo_cli <ping | list | add <title> | move <id> <order> | delete <id> | done <id>>";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let Some(command) = args.first().map(String::as_str) else {
        return Err(USAGE.to_string());
    };
    if command == "ping" {
        println!("todo_core ping={}", todo_core::ping());
        println!("todo_core version={}", todo_core::core_version());
        return Ok(());
    }

    if let Ok(log_dir) = std::env::var("TODO_LOG_DIR") {
        let level =
            std::env::var("TODO_LOG_LEVEL").unwrap_or_else(|_| default_log_level().to_string());
        init_logging(&level, &log_dir)?;
    }

    let db_path = std::env::var("TODO_DB_PATH")
        .map_err(|_| "TODO_DB_PATH must point at the database file".to_string())?;
    let owner = std::env::var("TODO_OWNER").unwrap_or_else(|_| DEFAULT_OWNER.to_string());
    let conn = open_db(&db_path).map_err(|err| err.to_string())?;
    let repo = SqliteTodoRepository::try_new(&conn, &owner).map_err(|err| err.to_string())?;
    let service = TodoService::new(repo);
    info!("event=cli_command module=cli status=start command={command}");

    match (command, &args[1..]) {
        ("list", []) => {
            let query = TodoListQuery {
                limit: 100,
                ..TodoListQuery::manual_order()
            };
            let page = service.list_todos(&query).map_err(|err| err.to_string())?;
            for todo in &page.todos {
                print_todo(todo);
            }
            println!("total={}", page.total);
        }
        ("add", [title]) => {
            let todo = service
                .create_todo(&NewTodo::titled(title.as_str()))
                .map_err(|err| err.to_string())?;
            print_todo(&todo);
        }
        ("move", [id, order]) => {
            let order: i64 = order
                .parse()
                .map_err(|_| format!("order must be an integer, got `{order}`"))?;
            let todo = service
                .relocate(parse_id(id)?, order)
                .map_err(|err| err.to_string())?;
            print_todo(&todo);
        }
        ("delete", [id]) => {
            service
                .delete_todo(parse_id(id)?)
                .map_err(|err| err.to_string())?;
            println!("deleted {id}");
        }
        ("done", [id]) => {
            let todo = service
                .set_status(parse_id(id)?, TodoStatus::Done)
                .map_err(|err| err.to_string())?;
            print_todo(&todo);
        }
        _ => return Err(USAGE.to_string()),
    }
    Ok(())
}

fn parse_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw).map_err(|_| format!("invalid todo id `{raw}`"))
}

fn print_todo(todo: &Todo) {
    println!(
        "{:>3} {} [{}] {}",
        todo.order,
        todo.id,
        todo.status.as_str(),
        todo.title
    );
}
