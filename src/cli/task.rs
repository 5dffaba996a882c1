use serde_json::json;

use crate::cli::commands::TaskCommands;
use crate::cli::context::AppContext;
use crate::cli::{finish, parse_category};
use crate::error::StudyError;
use crate::models::Task;
use crate::output;

pub fn run(cmd: &TaskCommands, json_output: bool) -> i32 {
    finish(run_inner(cmd, json_output), json_output)
}

fn run_inner(cmd: &TaskCommands, json_output: bool) -> Result<i32, StudyError> {
    let ctx = AppContext::load()?;
    ctx.require_user()?;

    match cmd {
        TaskCommands::Add { title, category } => {
            let category = parse_category(category)?;
            if title.trim().is_empty() {
                return Err(StudyError::validation("Task title must not be empty"));
            }
            let task = ctx.tasks.add_task(title, category)?;
            let events = ctx.drain_events();
            if json_output {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::success_with_events(
                        output::json::task_json(&task),
                        &events
                    ))
                    .unwrap()
                );
            } else {
                output::text::print_events(&events);
            }
            Ok(0)
        }
        TaskCommands::List { category } => {
            let category = category.as_deref().map(parse_category).transpose()?;
            refresh_best_effort(&ctx, json_output);
            let tasks = match category {
                Some(category) => ctx.tasks.tasks_by_category(category),
                None => ctx.tasks.tasks(),
            };
            if json_output {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::success(json!(tasks
                        .iter()
                        .map(output::json::task_json)
                        .collect::<Vec<_>>())))
                    .unwrap()
                );
            } else {
                output::text::print_task_list(&tasks);
            }
            Ok(0)
        }
        TaskCommands::Toggle { id } => {
            refresh_best_effort(&ctx, json_output);
            // The goal sync inside toggle needs the goal records loaded.
            let _ = ctx.goals.fetch_goals();
            let id = resolve_id(&ctx, id)?;
            let task = ctx.tasks.toggle_task(&id)?;
            emit_task(&ctx, &task, json_output);
            Ok(0)
        }
        TaskCommands::Edit { id, title } => {
            if title.trim().is_empty() {
                return Err(StudyError::validation("Task title must not be empty"));
            }
            refresh_best_effort(&ctx, json_output);
            let id = resolve_id(&ctx, id)?;
            let task = ctx.tasks.edit_task(&id, title)?;
            emit_task(&ctx, &task, json_output);
            Ok(0)
        }
        TaskCommands::Delete { id } => {
            refresh_best_effort(&ctx, json_output);
            let id = resolve_id(&ctx, id)?;
            ctx.tasks.delete_task(&id)?;
            let events = ctx.drain_events();
            if json_output {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::success_with_events(
                        json!({ "id": id }),
                        &events
                    ))
                    .unwrap()
                );
            } else {
                output::text::print_events(&events);
            }
            Ok(0)
        }
    }
}

/// Read commands keep working from the cache when the backend is down.
fn refresh_best_effort(ctx: &AppContext, json_output: bool) {
    if let Err(err) = ctx.tasks.refresh_tasks() {
        if !json_output {
            eprintln!("Warning: could not refresh tasks ({}); using cached data", err.message);
        }
    }
}

/// Accept a full task id or any unique prefix of one.
fn resolve_id(ctx: &AppContext, id: &str) -> Result<String, StudyError> {
    let tasks = ctx.tasks.tasks();
    if tasks.iter().any(|t| t.id == id) {
        return Ok(id.to_string());
    }
    let matches: Vec<&Task> = tasks.iter().filter(|t| t.id.starts_with(id)).collect();
    match matches.len() {
        0 => Err(StudyError::not_found(&format!("task {id}"))),
        1 => Ok(matches[0].id.clone()),
        n => Err(StudyError::validation(format!(
            "Task id prefix '{id}' is ambiguous ({n} matches)"
        ))),
    }
}

fn emit_task(ctx: &AppContext, task: &Task, json_output: bool) {
    let events = ctx.drain_events();
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success_with_events(
                output::json::task_json(task),
                &events
            ))
            .unwrap()
        );
    } else {
        output::text::print_task(task);
        output::text::print_events(&events);
    }
}
