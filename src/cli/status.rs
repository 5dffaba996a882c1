use serde_json::json;

use crate::cli::context::AppContext;
use crate::cli::finish;
use crate::error::StudyError;
use crate::models::ALL_CATEGORIES;
use crate::output;

pub fn run(json_output: bool) -> i32 {
    finish(run_inner(json_output), json_output)
}

fn run_inner(json_output: bool) -> Result<i32, StudyError> {
    let ctx = AppContext::load()?;
    let user = ctx.require_user()?;

    let mut stale = false;
    if ctx.goals.fetch_goals().is_err() {
        stale = true;
    }
    if ctx.tasks.refresh_tasks().is_err() {
        stale = true;
    }
    if stale && !json_output {
        eprintln!("Warning: backend unreachable; showing cached data");
    }

    if json_output {
        let categories: Vec<_> = ALL_CATEGORIES
            .iter()
            .map(|&category| {
                json!({
                    "category": category.as_str(),
                    "tasks_completed": ctx.tasks.completed_count(category),
                    "tasks_total": ctx.tasks.total_count(category),
                    "goal": output::json::goal_json(&ctx.goals.goal(category)),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "user": output::json::user_json(&user),
                "stale": stale,
                "categories": categories
            })))
            .unwrap()
        );
    } else {
        println!("Signed in as {}", user.username);
        for &category in ALL_CATEGORIES.iter() {
            let goal = ctx.goals.goal(category);
            println!();
            output::text::print_goal(&goal);
            println!(
                "  Tasks: {}/{} completed",
                ctx.tasks.completed_count(category),
                ctx.tasks.total_count(category)
            );
        }
    }
    Ok(0)
}
