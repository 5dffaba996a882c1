use chrono::{Datelike, Local};
use serde_json::json;

use crate::cli::commands::GoalCommands;
use crate::cli::context::AppContext;
use crate::cli::{finish, parse_category};
use crate::error::StudyError;
use crate::models::{Category, Goal, ALL_CATEGORIES};
use crate::output;

pub fn run(cmd: &GoalCommands, json_output: bool) -> i32 {
    finish(run_inner(cmd, json_output), json_output)
}

fn run_inner(cmd: &GoalCommands, json_output: bool) -> Result<i32, StudyError> {
    let ctx = AppContext::load()?;
    ctx.require_user()?;

    match cmd {
        GoalCommands::Show { category } => {
            let category = category.as_deref().map(parse_category).transpose()?;
            fetch_best_effort(&ctx, json_output);
            let goals: Vec<Goal> = match category {
                Some(category) => vec![ctx.goals.goal(category)],
                None => ALL_CATEGORIES.iter().map(|c| ctx.goals.goal(*c)).collect(),
            };
            if json_output {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::success(json!(goals
                        .iter()
                        .map(output::json::goal_json)
                        .collect::<Vec<_>>())))
                    .unwrap()
                );
            } else {
                for goal in &goals {
                    output::text::print_goal(goal);
                }
            }
            Ok(0)
        }
        GoalCommands::Set { category, target } => {
            let category = parse_category(category)?;
            if *target == 0 {
                return Err(StudyError::validation("Daily target must be at least 1"));
            }
            fetch_best_effort(&ctx, json_output);
            if !ctx.goals.update_goal(category, *target) {
                let message = ctx
                    .goals
                    .last_error()
                    .unwrap_or_else(|| "Failed to update goal".to_string());
                return Err(StudyError::validation(message));
            }
            emit_goal(&ctx, category, json_output);
            Ok(0)
        }
        GoalCommands::Complete { category } => {
            let category = parse_category(category)?;
            ctx.goals.fetch_goals()?;
            let goal = require_goal(&ctx, category)?;
            if goal.is_daily_goal_completed {
                return already(json_output, "Daily goal already completed today.");
            }
            ctx.goals.mark_daily_goal_completed(&goal.id)?;
            emit_goal(&ctx, category, json_output);
            Ok(0)
        }
        GoalCommands::Uncomplete { category } => {
            let category = parse_category(category)?;
            ctx.goals.fetch_goals()?;
            let goal = require_goal(&ctx, category)?;
            let today = Local::now().date_naive().weekday().num_days_from_monday() as u8;
            if !goal.is_daily_goal_completed
                && !goal.current_week_days_completed.contains(&today)
            {
                return already(json_output, "No completion recorded for today.");
            }
            ctx.goals.remove_daily_goal_completion(&goal.id)?;
            emit_goal(&ctx, category, json_output);
            Ok(0)
        }
        GoalCommands::AddProgress { category, amount } => {
            let category = parse_category(category)?;
            require_amount(*amount)?;
            ctx.goals.fetch_goals()?;
            let goal = require_goal(&ctx, category)?;
            ctx.goals.add_progress(&goal.id, *amount, None)?;
            emit_goal(&ctx, category, json_output);
            Ok(0)
        }
        GoalCommands::SubProgress { category, amount } => {
            let category = parse_category(category)?;
            require_amount(*amount)?;
            ctx.goals.fetch_goals()?;
            let goal = require_goal(&ctx, category)?;
            ctx.goals.subtract_progress(&goal.id, *amount, None)?;
            emit_goal(&ctx, category, json_output);
            Ok(0)
        }
        GoalCommands::Week { category } => {
            let category = parse_category(category)?;
            if let Err(err) = ctx.tasks.refresh_tasks() {
                if !json_output {
                    eprintln!(
                        "Warning: could not refresh tasks ({}); using cached data",
                        err.message
                    );
                }
            }
            let data = ctx.tasks.weekly_data(category);
            if json_output {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::success(
                        output::json::weekly_json(&data)
                    ))
                    .unwrap()
                );
            } else {
                output::text::print_weekly(&data);
            }
            Ok(0)
        }
    }
}

fn fetch_best_effort(ctx: &AppContext, json_output: bool) {
    if let Err(err) = ctx.goals.fetch_goals() {
        if !json_output {
            eprintln!(
                "Warning: could not refresh goals ({}); using cached data",
                err.message
            );
        }
    }
}

/// Progress and completion endpoints need a persisted goal record.
fn require_goal(ctx: &AppContext, category: Category) -> Result<Goal, StudyError> {
    let goal = ctx.goals.goal(category);
    if goal.is_persisted() {
        Ok(goal)
    } else {
        Err(StudyError::validation(format!(
            "No goal configured for {}. Run `studytrack goal set {} <target>` first.",
            category.display_name(),
            category.as_str()
        )))
    }
}

fn require_amount(amount: u32) -> Result<(), StudyError> {
    if amount == 0 {
        Err(StudyError::validation("Amount must be at least 1"))
    } else {
        Ok(())
    }
}

/// Nothing to do; report success without touching the backend.
fn already(json_output: bool, message: &str) -> Result<i32, StudyError> {
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "message": message
            })))
            .unwrap()
        );
    } else {
        println!("{message}");
    }
    Ok(0)
}

fn emit_goal(ctx: &AppContext, category: Category, json_output: bool) {
    let goal = ctx.goals.goal(category);
    let events = ctx.drain_events();
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success_with_events(
                output::json::goal_json(&goal),
                &events
            ))
            .unwrap()
        );
    } else {
        output::text::print_goal(&goal);
        output::text::print_events(&events);
    }
}
