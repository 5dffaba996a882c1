use std::fs;
use std::path::Path;

use serde_json::json;

use crate::api::Backend;
use crate::cli::commands::SummaryCommands;
use crate::cli::context::AppContext;
use crate::cli::finish;
use crate::error::StudyError;
use crate::models::{NewSummary, SourceType, Summary};
use crate::output;

pub fn run(cmd: &SummaryCommands, json_output: bool) -> i32 {
    finish(run_inner(cmd, json_output), json_output)
}

fn run_inner(cmd: &SummaryCommands, json_output: bool) -> Result<i32, StudyError> {
    let ctx = AppContext::load()?;
    ctx.require_user()?;

    match cmd {
        SummaryCommands::List => {
            let mut summaries = ctx.backend.fetch_summaries()?;
            summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            if json_output {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::success(json!(summaries
                        .iter()
                        .map(output::json::summary_json)
                        .collect::<Vec<_>>())))
                    .unwrap()
                );
            } else {
                output::text::print_summary_list(&summaries);
            }
            Ok(0)
        }
        SummaryCommands::Add {
            title,
            content,
            file,
        } => {
            let (content, source_type) = match (content, file) {
                (Some(content), None) => (content.clone(), SourceType::Text),
                (None, Some(path)) => (fs::read_to_string(path)?, source_type_for(path)),
                _ => {
                    return Err(StudyError::validation(
                        "Provide the summary body with --content or --file",
                    ))
                }
            };
            let summary = ctx.backend.create_summary(&NewSummary {
                title: title.clone(),
                content,
                source_type,
            })?;
            if json_output {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::success(
                        output::json::summary_json(&summary)
                    ))
                    .unwrap()
                );
            } else {
                println!("Summary \"{}\" saved.", summary.title);
            }
            Ok(0)
        }
        SummaryCommands::Delete { id } => {
            let summaries = ctx.backend.fetch_summaries()?;
            let id = resolve_id(&summaries, id)?;
            ctx.backend.delete_summary(&id)?;
            if json_output {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::success(json!({ "id": id })))
                        .unwrap()
                );
            } else {
                println!("Summary deleted.");
            }
            Ok(0)
        }
    }
}

fn source_type_for(path: &Path) -> SourceType {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => SourceType::Pdf,
        _ => SourceType::Text,
    }
}

fn resolve_id(summaries: &[Summary], id: &str) -> Result<String, StudyError> {
    if summaries.iter().any(|s| s.id == id) {
        return Ok(id.to_string());
    }
    let matches: Vec<&Summary> = summaries.iter().filter(|s| s.id.starts_with(id)).collect();
    match matches.len() {
        0 => Err(StudyError::not_found(&format!("summary {id}"))),
        1 => Ok(matches[0].id.clone()),
        n => Err(StudyError::validation(format!(
            "Summary id prefix '{id}' is ambiguous ({n} matches)"
        ))),
    }
}
