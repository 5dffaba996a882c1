pub mod auth;
pub mod commands;
pub mod context;
pub mod goal;
pub mod init;
pub mod status;
pub mod summary;
pub mod task;

pub use commands::*;

use crate::error::StudyError;
use crate::models::Category;
use crate::output;

/// Shared tail for every command: map an error result to exit code 1,
/// printed as a JSON envelope or a stderr message.
pub(crate) fn finish(result: Result<i32, StudyError>, json_output: bool) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            if json_output {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::error(&e)).unwrap()
                );
            } else {
                eprintln!("Error: {}", e.message);
            }
            1
        }
    }
}

pub(crate) fn parse_category(raw: &str) -> Result<Category, StudyError> {
    Category::from_str(raw).ok_or_else(|| {
        StudyError::validation(format!(
            "Unknown category '{raw}'. Expected one of: algorithms, development, system_design, job_search"
        ))
    })
}
