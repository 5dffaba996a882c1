use serde_json::json;

use crate::cli::finish;
use crate::config::Config;
use crate::error::StudyError;
use crate::output;

pub fn run(api_url: &str, json_output: bool) -> i32 {
    finish(run_inner(api_url, json_output), json_output)
}

fn run_inner(api_url: &str, json_output: bool) -> Result<i32, StudyError> {
    let config = Config {
        api_url: api_url.to_string(),
    };
    let path = config.save()?;
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "path": path.to_string_lossy(),
                "api_url": api_url
            })))
            .unwrap()
        );
    } else {
        println!("Configured studytrack at {}", path.display());
    }
    Ok(0)
}
