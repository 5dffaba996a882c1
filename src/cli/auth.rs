use std::io::{self, BufRead, Write};

use serde_json::json;

use crate::cli::context::AppContext;
use crate::cli::finish;
use crate::error::StudyError;
use crate::output;

pub fn run_login(email: &str, password: Option<&str>, json_output: bool) -> i32 {
    finish(login_inner(email, password, json_output), json_output)
}

fn login_inner(
    email: &str,
    password: Option<&str>,
    json_output: bool,
) -> Result<i32, StudyError> {
    let ctx = AppContext::load()?;
    let password = resolve_password(password)?;
    let user = ctx.backend.login(email, &password)?;
    ctx.adopt_identity(Some(user.clone()));

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "user": output::json::user_json(&user)
            })))
            .unwrap()
        );
    } else {
        println!("Signed in as {} ({})", user.username, user.email);
    }
    Ok(0)
}

pub fn run_signup(
    email: &str,
    username: &str,
    password: Option<&str>,
    json_output: bool,
) -> i32 {
    finish(signup_inner(email, username, password, json_output), json_output)
}

fn signup_inner(
    email: &str,
    username: &str,
    password: Option<&str>,
    json_output: bool,
) -> Result<i32, StudyError> {
    let ctx = AppContext::load()?;
    let password = resolve_password(password)?;
    let user = ctx.backend.signup(email, username, &password, &password)?;

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "user": output::json::user_json(&user)
            })))
            .unwrap()
        );
    } else {
        println!("Account created for {}. Run `studytrack login` to sign in.", user.email);
    }
    Ok(0)
}

pub fn run_logout(json_output: bool) -> i32 {
    finish(logout_inner(json_output), json_output)
}

fn logout_inner(json_output: bool) -> Result<i32, StudyError> {
    let ctx = AppContext::load()?;
    ctx.backend.logout()?;
    ctx.adopt_identity(None);

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({}))).unwrap()
        );
    } else {
        println!("Signed out.");
    }
    Ok(0)
}

pub fn run_whoami(json_output: bool) -> i32 {
    finish(whoami_inner(json_output), json_output)
}

fn whoami_inner(json_output: bool) -> Result<i32, StudyError> {
    let ctx = AppContext::load()?;
    // Prefer the backend's answer; fall back to the persisted session if
    // the network is down.
    let user = match ctx.backend.me() {
        Ok(user) => user,
        Err(_) => ctx.require_user()?,
    };

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "user": output::json::user_json(&user)
            })))
            .unwrap()
        );
    } else {
        println!("{} ({})", user.username, user.email);
    }
    Ok(0)
}

fn resolve_password(password: Option<&str>) -> Result<String, StudyError> {
    if let Some(password) = password {
        return Ok(password.to_string());
    }
    eprint!("Password: ");
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(StudyError::validation("Password must not be empty"));
    }
    Ok(password)
}
