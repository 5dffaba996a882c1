use clap::Parser;
use std::process;

use tracing_subscriber::EnvFilter;

use studytrack::cli;
use studytrack::cli::commands::{Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli_args = Cli::parse();
    let json_output = cli_args.json;

    let exit_code = match cli_args.command {
        Commands::Init { api_url } => cli::init::run(&api_url, json_output),
        Commands::Login { email, password } => {
            cli::auth::run_login(&email, password.as_deref(), json_output)
        }
        Commands::Signup {
            email,
            username,
            password,
        } => cli::auth::run_signup(&email, &username, password.as_deref(), json_output),
        Commands::Logout => cli::auth::run_logout(json_output),
        Commands::Whoami => cli::auth::run_whoami(json_output),
        Commands::Task(cmd) => cli::task::run(&cmd, json_output),
        Commands::Goal(cmd) => cli::goal::run(&cmd, json_output),
        Commands::Summary(cmd) => cli::summary::run(&cmd, json_output),
        Commands::Status => cli::status::run(json_output),
    };

    process::exit(exit_code);
}
