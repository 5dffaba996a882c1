use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "studytrack",
    version,
    about = "Track study tasks, daily goals, and weekly streaks",
    after_help = "\
NOTE:
  Requires a configured backend. Run `studytrack init --api-url <url>` first,
  then `studytrack login <email>`.

CONFIG:
  State lives under $STUDYTRACK_HOME (default ~/.studytrack): config.json,
  session.json, and a per-user cache used when the backend is unreachable.

CATEGORIES:
  algorithms | development | system_design | job_search"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure the backend API URL
    Init {
        #[arg(long)]
        api_url: String,
    },

    /// Sign in (password read from stdin when omitted)
    Login {
        email: String,
        password: Option<String>,
    },

    /// Create an account (password read from stdin when omitted)
    Signup {
        email: String,
        username: String,
        password: Option<String>,
    },

    /// Sign out and clear the local session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Daily goals and weekly streaks
    #[command(subcommand)]
    Goal(GoalCommands),

    /// Stored study summaries
    #[command(subcommand)]
    Summary(SummaryCommands),

    /// Per-category overview of tasks and goals
    Status,
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task
    Add {
        title: String,
        #[arg(long)]
        category: String,
    },
    /// List tasks
    List {
        #[arg(long)]
        category: Option<String>,
    },
    /// Toggle completion (task ID or unique prefix)
    Toggle { id: String },
    /// Rename a task
    Edit { id: String, title: String },
    /// Delete a task
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Show goals (all categories, or one)
    Show {
        #[arg(long)]
        category: Option<String>,
    },
    /// Set the daily target for a category
    Set { category: String, target: u32 },
    /// Mark today's goal as completed
    Complete { category: String },
    /// Undo today's completion
    Uncomplete { category: String },
    /// Add progress units toward today's target
    AddProgress {
        category: String,
        #[arg(long, default_value = "1")]
        amount: u32,
    },
    /// Subtract progress units
    SubProgress {
        category: String,
        #[arg(long, default_value = "1")]
        amount: u32,
    },
    /// Show the task-derived weekly fallback view
    Week { category: String },
}

#[derive(Subcommand)]
pub enum SummaryCommands {
    /// List summaries
    List,
    /// Store a summary from inline content or a file
    Add {
        title: String,
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,
        #[arg(long)]
        file: Option<std::path::PathBuf>,
    },
    /// Delete a summary
    Delete { id: String },
}
