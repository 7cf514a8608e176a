//! `taskctl` -- command-line front end for the task list client.
//!
//! # Usage
//!
//! ```bash
//! # List tasks from the default server (http://localhost:8080)
//! taskctl list
//!
//! # Add a task against another server
//! taskctl --base-url http://127.0.0.1:3000 add "Buy milk" -d "2% please"
//!
//! # Or via environment variable
//! TASKLIST_API_URL=http://127.0.0.1:3000 taskctl done 3
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tasklist_core::{
    ClientConfig, ConfigOverrides, CreateTaskRequest, HttpClient, HttpTaskRepository, TaskId,
    TaskStore, TaskValidator, ViewState,
};

#[derive(Parser, Debug)]
#[command(version, about = "Manage tasks on a remote task list")]
struct Cli {
    /// Base URL of the task API.
    #[arg(long, env = "TASKLIST_API_URL", global = true)]
    base_url: Option<String>,

    /// Request timeout in milliseconds.
    #[arg(long, env = "TASKLIST_TIMEOUT_MS", global = true)]
    timeout_ms: Option<u64>,

    /// Bearer token sent with every request.
    #[arg(long, env = "TASKLIST_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Path to config file (default: `~/.config/tasklist/config.toml`).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn", env = "TASKLIST_LOG", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show all tasks.
    List,
    /// Create a task.
    Add {
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Mark a task as completed.
    Done { id: TaskId },
    /// Reload the list as a pull-to-refresh would.
    Refresh,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let overrides = ConfigOverrides {
        base_url: cli.base_url.clone(),
        timeout_ms: cli.timeout_ms,
        auth_token: cli.token.clone(),
    };
    let config = ClientConfig::load(cli.config.as_deref(), &overrides)
        .context("loading configuration")?;
    tracing::debug!(base_url = %config.base_url, timeout = ?config.timeout, "configuration loaded");

    let validator = TaskValidator::new(config.validation);
    let store = TaskStore::new(HttpTaskRepository::new(HttpClient::from_config(&config)));

    match cli.command {
        Command::List => store.fetch_tasks().await,
        Command::Refresh => store.refresh_tasks().await,
        Command::Add { title, description } => {
            let request = CreateTaskRequest::new(title, description).trimmed();
            let validation = validator.validate_task(&request);
            if !validation.is_valid {
                bail!("invalid task: {}", validation.errors.join("; "));
            }
            let task = store
                .create_task(&request)
                .await
                .context("creating task")?;
            println!("created #{} {}", task.id, task.title);
        }
        Command::Done { id } => {
            store.fetch_tasks().await;
            if store.state().task(id).is_none() {
                tracing::warn!(id, "task not in the fetched list");
            }
            store.complete_task(id).await;
        }
    }

    let state = store.state();
    if let Some(error) = &state.error {
        bail!("{error}");
    }
    render(&state);
    Ok(())
}

fn render(state: &ViewState) {
    for task in &state.tasks {
        let mark = if task.completed { 'x' } else { ' ' };
        if task.description.is_empty() {
            println!("[{mark}] {:>4}  {}", task.id, task.title);
        } else {
            println!("[{mark}] {:>4}  {}  ({})", task.id, task.title, task.description);
        }
    }
    let stats = state.stats();
    println!(
        "{} tasks, {} completed, {} pending",
        stats.total, stats.completed, stats.pending
    );
}
