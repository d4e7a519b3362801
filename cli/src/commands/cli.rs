use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "agentbox", version, about = "Run multi-step agent tasks in per-task sandboxes")]
pub struct Args {
    /// Config file to load instead of ~/.agentbox/config.toml or ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the task store directory.
    #[arg(long, global = true)]
    pub tasks_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API and background workers.
    Serve(ServeArgs),
    /// Execute a task definition file in the foreground.
    Run(RunArgs),
    /// Show the status record of a task.
    Status(TaskIdArgs),
    /// Print the execution log of a task.
    Logs(TaskIdArgs),
    /// List known tasks, newest first.
    List(ListArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// JSON task definition (`{"steps": [...], "fail_fast": bool}`); `-` reads stdin.
    pub file: PathBuf,

    /// Stop at the first failed step regardless of the file's setting.
    #[arg(long)]
    pub fail_fast: bool,

    /// Print a human-readable summary instead of the status JSON.
    #[arg(long)]
    pub summary: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TaskIdArgs {
    pub task_id: String,

    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ListArgs {
    /// Show at most this many tasks.
    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long)]
    pub json: bool,
}
