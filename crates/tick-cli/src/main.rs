mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, task::TaskArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tick",
    about = "Keep Jira tasks, git branches, pull requests and logged time in step",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ~/.tick/config.yaml)
    #[arg(long, global = true, env = "TICK_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show unresolved tasks assigned to you
    Status,

    /// Stop the current task and move it back to To Do if in progress
    Stop,

    /// Work on, move, log time against or open a pull request for a task
    Task(TaskArgs),

    /// Manage configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = tick_core::paths::resolve_config_path(cli.config.as_deref())
        .map_err(anyhow::Error::from)
        .and_then(|path| match cli.command {
            Commands::Status => cmd::status::run(&path, cli.json),
            Commands::Stop => cmd::stop::run(&path, cli.json),
            Commands::Task(args) => cmd::task::run(&path, args, cli.json),
            Commands::Config { subcommand } => cmd::config::run(&path, subcommand, cli.json),
        });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
