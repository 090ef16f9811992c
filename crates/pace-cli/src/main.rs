mod cmd;
mod notify;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    calendar::CalendarArgs, config::ConfigSubcommand, history::HistoryArgs, report::ReportArgs,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pace",
    about = "Epic delivery tracking: working-day velocity, allocation and progress logs",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .pace/ or .git/)
    #[arg(long, global = true, env = "PACE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch issues and produce the delivery report for each project
    Report(ReportArgs),

    /// List working days in a date range
    Calendar(CalendarArgs),

    /// Show a project's progress log
    History(HistoryArgs),

    /// Inspect and validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    // A missing .env is fine; settings may come from the environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Report(_) => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Report(args) => cmd::report::run(&root, args, cli.json),
        Commands::Calendar(args) => cmd::calendar::run(&root, args, cli.json),
        Commands::History(args) => cmd::history::run(&root, args, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
