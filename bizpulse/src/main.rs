//! bizpulse - client, project and time tracking with business analytics
//!
//! Command-line front end over the bizpulse record stores and analytics
//! engine. Every command opens the database, does one thing and exits.

mod args;
mod records;
mod report;

use anyhow::{Context, Result};
use bizpulse_core::{Config, Database, Workspace};
use clap::{Parser, Subcommand, ValueEnum};

use crate::records::{ClientCommand, ProjectCommand, TaskCommand, TimeCommand, TimerCommand};
use crate::report::ReportArgs;

#[derive(Parser)]
#[command(name = "bizpulse")]
#[command(about = "Track clients, projects and time, and report on the business")]
#[command(version)]
struct Cli {
    /// Output format: text (default) or json
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Manage clients
    #[command(subcommand)]
    Client(ClientCommand),

    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Log and list time entries
    #[command(subcommand)]
    Time(TimeCommand),

    /// Start, stop and inspect the running timer
    #[command(subcommand)]
    Timer(TimerCommand),

    /// Show an analytics report
    Report(ReportArgs),

    /// Recompute every derived count and cached name
    Repair,
}

/// Everything a command needs.
pub struct CliContext {
    pub workspace: Workspace,
    pub config: Config,
    pub format: OutputFormat,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging (to file, stdout is for command output)
    let _log_guard =
        bizpulse_core::logging::init(&config.logging).context("failed to initialize logging")?;

    // Open database
    let db_path = Config::database_path();
    tracing::debug!(path = %db_path.display(), "Opening database");
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let ctx = CliContext {
        workspace: Workspace::new(db),
        config,
        format: cli.format,
    };

    match cli.command {
        Command::Client(cmd) => records::client(&ctx, cmd),
        Command::Project(cmd) => records::project(&ctx, cmd),
        Command::Task(cmd) => records::task(&ctx, cmd),
        Command::Time(cmd) => records::time(&ctx, cmd),
        Command::Timer(cmd) => records::timer(&ctx, cmd),
        Command::Report(args) => report::run(&ctx, args),
        Command::Repair => repair(&ctx),
    }
}

fn repair(ctx: &CliContext) -> Result<()> {
    let report = ctx
        .workspace
        .repair()
        .context("failed to repair derived fields")?;

    match ctx.format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            println!("Repair complete:");
            println!("  Clients fixed:  {}", report.clients_fixed);
            println!("  Projects fixed: {}", report.projects_fixed);
            println!("  Tasks fixed:    {}", report.tasks_fixed);
        }
    }
    Ok(())
}

/// Pretty-print any serializable value to stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
