//! SPOrganiser CLI - Command-line interface
//!
//! Sorts X-Plane's `Custom Scenery` folder into a conflict-resolved
//! `scenery_packs.ini`.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use sporganiser::logging::{default_log_dir, init_logging, LOG_FILE_NAME};

use commands::cache::CacheAction;
use commands::check::CheckArgs;
use commands::config::ConfigCommands;
use commands::run::RunArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "sporganiser")]
#[command(version = sporganiser::VERSION)]
#[command(about = "Sort X-Plane Custom Scenery into a conflict-resolved scenery_packs.ini", long_about = None)]
struct Cli {
    /// Print log output to stderr and lower the default level to debug
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every pack, resolve conflicts and write scenery_packs.ini
    Run(RunArgs),

    /// Show what `run` would write, without touching any file
    Check(CheckArgs),

    /// Inspect or clear the airport cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// View or modify config.ini
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let _logging_guard = init_logging(&default_log_dir(), LOG_FILE_NAME, cli.verbose)
        .map_err(|e| CliError::LoggingInit(e.to_string()))
        .unwrap_or_else(|e| e.exit());

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Check(args) => commands::check::run(args),
        Commands::Cache { action } => commands::cache::run(action),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
