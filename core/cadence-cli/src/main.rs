//! cadence: terminal host for routine sessions.
//!
//! ## Subcommands
//!
//! - `run`: work through a routine interactively, with restore on reopen
//! - `status`: print the saved snapshot for a routine
//! - `discard`: drop the saved snapshot for a routine
//! - `history`: list finished sessions
//! - `delete`: delete a routine definition file

mod backend;
mod commands;
mod logging;
mod render;
mod run;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cadence_core::{load_timer_config, StorageConfig, TimerConfig};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Routine session timer")]
#[command(version)]
struct Cli {
    /// Data directory (defaults to ~/.cadence)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a routine interactively
    Run {
        /// Routine definition (JSON)
        #[arg(value_name = "ROUTINE")]
        routine: PathBuf,
    },

    /// Show the saved session for a routine
    Status {
        #[arg(value_name = "ROUTINE_ID")]
        routine_id: String,
    },

    /// Discard the saved session for a routine
    Discard {
        #[arg(value_name = "ROUTINE_ID")]
        routine_id: String,
    },

    /// List recorded sessions
    History {
        /// Only sessions of this routine
        #[arg(long, value_name = "ROUTINE_ID")]
        routine: Option<String>,
    },

    /// Delete a routine definition file
    Delete {
        #[arg(value_name = "ROUTINE")]
        routine: PathBuf,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let storage = match cli.root {
        Some(root) => StorageConfig::with_root(root),
        None => match StorageConfig::from_home() {
            Ok(storage) => storage,
            Err(err) => {
                eprintln!("cadence: {err}");
                std::process::exit(1);
            }
        },
    };
    let _logging_guard = logging::init(&storage.logs_dir());
    let config = timer_config(&storage);

    let result = match cli.command {
        Commands::Run { routine } => run::run(&storage, config, &routine),
        Commands::Status { routine_id } => commands::status(&storage, &config, &routine_id),
        Commands::Discard { routine_id } => commands::discard(&storage, &config, &routine_id),
        Commands::History { routine } => commands::history(&storage, routine.as_deref()),
        Commands::Delete { routine, yes } => commands::delete(&storage, config, &routine, yes),
    };

    if let Err(err) = result {
        tracing::error!(error = %err, "cadence command failed");
        eprintln!("cadence: {err}");
        std::process::exit(1);
    }
}

/// A broken config file should not keep anyone from their routine.
fn timer_config(storage: &StorageConfig) -> TimerConfig {
    load_timer_config(&storage.config_file()).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "Falling back to default timer config");
        TimerConfig::default()
    })
}
