//! `bioself` command line: batch import and inspection of one store.
//!
//! # Responsibility
//! - Resolve store path, passphrase and logging from flags and environment.
//! - Map every failure to `error[<kind>]: <message>` and a non-zero exit.

mod cli;
mod commands {
    pub mod drafts;
    pub mod import;
    pub mod inspect;
    pub mod store;
}
mod error;

use bioself_core::config::{log_level_from_lookup, resolve_store_path};
use bioself_core::{init_logging, StoreConfig};
use clap::Parser;
use cli::{Cli, Command, ImportCmd};
use error::{CliError, CliResult};

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn run(cli: Cli) -> CliResult<()> {
    if let Some(log_dir) = &cli.log_dir {
        init_logging(&log_level_from_lookup(env_lookup), log_dir)
            .map_err(|message| CliError::new("logging_failure", message))?;
    }
    let store_path = resolve_store_path(cli.store.as_deref(), env_lookup)?;
    let config = StoreConfig::new(store_path);

    match cli.cmd {
        Command::Init => commands::store::run_init(&config),
        Command::Summary => commands::inspect::run_summary(&config),
        Command::Timeline { limit } => commands::inspect::run_timeline(&config, limit),
        Command::Recovery { days } => commands::inspect::run_recovery(&config, days),
        Command::Import { cmd } => match cmd {
            ImportCmd::WhoopCycles { csv_path } => {
                commands::import::run_whoop_cycles(&config, &csv_path)
            }
            ImportCmd::WhoopWorkouts { csv_path } => {
                commands::import::run_whoop_workouts(&config, &csv_path)
            }
            ImportCmd::Imaging { json_path } => commands::import::run_imaging(&config, &json_path),
        },
        Command::SyncDrafts { drafts_path } => {
            commands::drafts::run_sync_drafts(&config, &drafts_path)
        }
        Command::Remove { kind, id, reason } => {
            commands::store::run_remove(&config, &kind, &id, &reason)
        }
    }
}

fn main() {
    if let Err(err) = run(Cli::parse()) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
