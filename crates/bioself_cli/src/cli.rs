use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bioself")]
#[command(about = "BioSelf encrypted health record: import and inspect")]
pub struct Cli {
    /// Store file; defaults to $BIOSELF_STORE_PATH.
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
    /// Absolute directory for rolling log files. No logging when omitted.
    #[arg(long = "log-dir", global = true)]
    pub log_dir: Option<String>,
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty store protected by $BIOSELF_PASSPHRASE.
    Init,
    /// Print the dashboard projection as JSON.
    Summary,
    /// Print the timeline, newest first.
    Timeline {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Print mean wearable metrics over the trailing window.
    Recovery {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    Import {
        #[command(subcommand)]
        cmd: ImportCmd,
    },
    /// Promote pending condition drafts from a SQLite draft cache.
    SyncDrafts { drafts_path: PathBuf },
    /// Delete one entity and record why in the audit log.
    Remove {
        /// condition, symptom, imaging, cycle or workout.
        kind: String,
        id: String,
        #[arg(long)]
        reason: String,
    },
}

#[derive(Subcommand)]
pub enum ImportCmd {
    /// Whoop physiological cycles export (CSV).
    WhoopCycles { csv_path: PathBuf },
    /// Whoop workouts export (CSV).
    WhoopWorkouts { csv_path: PathBuf },
    /// Structured imaging reports (JSON array).
    Imaging { json_path: PathBuf },
}
