use super::store::unlock;
use crate::error::{CliError, CliResult};
use bioself_core::db::open_db;
use bioself_core::{sync_condition_drafts, SqliteConditionDraftRepository, StoreConfig};
use std::path::Path;

pub fn run_sync_drafts(config: &StoreConfig, drafts_path: &Path) -> CliResult<()> {
    if !drafts_path.exists() {
        return Err(CliError::new(
            "draft_cache_unavailable",
            format!("no draft cache at `{}`", drafts_path.display()),
        ));
    }
    let conn = open_db(drafts_path)?;
    let mut store = unlock(config)?;
    let report = sync_condition_drafts(&mut store, SqliteConditionDraftRepository::new(&conn))?;

    println!(
        "condition drafts: promoted={} already_present={} invalid={}",
        report.promoted.len(),
        report.already_present.len(),
        report.invalid.len()
    );
    for (id, err) in &report.invalid {
        eprintln!("  draft {id}: {err}");
    }
    Ok(())
}
