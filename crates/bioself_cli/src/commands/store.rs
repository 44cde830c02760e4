use crate::error::{CliError, CliResult};
use bioself_core::{passphrase_from_env, EntityKind, Store, StoreConfig};
use uuid::Uuid;

/// Unlocks the configured store with `$BIOSELF_PASSPHRASE`.
pub fn unlock(config: &StoreConfig) -> CliResult<Store> {
    let passphrase = passphrase_from_env()?;
    Ok(Store::unlock(config, &passphrase)?)
}

pub fn run_init(config: &StoreConfig) -> CliResult<()> {
    let passphrase = passphrase_from_env()?;
    let store = Store::create(config, &passphrase)?;
    println!("store created: {}", store.path().display());
    store.lock();
    Ok(())
}

pub fn run_remove(config: &StoreConfig, kind: &str, id: &str, reason: &str) -> CliResult<()> {
    let kind = EntityKind::parse(kind).ok_or_else(|| {
        CliError::new("invalid_argument", format!("unknown entity kind `{kind}`"))
    })?;
    let id = Uuid::parse_str(id.trim())
        .map_err(|err| CliError::new("invalid_argument", format!("bad entity id: {err}")))?;
    let mut store = unlock(config)?;
    let snapshot = store.remove_entity(kind, id, reason)?;
    println!("removed {kind} {id} revision={}", snapshot.revision);
    Ok(())
}
