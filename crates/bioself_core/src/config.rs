//! Explicit store configuration and environment lookup.
//!
//! # Responsibility
//! - Carry the store path and KDF work factor to every call site.
//! - Read the passphrase for non-interactive tools from one environment
//!   variable only.
//!
//! # Invariants
//! - No process-wide store path, key or passphrase is ever cached here.
//! - A blank passphrase is treated the same as an unset one.

use crate::crypto::KdfParams;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

pub const PASSPHRASE_ENV: &str = "BIOSELF_PASSPHRASE";
pub const STORE_PATH_ENV: &str = "BIOSELF_STORE_PATH";
pub const LOG_LEVEL_ENV: &str = "BIOSELF_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    PassphraseUnset,
    StorePathUnset,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PassphraseUnset => write!(
                f,
                "{PASSPHRASE_ENV} is not set; export it before running batch tools"
            ),
            Self::StorePathUnset => write!(
                f,
                "no store path given; pass --store or set {STORE_PATH_ENV}"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Location and work factor of one store file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub store_path: PathBuf,
    pub kdf: KdfParams,
}

impl StoreConfig {
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            kdf: KdfParams::default(),
        }
    }

    /// Overrides the KDF cost used when creating a store.
    ///
    /// Unlock always uses the parameters recorded in the file header.
    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn path(&self) -> &Path {
        &self.store_path
    }
}

/// Reads the passphrase from the process environment.
///
/// # Errors
/// - [`ConfigError::PassphraseUnset`] when the variable is missing or blank.
pub fn passphrase_from_env() -> Result<Zeroizing<String>, ConfigError> {
    passphrase_from_lookup(|name| std::env::var(name).ok())
}

/// Same as [`passphrase_from_env`] with an injectable lookup.
pub fn passphrase_from_lookup<F>(lookup: F) -> Result<Zeroizing<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = Zeroizing::new(lookup(PASSPHRASE_ENV).ok_or(ConfigError::PassphraseUnset)?);
    if value.trim().is_empty() {
        return Err(ConfigError::PassphraseUnset);
    }
    Ok(value)
}

/// Resolves the store path: explicit flag first, then environment.
pub fn resolve_store_path<F>(explicit: Option<&Path>, lookup: F) -> Result<PathBuf, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    lookup(STORE_PATH_ENV)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .ok_or(ConfigError::StorePathUnset)
}

/// Log level from the environment, falling back to the build default.
pub fn log_level_from_lookup<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(LOG_LEVEL_ENV)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| crate::logging::default_log_level().to_string())
}
