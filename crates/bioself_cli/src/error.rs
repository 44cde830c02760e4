use bioself_core::db::DbError;
use bioself_core::{ConfigError, DraftError, DraftSyncError, ImportError, StoreError};
use std::fmt::{Display, Formatter};
use std::io;

pub type CliResult<T> = Result<T, CliError>;

/// Failure printed as `error[<kind>]: <message>`.
#[derive(Debug)]
pub struct CliError {
    pub kind: &'static str,
    pub message: String,
}

impl CliError {
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "error[{}]: {}", self.kind, self.message)
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::new(value.kind(), value.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        let kind = match value {
            ConfigError::PassphraseUnset => "passphrase_unset",
            ConfigError::StorePathUnset => "store_path_unset",
        };
        Self::new(kind, value.to_string())
    }
}

impl From<ImportError> for CliError {
    fn from(value: ImportError) -> Self {
        Self::new("import_failure", value.to_string())
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::new(value.kind(), value.to_string())
    }
}

impl From<DraftSyncError> for CliError {
    fn from(value: DraftSyncError) -> Self {
        match value {
            DraftSyncError::Store(err) => err.into(),
            DraftSyncError::Draft(DraftError::Db(err)) => err.into(),
            DraftSyncError::Draft(err) => Self::new("draft_cache_failure", err.to_string()),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(value: io::Error) -> Self {
        Self::new("io_failure", value.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::new("output_failure", value.to_string())
    }
}
