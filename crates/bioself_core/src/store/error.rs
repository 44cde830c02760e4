use crate::crypto::CryptoError;
use crate::model::{EntityKind, ValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of a store operation. None of these are retried by the store.
#[derive(Debug)]
pub enum StoreError {
    /// `unlock` on a path with no store file.
    StoreNotFound(PathBuf),
    /// `create` on a path that already holds a file.
    StoreAlreadyExists(PathBuf),
    /// Tag did not verify, or the blob is not a store envelope at all.
    WrongPassphraseOrCorruptStore,
    /// Decrypted content matches no known schema version.
    SchemaError(String),
    Validation(ValidationError),
    /// Writing the next encrypted snapshot failed; memory was rolled back.
    PersistFailure(io::Error),
    /// The file's revision moved since this handle last loaded it.
    Conflict {
        expected: u64,
        /// `None` when the on-disk file is no longer readable with this key.
        found: Option<u64>,
    },
    EntityNotFound { kind: EntityKind, id: Uuid },
    /// Reading an existing store file failed for a reason other than absence.
    ReadFailure(io::Error),
    /// Key derivation or randomness failure not caused by the passphrase.
    Crypto(CryptoError),
}

impl StoreError {
    /// Stable snake_case code shown by the CLI and the bridge.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StoreNotFound(_) => "store_not_found",
            Self::StoreAlreadyExists(_) => "store_already_exists",
            Self::WrongPassphraseOrCorruptStore => "wrong_passphrase_or_corrupt_store",
            Self::SchemaError(_) => "schema_error",
            Self::Validation(_) => "validation_error",
            Self::PersistFailure(_) => "persist_failure",
            Self::Conflict { .. } => "conflict",
            Self::EntityNotFound { .. } => "entity_not_found",
            Self::ReadFailure(_) => "read_failure",
            Self::Crypto(_) => "crypto_failure",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreNotFound(path) => write!(f, "no store at `{}`", path.display()),
            Self::StoreAlreadyExists(path) => {
                write!(f, "a file already exists at `{}`", path.display())
            }
            Self::WrongPassphraseOrCorruptStore => {
                write!(f, "wrong passphrase or corrupt store file")
            }
            Self::SchemaError(message) => write!(f, "unrecognized store content: {message}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::PersistFailure(err) => write!(f, "failed to persist store: {err}"),
            Self::Conflict {
                expected,
                found: Some(found),
            } => write!(
                f,
                "store changed on disk (expected revision {expected}, found {found}); reload and retry"
            ),
            Self::Conflict {
                expected,
                found: None,
            } => write!(
                f,
                "store on disk is no longer revision {expected} of this store; reload and retry"
            ),
            Self::EntityNotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::ReadFailure(err) => write!(f, "failed to read store: {err}"),
            Self::Crypto(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::PersistFailure(err) | Self::ReadFailure(err) => Some(err),
            Self::Crypto(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CryptoError> for StoreError {
    fn from(value: CryptoError) -> Self {
        match value {
            CryptoError::AuthenticationFailed => Self::WrongPassphraseOrCorruptStore,
            other => Self::Crypto(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StoreError;
    use crate::crypto::CryptoError;
    use crate::model::ValidationError;

    #[test]
    fn authentication_failure_maps_to_wrong_passphrase() {
        let err = StoreError::from(CryptoError::AuthenticationFailed);
        assert_eq!(err.kind(), "wrong_passphrase_or_corrupt_store");
    }

    #[test]
    fn validation_message_names_field() {
        let err = StoreError::from(ValidationError::new("body_part", "must not be blank"));
        assert_eq!(err.kind(), "validation_error");
        assert!(err.to_string().contains("body_part"));
    }

    #[test]
    fn conflict_message_advises_reload() {
        let err = StoreError::Conflict {
            expected: 3,
            found: Some(4),
        };
        assert!(err.to_string().contains("reload"));
    }
}
