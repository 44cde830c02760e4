//! Encrypted aggregate store.
//!
//! # Responsibility
//! - Hold the only decrypted copy of the aggregate and the derived key.
//! - Be the only writer of the encrypted store file.
//! - Validate, dedupe and stamp entities on every mutation.
//!
//! # Invariants
//! - Memory and disk never diverge: the in-memory snapshot is replaced only
//!   after the new encrypted snapshot has been atomically written.
//! - Every persist checks the on-disk revision first and fails with
//!   `Conflict` instead of overwriting a newer file.
//! - Key and document live only as long as the handle; nothing is global.
//!
//! # Known limitation
//! - The revision check and the rename are not one atomic step, so two
//!   processes persisting within the same instant can still race.

mod error;
mod ops;

pub use error::{StoreError, StoreResult};
pub use ops::BatchOutcome;

use crate::config::StoreConfig;
use crate::crypto::{self, CryptoError, DerivedKey, KdfParams, SALT_LEN};
use crate::model::{BiologicalSelf, SUPPORTED_SCHEMA_VERSIONS};
use crate::storage::{self, Envelope, EnvelopeError, FileError};
use chrono::{DateTime, Duration, Utc};
use log::{error, info, warn};
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use zeroize::Zeroizing;

/// Immutable point-in-time view of the aggregate.
pub type Snapshot = Arc<BiologicalSelf>;

/// Unlocked store handle.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    salt: [u8; SALT_LEN],
    kdf: KdfParams,
    key: DerivedKey,
    doc: Snapshot,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaProbe {
    schema_version: u32,
}

#[derive(Deserialize)]
struct RevisionProbe {
    revision: u64,
}

impl Store {
    /// Whether a file is present at `path`.
    pub fn exists(path: impl AsRef<Path>) -> bool {
        path.as_ref().exists()
    }

    /// Creates and persists an empty store.
    ///
    /// # Errors
    /// - `StoreAlreadyExists` if any file is present at the configured path,
    ///   including one another process created while this call ran.
    /// - `PersistFailure` if the first write fails.
    pub fn create(config: &StoreConfig, passphrase: &str) -> StoreResult<Self> {
        let started_at = Instant::now();
        let path = config.store_path.clone();
        if Self::exists(&path) {
            warn!("event=store_create module=store status=error error_code=store_already_exists");
            return Err(StoreError::StoreAlreadyExists(path));
        }

        let material = crypto::create(passphrase, config.kdf)?;
        let doc = BiologicalSelf::empty(Utc::now());
        let bytes = seal_document(&doc, &material.salt, &material.kdf, &material.key)?;
        if let Err(err) = storage::write_new(&path, &bytes) {
            if err.kind() == io::ErrorKind::AlreadyExists {
                warn!("event=store_create module=store status=error error_code=store_already_exists");
                return Err(StoreError::StoreAlreadyExists(path));
            }
            error!(
                "event=store_create module=store status=error duration_ms={} error_code=persist_failure error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(StoreError::PersistFailure(err));
        }

        info!(
            "event=store_create module=store status=ok duration_ms={} memory_kib={} iterations={}",
            started_at.elapsed().as_millis(),
            material.kdf.memory_kib,
            material.kdf.iterations
        );
        Ok(Self {
            path,
            salt: material.salt,
            kdf: material.kdf,
            key: material.key,
            doc: Arc::new(doc),
        })
    }

    /// Decrypts an existing store with `passphrase`.
    ///
    /// The KDF parameters recorded in the file header are used, not the ones
    /// in `config`.
    pub fn unlock(config: &StoreConfig, passphrase: &str) -> StoreResult<Self> {
        let started_at = Instant::now();
        let path = config.store_path.clone();
        let result = read_envelope(&path).and_then(|envelope| {
            let key = crypto::derive_key(passphrase, &envelope.salt, &envelope.kdf)
                .map_err(header_params_error)?;
            let doc = open_document(&envelope, &key)?;
            Ok(Self {
                path,
                salt: envelope.salt,
                kdf: envelope.kdf,
                key,
                doc: Arc::new(doc),
            })
        });

        match &result {
            Ok(store) => info!(
                "event=store_unlock module=store status=ok duration_ms={} revision={}",
                started_at.elapsed().as_millis(),
                store.doc.revision
            ),
            Err(err) => warn!(
                "event=store_unlock module=store status=error duration_ms={} error_code={}",
                started_at.elapsed().as_millis(),
                err.kind()
            ),
        }
        result
    }

    /// Current snapshot. Later mutations are only visible through a new call.
    pub fn get(&self) -> Snapshot {
        Arc::clone(&self.doc)
    }

    pub fn revision(&self) -> u64 {
        self.doc.revision
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-reads the file with the held key, adopting the on-disk revision.
    ///
    /// Used to recover after `Conflict`. Fails with
    /// `WrongPassphraseOrCorruptStore` if the file was replaced by a store
    /// with a different salt.
    pub fn reload(&mut self) -> StoreResult<Snapshot> {
        let envelope = read_envelope(&self.path)?;
        if envelope.salt != self.salt || envelope.kdf != self.kdf {
            warn!("event=store_reload module=store status=error error_code=salt_mismatch");
            return Err(StoreError::WrongPassphraseOrCorruptStore);
        }
        let doc = open_document(&envelope, &self.key)?;
        info!(
            "event=store_reload module=store status=ok from_revision={} to_revision={}",
            self.doc.revision, doc.revision
        );
        self.doc = Arc::new(doc);
        Ok(self.get())
    }

    /// Drops the decrypted aggregate and wipes the key.
    pub fn lock(self) {
        info!(
            "event=store_lock module=store status=ok revision={}",
            self.doc.revision
        );
    }

    /// Clones the current aggregate, applies `mutate`, persists, then swaps.
    ///
    /// `mutate` receives the commit stamp and returns whether anything
    /// changed; an unchanged aggregate is neither persisted nor re-stamped.
    pub(crate) fn commit<F>(&mut self, op: &'static str, mutate: F) -> StoreResult<Snapshot>
    where
        F: FnOnce(&mut BiologicalSelf, DateTime<Utc>) -> StoreResult<bool>,
    {
        let started_at = Instant::now();
        let mut next = BiologicalSelf::clone(&self.doc);
        let stamp = stamp_after(next.updated_at, Utc::now());

        let changed = match mutate(&mut next, stamp) {
            Ok(changed) => changed,
            Err(err) => {
                warn!(
                    "event=store_mutation module=store status=error op={} error_code={}",
                    op,
                    err.kind()
                );
                return Err(err);
            }
        };
        if !changed {
            info!(
                "event=store_mutation module=store status=skipped op={} revision={}",
                op, self.doc.revision
            );
            return Ok(self.get());
        }

        next.revision = self.doc.revision + 1;
        next.updated_at = stamp;
        if let Err(err) = self.persist(&next) {
            error!(
                "event=store_mutation module=store status=error op={} duration_ms={} error_code={} error={}",
                op,
                started_at.elapsed().as_millis(),
                err.kind(),
                err
            );
            return Err(err);
        }

        self.doc = Arc::new(next);
        info!(
            "event=store_mutation module=store status=ok op={} duration_ms={} revision={}",
            op,
            started_at.elapsed().as_millis(),
            self.doc.revision
        );
        Ok(self.get())
    }

    fn persist(&self, next: &BiologicalSelf) -> StoreResult<()> {
        self.check_revision()?;
        let bytes = seal_document(next, &self.salt, &self.kdf, &self.key)?;
        storage::write_atomic(&self.path, &bytes).map_err(StoreError::PersistFailure)
    }

    fn check_revision(&self) -> StoreResult<()> {
        let expected = self.doc.revision;
        let unreadable = || StoreError::Conflict {
            expected,
            found: None,
        };

        let bytes = match storage::read_all(&self.path) {
            Ok(bytes) => bytes,
            Err(FileError::StoreNotFound(path)) => {
                return Err(StoreError::PersistFailure(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("store file `{}` disappeared", path.display()),
                )));
            }
            Err(FileError::Io(err)) => return Err(StoreError::PersistFailure(err)),
        };
        let envelope = Envelope::decode(&bytes).map_err(|_| unreadable())?;
        if envelope.salt != self.salt || envelope.kdf != self.kdf {
            return Err(unreadable());
        }
        let plaintext = crypto::open(&envelope.sealed, &self.key, &envelope.associated_data())
            .map_err(|_| unreadable())?;
        let probe: RevisionProbe =
            serde_json::from_slice(&plaintext).map_err(|_| unreadable())?;

        if probe.revision != expected {
            warn!(
                "event=store_persist module=store status=conflict expected={} found={}",
                expected, probe.revision
            );
            return Err(StoreError::Conflict {
                expected,
                found: Some(probe.revision),
            });
        }
        Ok(())
    }
}

/// Returns `now`, or one millisecond past `prev` when the clock has not
/// advanced past it.
pub(crate) fn stamp_after(prev: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > prev {
        now
    } else {
        prev + Duration::milliseconds(1)
    }
}

fn read_envelope(path: &Path) -> StoreResult<Envelope> {
    let bytes = storage::read_all(path).map_err(|err| match err {
        FileError::StoreNotFound(path) => StoreError::StoreNotFound(path),
        FileError::Io(err) => StoreError::ReadFailure(err),
    })?;
    Envelope::decode(&bytes).map_err(|err| match err {
        EnvelopeError::UnsupportedFormatVersion(version) => {
            StoreError::SchemaError(format!("unsupported file format version {version}"))
        }
        EnvelopeError::Truncated { .. } | EnvelopeError::BadMagic => {
            StoreError::WrongPassphraseOrCorruptStore
        }
    })
}

/// Out-of-range header parameters mean the header itself is damaged.
fn header_params_error(err: CryptoError) -> StoreError {
    match err {
        CryptoError::InvalidParams(_) => StoreError::WrongPassphraseOrCorruptStore,
        other => StoreError::from(other),
    }
}

fn open_document(envelope: &Envelope, key: &DerivedKey) -> StoreResult<BiologicalSelf> {
    let plaintext = crypto::open(&envelope.sealed, key, &envelope.associated_data())?;
    decode_document(&plaintext)
}

fn decode_document(plaintext: &[u8]) -> StoreResult<BiologicalSelf> {
    let probe: SchemaProbe = serde_json::from_slice(plaintext)
        .map_err(|err| StoreError::SchemaError(format!("missing schema version: {err}")))?;
    if !SUPPORTED_SCHEMA_VERSIONS.contains(&probe.schema_version) {
        return Err(StoreError::SchemaError(format!(
            "schema version {} is not supported",
            probe.schema_version
        )));
    }
    serde_json::from_slice(plaintext).map_err(|err| StoreError::SchemaError(err.to_string()))
}

fn seal_document(
    doc: &BiologicalSelf,
    salt: &[u8; SALT_LEN],
    kdf: &KdfParams,
    key: &DerivedKey,
) -> StoreResult<Vec<u8>> {
    let plaintext = Zeroizing::new(
        serde_json::to_vec(doc).map_err(|err| StoreError::SchemaError(err.to_string()))?,
    );
    let associated_data = storage::header_prefix(salt, kdf);
    let sealed = crypto::seal(&plaintext, key, &associated_data)?;
    Ok(Envelope {
        salt: *salt,
        kdf: *kdf,
        sealed,
    }
    .encode())
}

#[cfg(test)]
mod tests {
    use super::{decode_document, stamp_after, StoreError};
    use chrono::{Duration, Utc};

    #[test]
    fn stamp_after_is_strictly_increasing_when_clock_stalls() {
        let prev = Utc::now();
        assert_eq!(stamp_after(prev, prev), prev + Duration::milliseconds(1));
        assert_eq!(
            stamp_after(prev, prev - Duration::seconds(5)),
            prev + Duration::milliseconds(1)
        );
        let later = prev + Duration::seconds(1);
        assert_eq!(stamp_after(prev, later), later);
    }

    #[test]
    fn decode_rejects_unknown_schema_version() {
        let err = decode_document(br#"{"schemaVersion": 99, "revision": 1}"#).unwrap_err();
        assert!(matches!(err, StoreError::SchemaError(_)));
    }

    #[test]
    fn decode_rejects_non_aggregate_json() {
        let err = decode_document(br#"["not", "an", "aggregate"]"#).unwrap_err();
        assert_eq!(err.kind(), "schema_error");
    }
}
