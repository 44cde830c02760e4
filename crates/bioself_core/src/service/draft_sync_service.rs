//! Promotion of offline condition drafts into the encrypted store.
//!
//! # Responsibility
//! - Move every pending draft into the canonical store via `add_condition`.
//! - Leave invalid drafts pending with the reason recorded.
//!
//! # Invariants
//! - Re-running after a crash never duplicates a condition: the store
//!   dedupes on `origin_draft`, and a draft already present is only marked
//!   synced.
//! - A store failure (conflict, persist) stops the run; drafts not yet
//!   promoted stay pending.

use crate::model::ValidationError;
use crate::repo::draft_repo::{ConditionDraftRepository, DraftError};
use crate::store::{Store, StoreError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

#[derive(Debug)]
pub enum DraftSyncError {
    Draft(DraftError),
    Store(StoreError),
}

impl Display for DraftSyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DraftSyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Draft(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<DraftError> for DraftSyncError {
    fn from(value: DraftError) -> Self {
        Self::Draft(value)
    }
}

impl From<StoreError> for DraftSyncError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DraftSyncReport {
    /// Drafts inserted as new conditions in this run.
    pub promoted: Vec<Uuid>,
    /// Drafts whose condition was already in the store.
    pub already_present: Vec<Uuid>,
    /// Drafts left pending because they failed validation.
    pub invalid: Vec<(Uuid, ValidationError)>,
}

pub struct DraftSyncService<R: ConditionDraftRepository> {
    repo: R,
}

impl<R: ConditionDraftRepository> DraftSyncService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn sync_into(&self, store: &mut Store) -> Result<DraftSyncReport, DraftSyncError> {
        let mut report = DraftSyncReport::default();
        for draft in self.repo.list_pending()? {
            let input = match draft.to_new_condition() {
                Ok(input) => input,
                Err(err) => {
                    self.repo.record_sync_failure(draft.id, &err.to_string())?;
                    report.invalid.push((draft.id, err));
                    continue;
                }
            };

            let already = store
                .get()
                .conditions
                .iter()
                .any(|condition| condition.origin_draft == Some(draft.id));
            if !already {
                match store.add_condition(input) {
                    Ok(_) => {}
                    Err(StoreError::Validation(err)) => {
                        self.repo.record_sync_failure(draft.id, &err.to_string())?;
                        report.invalid.push((draft.id, err));
                        continue;
                    }
                    Err(err) => {
                        warn!(
                            "event=draft_sync module=service status=error error_code={} promoted={}",
                            err.kind(),
                            report.promoted.len()
                        );
                        return Err(err.into());
                    }
                }
            }

            self.repo.mark_synced(draft.id)?;
            if already {
                report.already_present.push(draft.id);
            } else {
                report.promoted.push(draft.id);
            }
        }

        info!(
            "event=draft_sync module=service status=ok promoted={} already_present={} invalid={}",
            report.promoted.len(),
            report.already_present.len(),
            report.invalid.len()
        );
        Ok(report)
    }
}

/// Promotes every pending draft in `repo` into `store`.
pub fn sync_condition_drafts<R: ConditionDraftRepository>(
    store: &mut Store,
    repo: R,
) -> Result<DraftSyncReport, DraftSyncError> {
    DraftSyncService::new(repo).sync_into(store)
}
