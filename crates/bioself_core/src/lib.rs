//! Core of the BioSelf personal health record.
//!
//! One encrypted aggregate document per store file, written by the
//! interactive app, batch importers and the CLI, read through projections.
//! This crate is the single source of truth for its invariants.

pub mod config;
pub mod crypto;
pub mod db;
pub mod import;
pub mod logging;
pub mod model;
pub mod projection;
pub mod repo;
pub mod service;
pub mod storage;
pub mod store;

pub use config::{passphrase_from_env, ConfigError, StoreConfig};
pub use crypto::{CryptoError, KdfParams};
pub use import::{
    parse_cycles_csv, parse_imaging_json, parse_workouts_csv, ImportError, ImportReport,
    RowFailure, RowOutcome,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::{
    BiologicalSelf, Condition, ConditionPatch, ConditionStatus, EntityKind, ImagingModality,
    ImagingReport, ImagingReportPatch, NewCondition, NewImagingReport, NewSymptom,
    NewWhoopCycle, NewWhoopWorkout, Severity, Symptom, SymptomPatch, SymptomStatus,
    ValidationError, WhoopCycle, WhoopCyclePatch, WhoopMetric, WhoopWorkout, WhoopWorkoutPatch,
};
pub use projection::{
    get_active_conditions, get_dashboard, get_recovery_summary, get_timeline,
    get_timeline_filtered, Dashboard, RecoverySummary, TimelineEvent, TimelineFilter,
    TimelineKind,
};
pub use repo::draft_repo::{
    ConditionDraft, ConditionDraftRepository, DraftError, NewConditionDraft,
    SqliteConditionDraftRepository,
};
pub use service::draft_sync_service::{
    sync_condition_drafts, DraftSyncError, DraftSyncReport, DraftSyncService,
};
pub use store::{BatchOutcome, Snapshot, Store, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
