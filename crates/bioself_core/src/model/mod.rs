//! Typed health record schema.
//!
//! # Responsibility
//! - Define the aggregate root and every entity it owns.
//! - Validate required fields, enum membership and numeric ranges.
//! - Derive natural keys used for idempotent import.
//!
//! # Invariants
//! - Entities are constructed only by the store (`create` is crate-private).
//! - Validation failures always name the offending field.
//!
//! # See also
//! - crate::store for mutation and persistence rules.

pub mod aggregate;
pub mod condition;
pub mod imaging;
pub mod symptom;
pub mod validation;
pub mod whoop;

pub use aggregate::{
    AuditAction, AuditEntry, BiologicalSelf, EntityKind, SCHEMA_VERSION,
    SUPPORTED_SCHEMA_VERSIONS,
};
pub use condition::{Condition, ConditionPatch, ConditionStatus, NewCondition, Severity};
pub use imaging::{ImagingKey, ImagingModality, ImagingReport, ImagingReportPatch, NewImagingReport};
pub use symptom::{
    DurationUnit, NewSymptom, Symptom, SymptomDuration, SymptomPatch, SymptomStatus,
    MAX_SYMPTOM_SEVERITY, MIN_SYMPTOM_SEVERITY,
};
pub use validation::{ValidationError, ValidationResult};
pub use whoop::{
    CycleMetrics, HeartRateZones, NewWhoopCycle, NewWhoopWorkout, WhoopCycle, WhoopCyclePatch,
    WhoopMetric, WhoopWorkout, WhoopWorkoutPatch,
};
