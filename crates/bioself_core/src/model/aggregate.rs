//! Aggregate root: the whole decrypted health record.
//!
//! # Invariants
//! - Exactly one aggregate per store file; it is the unit of encryption.
//! - `revision` starts at 1 and grows by one per persisted mutation.
//! - `audit_log` is append-only.

use super::condition::Condition;
use super::imaging::ImagingReport;
use super::symptom::Symptom;
use super::whoop::{WhoopCycle, WhoopWorkout};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;
/// Schema versions this build can decode.
pub const SUPPORTED_SCHEMA_VERSIONS: &[u32] = &[1];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Condition,
    Symptom,
    ImagingReport,
    WhoopCycle,
    WhoopWorkout,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        Self::Condition,
        Self::Symptom,
        Self::ImagingReport,
        Self::WhoopCycle,
        Self::WhoopWorkout,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Condition => "condition",
            Self::Symptom => "symptom",
            Self::ImagingReport => "imaging_report",
            Self::WhoopCycle => "whoop_cycle",
            Self::WhoopWorkout => "whoop_workout",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "condition" => Some(Self::Condition),
            "symptom" => Some(Self::Symptom),
            "imaging_report" | "imaging" => Some(Self::ImagingReport),
            "whoop_cycle" | "cycle" => Some(Self::WhoopCycle),
            "whoop_workout" | "workout" => Some(Self::WhoopWorkout),
            _ => None,
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Removed,
}

/// Record of an explicit, user-requested deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    pub action: AuditAction,
    pub kind: EntityKind,
    pub entity_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiologicalSelf {
    pub schema_version: u32,
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub symptoms: Vec<Symptom>,
    #[serde(default)]
    pub imaging_reports: Vec<ImagingReport>,
    #[serde(default)]
    pub whoop_cycles: Vec<WhoopCycle>,
    #[serde(default)]
    pub whoop_workouts: Vec<WhoopWorkout>,
    #[serde(default)]
    pub audit_log: Vec<AuditEntry>,
}

impl BiologicalSelf {
    pub(crate) fn empty(now: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            revision: 1,
            created_at: now,
            updated_at: now,
            conditions: Vec::new(),
            symptoms: Vec::new(),
            imaging_reports: Vec::new(),
            whoop_cycles: Vec::new(),
            whoop_workouts: Vec::new(),
            audit_log: Vec::new(),
        }
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Condition => self.conditions.len(),
            EntityKind::Symptom => self.symptoms.len(),
            EntityKind::ImagingReport => self.imaging_reports.len(),
            EntityKind::WhoopCycle => self.whoop_cycles.len(),
            EntityKind::WhoopWorkout => self.whoop_workouts.len(),
        }
    }

    /// Resolves a workout's `cycle_start` back-reference.
    pub fn cycle_for_workout(&self, workout: &WhoopWorkout) -> Option<&WhoopCycle> {
        let cycle_start = workout.cycle_start?;
        self.whoop_cycles
            .iter()
            .find(|cycle| cycle.cycle_start == cycle_start)
    }
}

#[cfg(test)]
mod tests {
    use super::{BiologicalSelf, EntityKind, SCHEMA_VERSION};
    use chrono::Utc;

    #[test]
    fn empty_aggregate_starts_at_revision_one() {
        let doc = BiologicalSelf::empty(Utc::now());
        assert_eq!(doc.schema_version, SCHEMA_VERSION);
        assert_eq!(doc.revision, 1);
        assert!(EntityKind::ALL.iter().all(|kind| doc.count(*kind) == 0));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let doc = BiologicalSelf::empty(Utc::now());
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("schemaVersion").is_some());
        assert!(json.get("imagingReports").is_some());
        assert!(json.get("auditLog").is_some());
    }

    #[test]
    fn entity_kind_parse_round_trips_as_str() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityKind::parse("whoop-cycle"), Some(EntityKind::WhoopCycle));
        assert_eq!(EntityKind::parse("lab"), None);
    }
}
