//! Typed add/update/remove operations on the aggregate.
//!
//! Every operation validates first, then dedupes by natural key, then
//! commits through `Store::commit` (one persist per call, batches included).

use super::{Snapshot, Store, StoreError, StoreResult};
use crate::model::validation::require_text;
use crate::model::{
    AuditAction, AuditEntry, Condition, ConditionPatch, EntityKind, ImagingKey, ImagingReport,
    ImagingReportPatch, NewCondition, NewImagingReport, NewSymptom, NewWhoopCycle,
    NewWhoopWorkout, Symptom, SymptomPatch, ValidationError, ValidationResult, WhoopCycle,
    WhoopCyclePatch, WhoopWorkout, WhoopWorkoutPatch,
};
use chrono::NaiveDateTime;
use std::collections::HashSet;
use uuid::Uuid;

/// Result of a batch insert.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub snapshot: Snapshot,
    pub inserted: usize,
    /// Items whose natural key already existed (in the store or earlier in
    /// the same batch).
    pub skipped: usize,
}

impl Store {
    /// Adds a condition. A condition promoted from a draft that is already
    /// present (same `origin_draft`) is skipped without error.
    pub fn add_condition(&mut self, input: NewCondition) -> StoreResult<Snapshot> {
        self.commit("add_condition", |doc, stamp| {
            let condition = Condition::create(input, stamp);
            condition.validate()?;
            if let Some(origin) = condition.origin_draft {
                if doc
                    .conditions
                    .iter()
                    .any(|existing| existing.origin_draft == Some(origin))
                {
                    return Ok(false);
                }
            }
            doc.conditions.push(condition);
            Ok(true)
        })
    }

    /// Symptoms have no natural key; every call inserts.
    pub fn add_symptom(&mut self, input: NewSymptom) -> StoreResult<Snapshot> {
        self.commit("add_symptom", |doc, stamp| {
            let symptom = Symptom::create(input, stamp);
            symptom.validate()?;
            doc.symptoms.push(symptom);
            Ok(true)
        })
    }

    /// Adds an imaging report unless `(date, body_part, type)` already exists.
    pub fn add_imaging_report(&mut self, input: NewImagingReport) -> StoreResult<Snapshot> {
        self.commit("add_imaging_report", |doc, stamp| {
            input.validate()?;
            let key = input.natural_key();
            if doc
                .imaging_reports
                .iter()
                .any(|existing| existing.natural_key() == key)
            {
                return Ok(false);
            }
            doc.imaging_reports.push(ImagingReport::create(input, stamp));
            Ok(true)
        })
    }

    /// Batch form of [`Store::add_imaging_report`]; all items are validated
    /// before any is inserted.
    pub fn add_imaging_reports(
        &mut self,
        batch: Vec<NewImagingReport>,
    ) -> StoreResult<BatchOutcome> {
        let total = batch.len();
        let mut inserted = 0;
        let snapshot = self.commit("add_imaging_reports", |doc, stamp| {
            let reports: Vec<ImagingReport> = batch
                .into_iter()
                .map(|input| ImagingReport::create(input, stamp))
                .collect();
            validate_batch(&reports, ImagingReport::validate)?;

            let mut keys: HashSet<ImagingKey> = doc
                .imaging_reports
                .iter()
                .map(ImagingReport::natural_key)
                .collect();
            for report in reports {
                if keys.insert(report.natural_key()) {
                    doc.imaging_reports.push(report);
                    inserted += 1;
                }
            }
            Ok(inserted > 0)
        })?;
        Ok(BatchOutcome {
            snapshot,
            inserted,
            skipped: total - inserted,
        })
    }

    /// Adds wearable cycles keyed by `cycle_start`; persists once.
    pub fn add_whoop_cycles(&mut self, batch: Vec<NewWhoopCycle>) -> StoreResult<BatchOutcome> {
        let total = batch.len();
        let mut inserted = 0;
        let snapshot = self.commit("add_whoop_cycles", |doc, stamp| {
            let cycles: Vec<WhoopCycle> = batch
                .into_iter()
                .map(|input| WhoopCycle::create(input, stamp))
                .collect();
            validate_batch(&cycles, WhoopCycle::validate)?;

            let mut keys: HashSet<NaiveDateTime> =
                doc.whoop_cycles.iter().map(|c| c.cycle_start).collect();
            for cycle in cycles {
                if keys.insert(cycle.cycle_start) {
                    doc.whoop_cycles.push(cycle);
                    inserted += 1;
                }
            }
            Ok(inserted > 0)
        })?;
        Ok(BatchOutcome {
            snapshot,
            inserted,
            skipped: total - inserted,
        })
    }

    /// Adds workouts keyed by `workout_start`; persists once.
    pub fn add_whoop_workouts(
        &mut self,
        batch: Vec<NewWhoopWorkout>,
    ) -> StoreResult<BatchOutcome> {
        let total = batch.len();
        let mut inserted = 0;
        let snapshot = self.commit("add_whoop_workouts", |doc, stamp| {
            let workouts: Vec<WhoopWorkout> = batch
                .into_iter()
                .map(|input| WhoopWorkout::create(input, stamp))
                .collect();
            validate_batch(&workouts, WhoopWorkout::validate)?;

            let mut keys: HashSet<NaiveDateTime> =
                doc.whoop_workouts.iter().map(|w| w.workout_start).collect();
            for workout in workouts {
                if keys.insert(workout.workout_start) {
                    doc.whoop_workouts.push(workout);
                    inserted += 1;
                }
            }
            Ok(inserted > 0)
        })?;
        Ok(BatchOutcome {
            snapshot,
            inserted,
            skipped: total - inserted,
        })
    }

    pub fn update_condition(&mut self, id: Uuid, patch: ConditionPatch) -> StoreResult<Snapshot> {
        self.commit("update_condition", |doc, stamp| {
            let slot = find_mut(&mut doc.conditions, EntityKind::Condition, id, |c| c.id)?;
            let mut next = slot.clone();
            next.apply(patch);
            next.validate()?;
            next.updated_at = stamp;
            *slot = next;
            Ok(true)
        })
    }

    pub fn update_symptom(&mut self, id: Uuid, patch: SymptomPatch) -> StoreResult<Snapshot> {
        self.commit("update_symptom", |doc, stamp| {
            let slot = find_mut(&mut doc.symptoms, EntityKind::Symptom, id, |s| s.id)?;
            let mut next = slot.clone();
            next.apply(patch);
            next.validate()?;
            next.updated_at = stamp;
            *slot = next;
            Ok(true)
        })
    }

    /// Rejects a patch that would give the report another report's natural key.
    pub fn update_imaging_report(
        &mut self,
        id: Uuid,
        patch: ImagingReportPatch,
    ) -> StoreResult<Snapshot> {
        self.commit("update_imaging_report", |doc, stamp| {
            let index = position(&doc.imaging_reports, EntityKind::ImagingReport, id, |r| r.id)?;
            let mut next = doc.imaging_reports[index].clone();
            next.apply(patch);
            next.validate()?;

            let key = next.natural_key();
            let collides = doc
                .imaging_reports
                .iter()
                .any(|other| other.id != id && other.natural_key() == key);
            if collides {
                return Err(ValidationError::new(
                    "body_part",
                    "another imaging report already has this date, body part and type",
                )
                .into());
            }

            next.updated_at = stamp;
            doc.imaging_reports[index] = next;
            Ok(true)
        })
    }

    /// `cycle_start` is the natural key and cannot be patched.
    pub fn update_whoop_cycle(&mut self, id: Uuid, patch: WhoopCyclePatch) -> StoreResult<Snapshot> {
        self.commit("update_whoop_cycle", |doc, stamp| {
            let slot = find_mut(&mut doc.whoop_cycles, EntityKind::WhoopCycle, id, |c| c.id)?;
            let mut next = slot.clone();
            next.apply(patch);
            next.validate()?;
            next.updated_at = stamp;
            *slot = next;
            Ok(true)
        })
    }

    /// `workout_start` is the natural key and cannot be patched.
    pub fn update_whoop_workout(
        &mut self,
        id: Uuid,
        patch: WhoopWorkoutPatch,
    ) -> StoreResult<Snapshot> {
        self.commit("update_whoop_workout", |doc, stamp| {
            let slot = find_mut(&mut doc.whoop_workouts, EntityKind::WhoopWorkout, id, |w| w.id)?;
            let mut next = slot.clone();
            next.apply(patch);
            next.validate()?;
            next.updated_at = stamp;
            *slot = next;
            Ok(true)
        })
    }

    /// The only deletion path. Appends an audit entry in the same commit.
    pub fn remove_entity(
        &mut self,
        kind: EntityKind,
        id: Uuid,
        reason: &str,
    ) -> StoreResult<Snapshot> {
        require_text("reason", reason)?;
        let reason = reason.trim().to_string();
        self.commit("remove_entity", |doc, stamp| {
            let removed = match kind {
                EntityKind::Condition => remove_by_id(&mut doc.conditions, id, |c| c.id),
                EntityKind::Symptom => remove_by_id(&mut doc.symptoms, id, |s| s.id),
                EntityKind::ImagingReport => remove_by_id(&mut doc.imaging_reports, id, |r| r.id),
                EntityKind::WhoopCycle => remove_by_id(&mut doc.whoop_cycles, id, |c| c.id),
                EntityKind::WhoopWorkout => remove_by_id(&mut doc.whoop_workouts, id, |w| w.id),
            };
            if !removed {
                return Err(StoreError::EntityNotFound { kind, id });
            }
            doc.audit_log.push(AuditEntry {
                at: stamp,
                action: AuditAction::Removed,
                kind,
                entity_id: id,
                reason,
            });
            Ok(true)
        })
    }
}

/// Validates every item, prefixing the reason with the item's index.
fn validate_batch<T>(items: &[T], validate: fn(&T) -> ValidationResult) -> ValidationResult {
    for (index, item) in items.iter().enumerate() {
        validate(item).map_err(|err| {
            ValidationError::new(err.field, format!("item {index}: {}", err.reason))
        })?;
    }
    Ok(())
}

fn position<T>(
    items: &[T],
    kind: EntityKind,
    id: Uuid,
    id_of: impl Fn(&T) -> Uuid,
) -> StoreResult<usize> {
    items
        .iter()
        .position(|item| id_of(item) == id)
        .ok_or(StoreError::EntityNotFound { kind, id })
}

fn find_mut<T>(
    items: &mut [T],
    kind: EntityKind,
    id: Uuid,
    id_of: impl Fn(&T) -> Uuid,
) -> StoreResult<&mut T> {
    items
        .iter_mut()
        .find(|item| id_of(item) == id)
        .ok_or(StoreError::EntityNotFound { kind, id })
}

fn remove_by_id<T>(items: &mut Vec<T>, id: Uuid, id_of: impl Fn(&T) -> Uuid) -> bool {
    let before = items.len();
    items.retain(|item| id_of(item) != id);
    items.len() != before
}
