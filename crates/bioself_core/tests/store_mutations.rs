mod common;

use bioself_core::model::{ImagingModality, SymptomStatus};
use bioself_core::{
    ConditionPatch, ConditionStatus, EntityKind, ImagingReportPatch, Store, StoreError,
    SymptomPatch, WhoopCyclePatch,
};
use chrono::Duration;
use common::{
    abdomen_ct, at, condition, cycles, date, fast_config, symptom, workout, PASSPHRASE,
};
use uuid::Uuid;

fn fresh_store(dir: &tempfile::TempDir) -> Store {
    Store::create(&fast_config(&dir.path().join("self.bslf")), PASSPHRASE).unwrap()
}

#[test]
fn adding_same_imaging_report_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = fresh_store(&dir);

    store.add_imaging_report(abdomen_ct()).unwrap();
    let revision = store.revision();

    let mut replay = abdomen_ct();
    replay.body_part = "  abdomen AND pelvis ".to_string();
    replay.findings = "Different wording, same study.".to_string();
    let snapshot = store.add_imaging_report(replay).unwrap();

    assert_eq!(snapshot.imaging_reports.len(), 1);
    assert_eq!(store.revision(), revision);
}

#[test]
fn same_date_and_body_part_with_other_modality_is_a_new_report() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = fresh_store(&dir);

    store.add_imaging_report(abdomen_ct()).unwrap();
    let mut mri = abdomen_ct();
    mri.modality = ImagingModality::Mri;
    let snapshot = store.add_imaging_report(mri).unwrap();

    assert_eq!(snapshot.imaging_reports.len(), 2);
}

#[test]
fn scenario_reimporting_cycle_batch_keeps_ten_records() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(&dir.path().join("self.bslf"));
    let mut store = Store::create(&config, PASSPHRASE).unwrap();

    let first = store.add_whoop_cycles(cycles(10)).unwrap();
    assert_eq!((first.inserted, first.skipped), (10, 0));

    let second = store.add_whoop_cycles(cycles(10)).unwrap();
    assert_eq!((second.inserted, second.skipped), (0, 10));
    assert_eq!(second.snapshot.whoop_cycles.len(), 10);
    store.lock();

    let reopened = Store::unlock(&config, PASSPHRASE).unwrap();
    assert_eq!(reopened.get().whoop_cycles.len(), 10);
}

#[test]
fn batch_persists_once_and_inserts_only_novel_items() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = fresh_store(&dir);

    store.add_whoop_cycles(cycles(3)).unwrap();
    let revision = store.revision();

    let mut batch = cycles(5);
    // Duplicate inside the batch itself.
    batch.push(batch[4].clone());
    let outcome = store.add_whoop_cycles(batch).unwrap();

    assert_eq!(outcome.inserted, 2);
    assert_eq!(outcome.skipped, 4);
    assert_eq!(store.revision(), revision + 1);
}

#[test]
fn single_imaging_report_validation_has_no_batch_index() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = fresh_store(&dir);

    let mut blank = abdomen_ct();
    blank.body_part = "   ".to_string();
    match store.add_imaging_report(blank).unwrap_err() {
        StoreError::Validation(err) => {
            assert_eq!(err.field, "body_part");
            assert_eq!(err.reason, "must not be blank");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(store.get().imaging_reports.is_empty());
    assert_eq!(store.revision(), 1);
}

#[test]
fn invalid_item_rejects_whole_batch_and_names_field() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = fresh_store(&dir);

    let mut batch = cycles(3);
    batch[1].timezone = "Eastern".to_string();
    let err = store.add_whoop_cycles(batch).unwrap_err();

    match err {
        StoreError::Validation(err) => {
            assert_eq!(err.field, "timezone");
            assert!(err.reason.starts_with("item 1"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(store.get().whoop_cycles.is_empty());
    assert_eq!(store.revision(), 1);
}

#[test]
fn workouts_dedupe_on_start_and_resolve_cycle_reference() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = fresh_store(&dir);
    store.add_whoop_cycles(cycles(2)).unwrap();

    let mut run = workout(at(2024, 1, 2, 7), "Running");
    run.cycle_start = Some(at(2024, 1, 1, 22));
    let outcome = store
        .add_whoop_workouts(vec![run.clone(), run])
        .unwrap();
    assert_eq!(outcome.inserted, 1);

    let snapshot = store.get();
    let cycle = snapshot
        .cycle_for_workout(&snapshot.whoop_workouts[0])
        .unwrap();
    assert_eq!(cycle.cycle_start, at(2024, 1, 1, 22));
}

#[test]
fn updates_strictly_increase_updated_at() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = fresh_store(&dir);
    let snapshot = store
        .add_condition(condition("Gastritis", ConditionStatus::Active, date(2020, 1, 1)))
        .unwrap();
    let id = snapshot.conditions[0].id;
    let created_at = snapshot.conditions[0].created_at;

    let first = store
        .update_condition(
            id,
            ConditionPatch {
                status: Some(ConditionStatus::Resolved),
                resolved_date: Some(Some(date(2020, 6, 1))),
                ..ConditionPatch::default()
            },
        )
        .unwrap()
        .conditions[0]
        .clone();
    let second = store
        .update_condition(
            id,
            ConditionPatch {
                status: Some(ConditionStatus::Active),
                resolved_date: Some(None),
                ..ConditionPatch::default()
            },
        )
        .unwrap()
        .conditions[0]
        .clone();

    assert_eq!(first.created_at, created_at);
    assert!(first.updated_at > created_at);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(second.status, ConditionStatus::Active);
    assert_eq!(second.resolved_date, None);
}

#[test]
fn snapshot_taken_before_mutation_is_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = fresh_store(&dir);
    let before = store.get();

    store
        .add_symptom(symptom("Headache", date(2024, 3, 1), 6))
        .unwrap();

    assert!(before.symptoms.is_empty());
    assert_eq!(store.get().symptoms.len(), 1);
}

#[test]
fn update_symptom_revalidates_merged_entity() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = fresh_store(&dir);
    let id = store
        .add_symptom(symptom("Headache", date(2024, 3, 1), 6))
        .unwrap()
        .symptoms[0]
        .id;

    let err = store
        .update_symptom(
            id,
            SymptomPatch {
                severity: Some(11),
                ..SymptomPatch::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), "validation_error");

    let updated = store
        .update_symptom(
            id,
            SymptomPatch {
                status: Some(SymptomStatus::Improving),
                ..SymptomPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.symptoms[0].status, SymptomStatus::Improving);
    assert_eq!(updated.symptoms[0].severity, 6);
}

#[test]
fn imaging_update_cannot_take_another_reports_key() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = fresh_store(&dir);
    store.add_imaging_report(abdomen_ct()).unwrap();
    let mut other = abdomen_ct();
    other.date = date(2018, 1, 1);
    let snapshot = store.add_imaging_report(other).unwrap();
    let other_id = snapshot.imaging_reports[1].id;

    let err = store
        .update_imaging_report(
            other_id,
            ImagingReportPatch {
                date: Some(date(2017, 11, 12)),
                ..ImagingReportPatch::default()
            },
        )
        .unwrap_err();
    match err {
        StoreError::Validation(err) => assert_eq!(err.field, "body_part"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn cycle_patch_merges_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = fresh_store(&dir);
    let id = store.add_whoop_cycles(cycles(1)).unwrap().snapshot.whoop_cycles[0].id;

    let metrics = bioself_core::model::CycleMetrics {
        hrv_ms: Some(88.0),
        ..Default::default()
    };
    let snapshot = store
        .update_whoop_cycle(
            id,
            WhoopCyclePatch {
                metrics: Some(metrics),
                ..WhoopCyclePatch::default()
            },
        )
        .unwrap();

    let cycle = &snapshot.whoop_cycles[0];
    assert_eq!(cycle.metrics.hrv_ms, Some(88.0));
    assert_eq!(cycle.metrics.recovery_score, Some(50.0));
}

#[test]
fn remove_entity_is_audited_and_unknown_ids_fail() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = fresh_store(&dir);
    let id = store
        .add_symptom(symptom("Nausea", date(2024, 1, 5), 3))
        .unwrap()
        .symptoms[0]
        .id;

    let snapshot = store
        .remove_entity(EntityKind::Symptom, id, "entered twice")
        .unwrap();
    assert!(snapshot.symptoms.is_empty());
    assert_eq!(snapshot.audit_log.len(), 1);
    assert_eq!(snapshot.audit_log[0].entity_id, id);
    assert_eq!(snapshot.audit_log[0].kind, EntityKind::Symptom);

    let err = store
        .remove_entity(EntityKind::Symptom, id, "again")
        .unwrap_err();
    assert_eq!(err.kind(), "entity_not_found");

    let err = store
        .remove_entity(EntityKind::Condition, Uuid::new_v4(), "   ")
        .unwrap_err();
    assert_eq!(err.kind(), "validation_error");
}

#[test]
fn draft_origin_dedupes_conditions() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = fresh_store(&dir);
    let mut input = condition("Migraine", ConditionStatus::Active, date(2021, 6, 1));
    input.origin_draft = Some(Uuid::new_v4());

    store.add_condition(input.clone()).unwrap();
    let snapshot = store.add_condition(input).unwrap();
    assert_eq!(snapshot.conditions.len(), 1);

    // Without an origin, identical conditions are distinct entries.
    let plain = condition("Migraine", ConditionStatus::Active, date(2021, 6, 1));
    store.add_condition(plain.clone()).unwrap();
    let snapshot = store.add_condition(plain).unwrap();
    assert_eq!(snapshot.conditions.len(), 3);
}

#[test]
fn aggregate_updated_at_tracks_latest_commit() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = fresh_store(&dir);
    let created = store.get().updated_at;

    let snapshot = store
        .add_whoop_workouts(vec![workout(at(2024, 1, 3, 6), "Yoga")])
        .unwrap()
        .snapshot;
    assert!(snapshot.updated_at > created);
    assert_eq!(snapshot.whoop_workouts[0].created_at, snapshot.updated_at);
    assert!(snapshot.updated_at - created < Duration::minutes(5));
}
