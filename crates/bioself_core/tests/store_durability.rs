mod common;

use bioself_core::storage::temp_sibling_path;
use bioself_core::{ConditionStatus, Store, StoreError};
use common::{condition, date, fast_config, symptom, PASSPHRASE};

#[test]
fn leftover_temp_file_from_interrupted_write_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("self.bslf");
    let config = fast_config(&path);

    let mut store = Store::create(&config, PASSPHRASE).unwrap();
    store
        .add_symptom(symptom("Fatigue", date(2024, 4, 2), 5))
        .unwrap();
    let committed = store.get();
    store.lock();

    // A newer, complete blob that never got renamed into place.
    let mut other = Store::create(&fast_config(&dir.path().join("other.bslf")), PASSPHRASE)
        .unwrap();
    other
        .add_symptom(symptom("Fever", date(2024, 4, 3), 7))
        .unwrap();
    other
        .add_symptom(symptom("Chills", date(2024, 4, 3), 6))
        .unwrap();
    let newer = std::fs::read(other.path()).unwrap();
    std::fs::write(temp_sibling_path(&path).unwrap(), newer).unwrap();

    // A torn write: truncated garbage in another temp sibling.
    std::fs::write(temp_sibling_path(&path).unwrap(), b"BSLF\x01\x00\x00").unwrap();

    let reopened = Store::unlock(&config, PASSPHRASE).unwrap();
    assert_eq!(*reopened.get(), *committed);
    assert_eq!(reopened.revision(), 2);
}

#[test]
fn failed_persist_leaves_snapshot_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("self.bslf");
    let mut store = Store::create(&fast_config(&path), PASSPHRASE).unwrap();
    store
        .add_condition(condition("Gout", ConditionStatus::Chronic, date(2019, 2, 2)))
        .unwrap();
    let before = store.get();

    std::fs::remove_file(&path).unwrap();
    let err = store
        .add_symptom(symptom("Joint pain", date(2024, 5, 1), 8))
        .unwrap_err();

    assert_eq!(err.kind(), "persist_failure");
    assert_eq!(*store.get(), *before);
    assert_eq!(store.revision(), 2);
    assert!(!path.exists());
}

#[test]
fn concurrent_handles_detect_conflict_and_recover_with_reload() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(&dir.path().join("self.bslf"));
    Store::create(&config, PASSPHRASE).unwrap().lock();

    let mut first = Store::unlock(&config, PASSPHRASE).unwrap();
    let mut second = Store::unlock(&config, PASSPHRASE).unwrap();

    first
        .add_symptom(symptom("Cough", date(2024, 2, 10), 3))
        .unwrap();

    let err = second
        .add_condition(condition("Bronchitis", ConditionStatus::Active, date(2024, 2, 11)))
        .unwrap_err();
    match err {
        StoreError::Conflict { expected, found } => {
            assert_eq!(expected, 1);
            assert_eq!(found, Some(2));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(second.get().conditions.is_empty());

    let reloaded = second.reload().unwrap();
    assert_eq!(reloaded.symptoms.len(), 1);
    let snapshot = second
        .add_condition(condition("Bronchitis", ConditionStatus::Active, date(2024, 2, 11)))
        .unwrap();
    assert_eq!(snapshot.revision, 3);
    assert_eq!(snapshot.symptoms.len(), 1);
    assert_eq!(snapshot.conditions.len(), 1);

    let err = first
        .add_symptom(symptom("Sore throat", date(2024, 2, 12), 2))
        .unwrap_err();
    assert_eq!(err.kind(), "conflict");
}

#[test]
fn file_replaced_by_foreign_store_is_a_conflict_and_cannot_be_reloaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("self.bslf");
    let mut store = Store::create(&fast_config(&path), PASSPHRASE).unwrap();

    let foreign_path = dir.path().join("foreign.bslf");
    Store::create(&fast_config(&foreign_path), PASSPHRASE)
        .unwrap()
        .lock();
    std::fs::rename(&foreign_path, &path).unwrap();

    let err = store
        .add_symptom(symptom("Dizziness", date(2024, 6, 1), 4))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Conflict {
            expected: 1,
            found: None
        }
    ));

    let err = store.reload().unwrap_err();
    assert_eq!(err.kind(), "wrong_passphrase_or_corrupt_store");
}

#[test]
fn no_temp_files_remain_after_successful_writes() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::create(&fast_config(&dir.path().join("self.bslf")), PASSPHRASE)
        .unwrap();
    for day in 1..=3 {
        store
            .add_symptom(symptom("Back pain", date(2024, 7, day), 5))
            .unwrap();
    }

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["self.bslf".to_string()]);
}
