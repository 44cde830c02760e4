//! FFI use-case API for the Flutter health record UI.
//!
//! # Responsibility
//! - Expose store lifecycle, dashboard, timeline and entry commands to Dart
//!   via FRB, through one opaque `HealthSession` handle.
//! - Flatten core errors into envelopes carrying a stable `error_kind`.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - The session owns the unlocked store; there is no process-wide store,
//!   key or path. Dropping the session (or `lock_store`) wipes the key.
//! - Passphrases and entity text are never logged.
//!
//! # See also
//! - bioself_core::store for error kinds and mutation semantics.

use bioself_core::model::{DurationUnit, SymptomDuration};
use bioself_core::projection::LatestVitals;
use bioself_core::{
    core_version as core_version_inner, get_dashboard, get_timeline_filtered,
    init_logging as init_logging_inner, ConditionStatus, NewCondition, NewSymptom, Severity,
    Store, StoreConfig, StoreError, SymptomStatus, TimelineEvent, TimelineFilter, TimelineKind,
    ValidationError, WhoopMetric,
};
use chrono::NaiveDate;
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

const DATE_FORMAT: &str = "%Y-%m-%d";
const STORE_LOCKED: &str = "store_locked";

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Outcome of a command with no payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResponse {
    pub ok: bool,
    /// Stable snake_case code (`wrong_passphrase_or_corrupt_store`, ...).
    pub error_kind: Option<String>,
    pub message: String,
}

/// Outcome of an add command; `entity_id` is the stored entity's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityResponse {
    pub ok: bool,
    pub error_kind: Option<String>,
    pub message: String,
    pub entity_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardResponse {
    pub ok: bool,
    pub error_kind: Option<String>,
    pub message: String,
    pub dashboard: Option<DashboardView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineResponse {
    pub ok: bool,
    pub error_kind: Option<String>,
    pub message: String,
    pub events: Vec<TimelineItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub revision: u64,
    /// RFC 3339, UTC.
    pub last_updated: String,
    pub condition_count: u32,
    pub symptom_count: u32,
    pub imaging_report_count: u32,
    pub whoop_cycle_count: u32,
    pub whoop_workout_count: u32,
    pub active_conditions: Vec<ConditionItem>,
    pub latest_vitals: Option<VitalsItem>,
    pub recent_symptoms: Vec<SymptomItem>,
    pub recovery_window_days: u32,
    pub avg_recovery_score: Option<f64>,
    pub avg_resting_heart_rate: Option<f64>,
    pub avg_hrv_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionItem {
    pub id: String,
    pub name: String,
    pub status: String,
    pub severity: String,
    /// `YYYY-MM-DD`.
    pub diagnosed_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymptomItem {
    pub id: String,
    pub name: String,
    pub severity: u8,
    pub status: String,
    pub onset_date: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VitalsItem {
    pub cycle_start: String,
    pub resting_heart_rate: Option<f64>,
    pub hrv_ms: Option<f64>,
    pub recovery_score: Option<f64>,
    pub sleep_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineItem {
    pub id: String,
    /// `condition|symptom|imaging|workout`.
    pub kind: String,
    /// `YYYY-MM-DDTHH:MM:SS`, local to the record.
    pub date: String,
    pub title: String,
    pub subtitle: Option<String>,
}

/// Symptom form input. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymptomInput {
    pub name: String,
    pub body_location: Option<String>,
    pub onset_date: String,
    pub duration_value: Option<u32>,
    /// `hours|days|weeks|months`; required when `duration_value` is set.
    pub duration_unit: Option<String>,
    pub severity: u8,
    pub status: String,
    pub frequency: Option<String>,
    pub time_of_day: Option<String>,
    pub associated_factors: Vec<String>,
    pub notes: String,
}

/// Condition form input. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionInput {
    pub name: String,
    pub codes: Vec<String>,
    pub status: String,
    pub severity: String,
    pub diagnosed_date: String,
    pub resolved_date: Option<String>,
    pub notes: String,
}

/// Failure carried to Dart as `(error_kind, message)`.
struct CallError {
    kind: &'static str,
    message: String,
}

impl From<StoreError> for CallError {
    fn from(value: StoreError) -> Self {
        Self {
            kind: value.kind(),
            message: value.to_string(),
        }
    }
}

impl From<ValidationError> for CallError {
    fn from(value: ValidationError) -> Self {
        StoreError::Validation(value).into()
    }
}

type CallResult<T> = Result<T, CallError>;

/// One GUI session over one store file.
///
/// # FFI contract
/// - All methods are sync and never panic.
/// - Commands other than `store_exists`, `create_store` and `unlock_store`
///   fail with `error_kind = "store_locked"` until a store is unlocked.
#[flutter_rust_bridge::frb(opaque)]
pub struct HealthSession {
    config: StoreConfig,
    store: Mutex<Option<Store>>,
}

impl HealthSession {
    #[flutter_rust_bridge::frb(sync)]
    pub fn new(store_path: String) -> HealthSession {
        Self::with_config(StoreConfig::new(PathBuf::from(store_path.trim())))
    }

    pub(crate) fn with_config(config: StoreConfig) -> HealthSession {
        Self {
            config,
            store: Mutex::new(None),
        }
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn store_exists(&self) -> bool {
        Store::exists(&self.config.store_path)
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn is_unlocked(&self) -> bool {
        self.slot().is_some()
    }

    /// Creates a new empty store and keeps it unlocked.
    #[flutter_rust_bridge::frb(sync)]
    pub fn create_store(&self, passphrase: String) -> SessionResponse {
        let result = Store::create(&self.config, &passphrase).map(|store| {
            *self.slot() = Some(store);
        });
        session_response("create_store", "Store created.", result.map_err(Into::into))
    }

    /// Unlocks an existing store, replacing any store this session held.
    ///
    /// `error_kind = "wrong_passphrase_or_corrupt_store"` means re-prompt, or
    /// warn about corruption after repeated failures.
    #[flutter_rust_bridge::frb(sync)]
    pub fn unlock_store(&self, passphrase: String) -> SessionResponse {
        let result = Store::unlock(&self.config, &passphrase).map(|store| {
            *self.slot() = Some(store);
        });
        session_response("unlock_store", "Store unlocked.", result.map_err(Into::into))
    }

    /// Drops the decrypted aggregate and key. Locking twice is a no-op.
    #[flutter_rust_bridge::frb(sync)]
    pub fn lock_store(&self) -> SessionResponse {
        if let Some(store) = self.slot().take() {
            store.lock();
        }
        session_response("lock_store", "Store locked.", Ok(()))
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn get_dashboard(&self) -> DashboardResponse {
        match self.with_store(|store| Ok(to_dashboard_view(&store.get()))) {
            Ok(dashboard) => DashboardResponse {
                ok: true,
                error_kind: None,
                message: String::new(),
                dashboard: Some(dashboard),
            },
            Err(err) => {
                log_failure("get_dashboard", &err);
                DashboardResponse {
                    ok: false,
                    error_kind: Some(err.kind.to_string()),
                    message: err.message,
                    dashboard: None,
                }
            }
        }
    }

    /// Timeline, newest first.
    ///
    /// Input semantics:
    /// - `kinds`: subset of `condition|symptom|imaging|workout`; empty means all.
    /// - `start` / `end`: optional inclusive `YYYY-MM-DD` bounds.
    #[flutter_rust_bridge::frb(sync)]
    pub fn get_timeline(
        &self,
        kinds: Vec<String>,
        start: Option<String>,
        end: Option<String>,
    ) -> TimelineResponse {
        let result = parse_timeline_filter(&kinds, start.as_deref(), end.as_deref())
            .and_then(|filter| {
                self.with_store(|store| {
                    Ok(get_timeline_filtered(&store.get(), &filter)
                        .into_iter()
                        .map(to_timeline_item)
                        .collect::<Vec<_>>())
                })
            });
        match result {
            Ok(events) => TimelineResponse {
                ok: true,
                error_kind: None,
                message: format!("{} event(s).", events.len()),
                events,
            },
            Err(err) => {
                log_failure("get_timeline", &err);
                TimelineResponse {
                    ok: false,
                    error_kind: Some(err.kind.to_string()),
                    message: err.message,
                    events: Vec::new(),
                }
            }
        }
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn add_symptom(&self, input: SymptomInput) -> EntityResponse {
        let result = to_new_symptom(input).and_then(|symptom| {
            self.with_store(|store| {
                let snapshot = store.add_symptom(symptom)?;
                Ok(snapshot.symptoms.last().map(|s| s.id.to_string()))
            })
        });
        entity_response("add_symptom", "Symptom added.", result)
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn add_condition(&self, input: ConditionInput) -> EntityResponse {
        let result = to_new_condition(input).and_then(|condition| {
            self.with_store(|store| {
                let snapshot = store.add_condition(condition)?;
                Ok(snapshot.conditions.last().map(|c| c.id.to_string()))
            })
        });
        entity_response("add_condition", "Condition added.", result)
    }

    fn slot(&self) -> MutexGuard<'_, Option<Store>> {
        // A panic while holding the lock cannot leave the store half-written:
        // mutations only swap the snapshot after a successful persist.
        self.store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_store<T>(&self, f: impl FnOnce(&mut Store) -> CallResult<T>) -> CallResult<T> {
        let mut slot = self.slot();
        let store = slot.as_mut().ok_or_else(|| CallError {
            kind: STORE_LOCKED,
            message: "no store is unlocked in this session".to_string(),
        })?;
        f(store)
    }
}

fn session_response(op: &str, success: &str, result: CallResult<()>) -> SessionResponse {
    match result {
        Ok(()) => SessionResponse {
            ok: true,
            error_kind: None,
            message: success.to_string(),
        },
        Err(err) => {
            log_failure(op, &err);
            SessionResponse {
                ok: false,
                error_kind: Some(err.kind.to_string()),
                message: err.message,
            }
        }
    }
}

fn entity_response(op: &str, success: &str, result: CallResult<Option<String>>) -> EntityResponse {
    match result {
        Ok(entity_id) => EntityResponse {
            ok: true,
            error_kind: None,
            message: success.to_string(),
            entity_id,
        },
        Err(err) => {
            log_failure(op, &err);
            EntityResponse {
                ok: false,
                error_kind: Some(err.kind.to_string()),
                message: err.message,
                entity_id: None,
            }
        }
    }
}

fn log_failure(op: &str, err: &CallError) {
    warn!(
        "event=ffi_call module=ffi status=error op={} error_code={}",
        op, err.kind
    );
}

fn parse_date(field: &'static str, value: &str) -> CallResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        ValidationError::new(field, format!("`{value}` is not a YYYY-MM-DD date")).into()
    })
}

fn parse_optional_date(field: &'static str, value: Option<&str>) -> CallResult<Option<NaiveDate>> {
    value
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_date(field, raw))
        .transpose()
}

fn parse_timeline_filter(
    kinds: &[String],
    start: Option<&str>,
    end: Option<&str>,
) -> CallResult<TimelineFilter> {
    let kinds = kinds
        .iter()
        .map(|raw| {
            TimelineKind::parse(raw).ok_or_else(|| {
                CallError::from(ValidationError::new(
                    "kinds",
                    format!("`{raw}` is not one of condition|symptom|imaging|workout"),
                ))
            })
        })
        .collect::<CallResult<Vec<_>>>()?;
    Ok(TimelineFilter {
        kinds,
        start: parse_optional_date("start", start)?,
        end: parse_optional_date("end", end)?,
    })
}

fn to_new_symptom(input: SymptomInput) -> CallResult<NewSymptom> {
    let duration = match (input.duration_value, input.duration_unit.as_deref()) {
        (None, _) => None,
        (Some(value), Some(unit)) => Some(SymptomDuration {
            value,
            unit: DurationUnit::parse(unit)?,
        }),
        (Some(_), None) => {
            return Err(ValidationError::new("duration_unit", "required with a duration").into())
        }
    };
    Ok(NewSymptom {
        name: input.name,
        body_location: input.body_location,
        onset_date: parse_date("onset_date", &input.onset_date)?,
        duration,
        severity: input.severity,
        status: SymptomStatus::parse(&input.status)?,
        frequency: input.frequency,
        time_of_day: input.time_of_day,
        associated_factors: input.associated_factors,
        notes: input.notes,
    })
}

fn to_new_condition(input: ConditionInput) -> CallResult<NewCondition> {
    Ok(NewCondition {
        name: input.name,
        codes: input.codes,
        status: ConditionStatus::parse(&input.status)?,
        severity: Severity::parse(&input.severity)?,
        diagnosed_date: parse_date("diagnosed_date", &input.diagnosed_date)?,
        resolved_date: parse_optional_date("resolved_date", input.resolved_date.as_deref())?,
        notes: input.notes,
        origin_draft: None,
    })
}

fn to_dashboard_view(snapshot: &bioself_core::BiologicalSelf) -> DashboardView {
    let dashboard = get_dashboard(snapshot);
    DashboardView {
        revision: dashboard.revision,
        last_updated: dashboard.last_updated.to_rfc3339(),
        condition_count: count(dashboard.counts.conditions),
        symptom_count: count(dashboard.counts.symptoms),
        imaging_report_count: count(dashboard.counts.imaging_reports),
        whoop_cycle_count: count(dashboard.counts.whoop_cycles),
        whoop_workout_count: count(dashboard.counts.whoop_workouts),
        active_conditions: dashboard
            .active_conditions
            .iter()
            .map(|c| ConditionItem {
                id: c.id.to_string(),
                name: c.name.clone(),
                status: c.status.as_str().to_string(),
                severity: c.severity.as_str().to_string(),
                diagnosed_date: c.diagnosed_date.format(DATE_FORMAT).to_string(),
            })
            .collect(),
        latest_vitals: dashboard.latest_vitals.as_ref().map(to_vitals_item),
        recent_symptoms: dashboard
            .recent_symptoms
            .iter()
            .map(|s| SymptomItem {
                id: s.id.to_string(),
                name: s.name.clone(),
                severity: s.severity,
                status: s.status.as_str().to_string(),
                onset_date: s.onset_date.format(DATE_FORMAT).to_string(),
            })
            .collect(),
        recovery_window_days: dashboard.recovery.window_days,
        avg_recovery_score: dashboard.recovery.mean(WhoopMetric::RecoveryScore),
        avg_resting_heart_rate: dashboard.recovery.mean(WhoopMetric::RestingHeartRate),
        avg_hrv_ms: dashboard.recovery.mean(WhoopMetric::HrvMs),
    }
}

fn to_vitals_item(vitals: &LatestVitals) -> VitalsItem {
    VitalsItem {
        cycle_start: vitals.cycle_start.format("%Y-%m-%dT%H:%M:%S").to_string(),
        resting_heart_rate: vitals.resting_heart_rate,
        hrv_ms: vitals.hrv_ms,
        recovery_score: vitals.recovery_score,
        sleep_hours: vitals.sleep_hours,
    }
}

fn to_timeline_item(event: TimelineEvent) -> TimelineItem {
    TimelineItem {
        id: event.id.to_string(),
        kind: event.kind.as_str().to_string(),
        date: event.date.format("%Y-%m-%dT%H:%M:%S").to_string(),
        title: event.title,
        subtitle: event.subtitle,
    }
}

fn count(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, ConditionInput, HealthSession, SymptomInput, STORE_LOCKED,
    };
    use bioself_core::{KdfParams, StoreConfig};

    fn session(dir: &tempfile::TempDir) -> HealthSession {
        HealthSession::with_config(StoreConfig::new(dir.path().join("self.bslf")).with_kdf(
            KdfParams {
                memory_kib: 8,
                iterations: 1,
                parallelism: 1,
            },
        ))
    }

    fn headache(onset: &str) -> SymptomInput {
        SymptomInput {
            name: "Headache".to_string(),
            onset_date: onset.to_string(),
            duration_value: Some(3),
            duration_unit: Some("hours".to_string()),
            severity: 6,
            status: "active".to_string(),
            ..SymptomInput::default()
        }
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn create_lock_unlock_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir);
        assert!(!session.store_exists());

        let created = session.create_store("p1".to_string());
        assert!(created.ok, "{}", created.message);
        assert!(session.store_exists());
        assert!(session.is_unlocked());

        assert!(session.lock_store().ok);
        assert!(!session.is_unlocked());

        let wrong = session.unlock_store("nope".to_string());
        assert!(!wrong.ok);
        assert_eq!(
            wrong.error_kind.as_deref(),
            Some("wrong_passphrase_or_corrupt_store")
        );

        assert!(session.unlock_store("p1".to_string()).ok);
        assert!(session.is_unlocked());
    }

    #[test]
    fn commands_require_unlocked_store() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir);

        let dashboard = session.get_dashboard();
        assert!(!dashboard.ok);
        assert_eq!(dashboard.error_kind.as_deref(), Some(STORE_LOCKED));

        let added = session.add_symptom(headache("2024-03-01"));
        assert_eq!(added.error_kind.as_deref(), Some(STORE_LOCKED));
    }

    #[test]
    fn added_entries_reach_dashboard_and_timeline() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir);
        assert!(session.create_store("p1".to_string()).ok);

        let symptom = session.add_symptom(headache("2024-03-01"));
        assert!(symptom.ok, "{}", symptom.message);
        let condition = session.add_condition(ConditionInput {
            name: "Migraine".to_string(),
            codes: vec!["G43.909".to_string()],
            status: "chronic".to_string(),
            severity: "moderate".to_string(),
            diagnosed_date: "2019-07-01".to_string(),
            ..ConditionInput::default()
        });
        assert!(condition.ok, "{}", condition.message);

        let dashboard = session.get_dashboard().dashboard.unwrap();
        assert_eq!(dashboard.revision, 3);
        assert_eq!(dashboard.symptom_count, 1);
        assert_eq!(dashboard.active_conditions.len(), 1);
        assert_eq!(
            Some(dashboard.active_conditions[0].id.clone()),
            condition.entity_id
        );
        assert_eq!(dashboard.recent_symptoms[0].onset_date, "2024-03-01");
        assert_eq!(dashboard.latest_vitals, None);

        let timeline = session.get_timeline(Vec::new(), None, None);
        assert_eq!(timeline.events.len(), 2);
        assert_eq!(timeline.events[0].kind, "symptom");
        assert_eq!(timeline.events[0].date, "2024-03-01T00:00:00");

        let only_conditions =
            session.get_timeline(vec!["condition".to_string()], None, Some("2020-01-01".to_string()));
        assert_eq!(only_conditions.events.len(), 1);
        assert_eq!(only_conditions.events[0].title, "Migraine");
    }

    #[test]
    fn bad_input_reports_validation_error_with_field() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir);
        assert!(session.create_store("p1".to_string()).ok);

        let mut input = headache("03/01/2024");
        let response = session.add_symptom(input.clone());
        assert_eq!(response.error_kind.as_deref(), Some("validation_error"));
        assert!(response.message.contains("onset_date"));

        input.onset_date = "2024-03-01".to_string();
        input.severity = 0;
        let response = session.add_symptom(input);
        assert_eq!(response.error_kind.as_deref(), Some("validation_error"));
        assert!(response.message.contains("severity"));

        let timeline = session.get_timeline(vec!["labs".to_string()], None, None);
        assert_eq!(timeline.error_kind.as_deref(), Some("validation_error"));

        assert_eq!(session.get_dashboard().dashboard.unwrap().revision, 1);
    }
}
