//! Dashboard summary for the interactive app.

use super::get_active_conditions;
use super::recovery::{get_recovery_summary, RecoverySummary};
use crate::model::{BiologicalSelf, Condition, Symptom};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

pub const RECENT_SYMPTOM_LIMIT: usize = 5;
const DASHBOARD_RECOVERY_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCounts {
    pub conditions: usize,
    pub symptoms: usize,
    pub imaging_reports: usize,
    pub whoop_cycles: usize,
    pub whoop_workouts: usize,
}

/// Readings from the most recent cycle only; no averaging.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestVitals {
    pub cycle_start: NaiveDateTime,
    pub resting_heart_rate: Option<f64>,
    pub hrv_ms: Option<f64>,
    pub recovery_score: Option<f64>,
    pub sleep_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub revision: u64,
    pub last_updated: DateTime<Utc>,
    pub counts: EntityCounts,
    pub active_conditions: Vec<Condition>,
    pub latest_vitals: Option<LatestVitals>,
    pub recent_symptoms: Vec<Symptom>,
    pub recovery: RecoverySummary,
}

pub fn get_dashboard(snapshot: &BiologicalSelf) -> Dashboard {
    let latest_vitals = snapshot
        .whoop_cycles
        .iter()
        .max_by_key(|cycle| cycle.cycle_start)
        .map(|cycle| LatestVitals {
            cycle_start: cycle.cycle_start,
            resting_heart_rate: cycle.metrics.resting_heart_rate,
            hrv_ms: cycle.metrics.hrv_ms,
            recovery_score: cycle.metrics.recovery_score,
            sleep_hours: cycle.sleep_hours(),
        });

    let mut recent_symptoms: Vec<&Symptom> = snapshot.symptoms.iter().collect();
    recent_symptoms.sort_by(|a, b| {
        b.onset_date
            .cmp(&a.onset_date)
            .then_with(|| a.id.cmp(&b.id))
    });

    Dashboard {
        revision: snapshot.revision,
        last_updated: snapshot.updated_at,
        counts: EntityCounts {
            conditions: snapshot.conditions.len(),
            symptoms: snapshot.symptoms.len(),
            imaging_reports: snapshot.imaging_reports.len(),
            whoop_cycles: snapshot.whoop_cycles.len(),
            whoop_workouts: snapshot.whoop_workouts.len(),
        },
        active_conditions: get_active_conditions(snapshot)
            .into_iter()
            .cloned()
            .collect(),
        latest_vitals,
        recent_symptoms: recent_symptoms
            .into_iter()
            .take(RECENT_SYMPTOM_LIMIT)
            .cloned()
            .collect(),
        recovery: get_recovery_summary(snapshot, DASHBOARD_RECOVERY_DAYS),
    }
}
