#![allow(dead_code)]

use bioself_core::model::{
    CycleMetrics, DurationUnit, HeartRateZones, ImagingModality, NewCondition, NewImagingReport,
    NewSymptom, NewWhoopCycle, NewWhoopWorkout, Severity, SymptomDuration, SymptomStatus,
};
use bioself_core::{ConditionStatus, KdfParams, StoreConfig};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::path::Path;

pub const PASSPHRASE: &str = "p1";

/// Smallest work factor argon2 accepts; keeps tests fast.
pub fn fast_config(path: &Path) -> StoreConfig {
    StoreConfig::new(path).with_kdf(KdfParams {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    })
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
}

pub fn condition(name: &str, status: ConditionStatus, diagnosed: NaiveDate) -> NewCondition {
    NewCondition {
        name: name.to_string(),
        codes: Vec::new(),
        status,
        severity: Severity::Moderate,
        diagnosed_date: diagnosed,
        resolved_date: None,
        notes: String::new(),
        origin_draft: None,
    }
}

pub fn symptom(name: &str, onset: NaiveDate, severity: u8) -> NewSymptom {
    NewSymptom {
        name: name.to_string(),
        body_location: Some("abdomen".to_string()),
        onset_date: onset,
        duration: Some(SymptomDuration {
            value: 2,
            unit: DurationUnit::Days,
        }),
        severity,
        status: SymptomStatus::Active,
        frequency: None,
        time_of_day: None,
        associated_factors: Vec::new(),
        notes: String::new(),
    }
}

pub fn abdomen_ct() -> NewImagingReport {
    NewImagingReport {
        modality: ImagingModality::Ct,
        body_part: "Abdomen and Pelvis".to_string(),
        date: date(2017, 11, 12),
        indication: "Abdominal pain".to_string(),
        findings: "No acute abnormality.".to_string(),
        impression: "Normal study.".to_string(),
        notes: None,
    }
}

/// `count` consecutive daily cycles starting 2024-01-01 22:00.
pub fn cycles(count: usize) -> Vec<NewWhoopCycle> {
    (0..count)
        .map(|day| {
            let start = at(2024, 1, 1, 22) + Duration::days(day as i64);
            NewWhoopCycle {
                cycle_start: start,
                cycle_end: Some(start + Duration::hours(24)),
                timezone: "UTC-05:00".to_string(),
                metrics: CycleMetrics {
                    recovery_score: Some(50.0 + day as f64),
                    resting_heart_rate: Some(55.0),
                    ..CycleMetrics::default()
                },
            }
        })
        .collect()
}

pub fn workout(start: NaiveDateTime, activity: &str) -> NewWhoopWorkout {
    NewWhoopWorkout {
        workout_start: start,
        workout_end: start + Duration::minutes(45),
        duration_minutes: 45.0,
        activity_name: activity.to_string(),
        activity_strain: 10.5,
        energy_burned_kcal: Some(420.0),
        max_heart_rate: Some(170.0),
        average_heart_rate: Some(140.0),
        zones: HeartRateZones::default(),
        cycle_start: None,
    }
}
