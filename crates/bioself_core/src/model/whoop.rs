//! Wearable (Whoop) daily cycles and workouts.
//!
//! # Invariants
//! - Every metric is optional; a missing reading is `None`, never zero.
//! - `cycle_start` keys a cycle; `workout_start` keys a workout.
//! - A workout's `cycle_start` is a lookup reference, never ownership.

use super::validation::{
    check_range, check_time_order, require_text, ValidationError, ValidationResult,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static TIMEZONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^UTC[+-](0\d|1[0-4]):[0-5]\d$").expect("valid timezone regex"));

const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

/// Optional physiological readings of one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleMetrics {
    pub recovery_score: Option<f64>,
    pub resting_heart_rate: Option<f64>,
    pub hrv_ms: Option<f64>,
    pub skin_temp_celsius: Option<f64>,
    pub blood_oxygen_pct: Option<f64>,
    pub day_strain: Option<f64>,
    pub energy_burned_kcal: Option<f64>,
    pub respiratory_rate: Option<f64>,
    pub sleep_performance_pct: Option<f64>,
    pub asleep_minutes: Option<f64>,
    pub in_bed_minutes: Option<f64>,
    pub light_sleep_minutes: Option<f64>,
    pub deep_sleep_minutes: Option<f64>,
    pub rem_sleep_minutes: Option<f64>,
    pub awake_minutes: Option<f64>,
    pub sleep_need_minutes: Option<f64>,
    pub sleep_debt_minutes: Option<f64>,
    pub sleep_efficiency_pct: Option<f64>,
    pub sleep_consistency_pct: Option<f64>,
}

/// Names every cycle metric so projections can iterate them uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhoopMetric {
    RecoveryScore,
    RestingHeartRate,
    HrvMs,
    SkinTempCelsius,
    BloodOxygenPct,
    DayStrain,
    EnergyBurnedKcal,
    RespiratoryRate,
    SleepPerformancePct,
    AsleepMinutes,
    InBedMinutes,
    LightSleepMinutes,
    DeepSleepMinutes,
    RemSleepMinutes,
    AwakeMinutes,
    SleepNeedMinutes,
    SleepDebtMinutes,
    SleepEfficiencyPct,
    SleepConsistencyPct,
}

impl WhoopMetric {
    pub const ALL: [WhoopMetric; 19] = [
        Self::RecoveryScore,
        Self::RestingHeartRate,
        Self::HrvMs,
        Self::SkinTempCelsius,
        Self::BloodOxygenPct,
        Self::DayStrain,
        Self::EnergyBurnedKcal,
        Self::RespiratoryRate,
        Self::SleepPerformancePct,
        Self::AsleepMinutes,
        Self::InBedMinutes,
        Self::LightSleepMinutes,
        Self::DeepSleepMinutes,
        Self::RemSleepMinutes,
        Self::AwakeMinutes,
        Self::SleepNeedMinutes,
        Self::SleepDebtMinutes,
        Self::SleepEfficiencyPct,
        Self::SleepConsistencyPct,
    ];

    pub fn field_name(self) -> &'static str {
        match self {
            Self::RecoveryScore => "recovery_score",
            Self::RestingHeartRate => "resting_heart_rate",
            Self::HrvMs => "hrv_ms",
            Self::SkinTempCelsius => "skin_temp_celsius",
            Self::BloodOxygenPct => "blood_oxygen_pct",
            Self::DayStrain => "day_strain",
            Self::EnergyBurnedKcal => "energy_burned_kcal",
            Self::RespiratoryRate => "respiratory_rate",
            Self::SleepPerformancePct => "sleep_performance_pct",
            Self::AsleepMinutes => "asleep_minutes",
            Self::InBedMinutes => "in_bed_minutes",
            Self::LightSleepMinutes => "light_sleep_minutes",
            Self::DeepSleepMinutes => "deep_sleep_minutes",
            Self::RemSleepMinutes => "rem_sleep_minutes",
            Self::AwakeMinutes => "awake_minutes",
            Self::SleepNeedMinutes => "sleep_need_minutes",
            Self::SleepDebtMinutes => "sleep_debt_minutes",
            Self::SleepEfficiencyPct => "sleep_efficiency_pct",
            Self::SleepConsistencyPct => "sleep_consistency_pct",
        }
    }

    /// Inclusive plausible range for a reading.
    pub fn bounds(self) -> (f64, f64) {
        match self {
            Self::RecoveryScore
            | Self::SleepPerformancePct
            | Self::SleepEfficiencyPct
            | Self::SleepConsistencyPct => (0.0, 100.0),
            Self::BloodOxygenPct => (50.0, 100.0),
            Self::RestingHeartRate => (20.0, 250.0),
            Self::HrvMs => (0.0, 500.0),
            Self::SkinTempCelsius => (25.0, 45.0),
            Self::DayStrain => (0.0, 21.0),
            Self::EnergyBurnedKcal => (0.0, 50_000.0),
            Self::RespiratoryRate => (0.0, 60.0),
            Self::AsleepMinutes
            | Self::InBedMinutes
            | Self::LightSleepMinutes
            | Self::DeepSleepMinutes
            | Self::RemSleepMinutes
            | Self::AwakeMinutes
            | Self::SleepNeedMinutes
            | Self::SleepDebtMinutes => (0.0, MINUTES_PER_DAY),
        }
    }

    pub fn read(self, metrics: &CycleMetrics) -> Option<f64> {
        match self {
            Self::RecoveryScore => metrics.recovery_score,
            Self::RestingHeartRate => metrics.resting_heart_rate,
            Self::HrvMs => metrics.hrv_ms,
            Self::SkinTempCelsius => metrics.skin_temp_celsius,
            Self::BloodOxygenPct => metrics.blood_oxygen_pct,
            Self::DayStrain => metrics.day_strain,
            Self::EnergyBurnedKcal => metrics.energy_burned_kcal,
            Self::RespiratoryRate => metrics.respiratory_rate,
            Self::SleepPerformancePct => metrics.sleep_performance_pct,
            Self::AsleepMinutes => metrics.asleep_minutes,
            Self::InBedMinutes => metrics.in_bed_minutes,
            Self::LightSleepMinutes => metrics.light_sleep_minutes,
            Self::DeepSleepMinutes => metrics.deep_sleep_minutes,
            Self::RemSleepMinutes => metrics.rem_sleep_minutes,
            Self::AwakeMinutes => metrics.awake_minutes,
            Self::SleepNeedMinutes => metrics.sleep_need_minutes,
            Self::SleepDebtMinutes => metrics.sleep_debt_minutes,
            Self::SleepEfficiencyPct => metrics.sleep_efficiency_pct,
            Self::SleepConsistencyPct => metrics.sleep_consistency_pct,
        }
    }

    fn slot(self, metrics: &mut CycleMetrics) -> &mut Option<f64> {
        match self {
            Self::RecoveryScore => &mut metrics.recovery_score,
            Self::RestingHeartRate => &mut metrics.resting_heart_rate,
            Self::HrvMs => &mut metrics.hrv_ms,
            Self::SkinTempCelsius => &mut metrics.skin_temp_celsius,
            Self::BloodOxygenPct => &mut metrics.blood_oxygen_pct,
            Self::DayStrain => &mut metrics.day_strain,
            Self::EnergyBurnedKcal => &mut metrics.energy_burned_kcal,
            Self::RespiratoryRate => &mut metrics.respiratory_rate,
            Self::SleepPerformancePct => &mut metrics.sleep_performance_pct,
            Self::AsleepMinutes => &mut metrics.asleep_minutes,
            Self::InBedMinutes => &mut metrics.in_bed_minutes,
            Self::LightSleepMinutes => &mut metrics.light_sleep_minutes,
            Self::DeepSleepMinutes => &mut metrics.deep_sleep_minutes,
            Self::RemSleepMinutes => &mut metrics.rem_sleep_minutes,
            Self::AwakeMinutes => &mut metrics.awake_minutes,
            Self::SleepNeedMinutes => &mut metrics.sleep_need_minutes,
            Self::SleepDebtMinutes => &mut metrics.sleep_debt_minutes,
            Self::SleepEfficiencyPct => &mut metrics.sleep_efficiency_pct,
            Self::SleepConsistencyPct => &mut metrics.sleep_consistency_pct,
        }
    }
}

impl CycleMetrics {
    pub fn set(&mut self, metric: WhoopMetric, value: Option<f64>) {
        *metric.slot(self) = value;
    }

    /// Overwrites readings present in `other`; absent readings are kept.
    pub fn merge(&mut self, other: &CycleMetrics) {
        for metric in WhoopMetric::ALL {
            if let Some(value) = metric.read(other) {
                self.set(metric, Some(value));
            }
        }
    }

    pub fn validate(&self) -> ValidationResult {
        for metric in WhoopMetric::ALL {
            let (min, max) = metric.bounds();
            check_range(metric.field_name(), metric.read(self), min, max)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoopCycle {
    pub id: Uuid,
    pub cycle_start: NaiveDateTime,
    /// `None` for the cycle still in progress at export time.
    pub cycle_end: Option<NaiveDateTime>,
    /// Export offset label, e.g. `UTC-05:00`.
    pub timezone: String,
    pub metrics: CycleMetrics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWhoopCycle {
    pub cycle_start: NaiveDateTime,
    #[serde(default)]
    pub cycle_end: Option<NaiveDateTime>,
    pub timezone: String,
    #[serde(default)]
    pub metrics: CycleMetrics,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhoopCyclePatch {
    pub cycle_end: Option<Option<NaiveDateTime>>,
    pub timezone: Option<String>,
    /// Merged: only readings present here replace stored ones.
    pub metrics: Option<CycleMetrics>,
}

impl NewWhoopCycle {
    pub fn validate(&self) -> ValidationResult {
        validate_cycle(self.cycle_start, self.cycle_end, &self.timezone, &self.metrics)
    }
}

impl WhoopCycle {
    pub(crate) fn create(input: NewWhoopCycle, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            cycle_start: input.cycle_start,
            cycle_end: input.cycle_end,
            timezone: input.timezone.trim().to_string(),
            metrics: input.metrics,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn apply(&mut self, patch: WhoopCyclePatch) {
        if let Some(cycle_end) = patch.cycle_end {
            self.cycle_end = cycle_end;
        }
        if let Some(timezone) = patch.timezone {
            self.timezone = timezone.trim().to_string();
        }
        if let Some(metrics) = patch.metrics {
            self.metrics.merge(&metrics);
        }
    }

    pub fn validate(&self) -> ValidationResult {
        validate_cycle(self.cycle_start, self.cycle_end, &self.timezone, &self.metrics)
    }

    /// Total sleep in hours, when the asleep duration was recorded.
    pub fn sleep_hours(&self) -> Option<f64> {
        self.metrics.asleep_minutes.map(|minutes| minutes / 60.0)
    }
}

fn validate_cycle(
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
    timezone: &str,
    metrics: &CycleMetrics,
) -> ValidationResult {
    check_time_order("cycle_end", start, end)?;
    if !TIMEZONE_RE.is_match(timezone.trim()) {
        return Err(ValidationError::new(
            "timezone",
            format!("`{timezone}` is not of the form UTC±HH:MM"),
        ));
    }
    metrics.validate()
}

/// Percentage of workout time spent in each heart-rate zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRateZones {
    pub zone1_pct: Option<f64>,
    pub zone2_pct: Option<f64>,
    pub zone3_pct: Option<f64>,
    pub zone4_pct: Option<f64>,
    pub zone5_pct: Option<f64>,
}

impl HeartRateZones {
    fn validate(&self) -> ValidationResult {
        let zones = [
            ("zone1_pct", self.zone1_pct),
            ("zone2_pct", self.zone2_pct),
            ("zone3_pct", self.zone3_pct),
            ("zone4_pct", self.zone4_pct),
            ("zone5_pct", self.zone5_pct),
        ];
        for (field, value) in zones {
            check_range(field, value, 0.0, 100.0)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoopWorkout {
    pub id: Uuid,
    pub workout_start: NaiveDateTime,
    pub workout_end: NaiveDateTime,
    pub duration_minutes: f64,
    pub activity_name: String,
    pub activity_strain: f64,
    pub energy_burned_kcal: Option<f64>,
    pub max_heart_rate: Option<f64>,
    pub average_heart_rate: Option<f64>,
    #[serde(default)]
    pub zones: HeartRateZones,
    /// Start of the enclosing cycle (lookup only).
    pub cycle_start: Option<NaiveDateTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWhoopWorkout {
    pub workout_start: NaiveDateTime,
    pub workout_end: NaiveDateTime,
    pub duration_minutes: f64,
    pub activity_name: String,
    pub activity_strain: f64,
    #[serde(default)]
    pub energy_burned_kcal: Option<f64>,
    #[serde(default)]
    pub max_heart_rate: Option<f64>,
    #[serde(default)]
    pub average_heart_rate: Option<f64>,
    #[serde(default)]
    pub zones: HeartRateZones,
    #[serde(default)]
    pub cycle_start: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhoopWorkoutPatch {
    pub workout_end: Option<NaiveDateTime>,
    pub duration_minutes: Option<f64>,
    pub activity_name: Option<String>,
    pub activity_strain: Option<f64>,
    pub energy_burned_kcal: Option<Option<f64>>,
    pub max_heart_rate: Option<Option<f64>>,
    pub average_heart_rate: Option<Option<f64>>,
    pub zones: Option<HeartRateZones>,
    pub cycle_start: Option<Option<NaiveDateTime>>,
}

struct WorkoutFields<'a> {
    start: NaiveDateTime,
    end: NaiveDateTime,
    duration_minutes: f64,
    activity_name: &'a str,
    activity_strain: f64,
    energy_burned_kcal: Option<f64>,
    max_heart_rate: Option<f64>,
    average_heart_rate: Option<f64>,
    zones: &'a HeartRateZones,
}

impl WorkoutFields<'_> {
    fn validate(&self) -> ValidationResult {
        require_text("activity_name", self.activity_name)?;
        check_time_order("workout_end", self.start, Some(self.end))?;
        check_range(
            "duration_minutes",
            Some(self.duration_minutes),
            0.0,
            MINUTES_PER_DAY,
        )?;
        check_range("activity_strain", Some(self.activity_strain), 0.0, 21.0)?;
        check_range("energy_burned_kcal", self.energy_burned_kcal, 0.0, 50_000.0)?;
        check_range("max_heart_rate", self.max_heart_rate, 20.0, 250.0)?;
        check_range("average_heart_rate", self.average_heart_rate, 20.0, 250.0)?;
        if let (Some(avg), Some(max)) = (self.average_heart_rate, self.max_heart_rate) {
            if avg > max {
                return Err(ValidationError::new(
                    "average_heart_rate",
                    format!("{avg} exceeds max_heart_rate {max}"),
                ));
            }
        }
        self.zones.validate()
    }
}

impl NewWhoopWorkout {
    pub fn validate(&self) -> ValidationResult {
        WorkoutFields {
            start: self.workout_start,
            end: self.workout_end,
            duration_minutes: self.duration_minutes,
            activity_name: &self.activity_name,
            activity_strain: self.activity_strain,
            energy_burned_kcal: self.energy_burned_kcal,
            max_heart_rate: self.max_heart_rate,
            average_heart_rate: self.average_heart_rate,
            zones: &self.zones,
        }
        .validate()
    }
}

impl WhoopWorkout {
    pub(crate) fn create(input: NewWhoopWorkout, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            workout_start: input.workout_start,
            workout_end: input.workout_end,
            duration_minutes: input.duration_minutes,
            activity_name: input.activity_name.trim().to_string(),
            activity_strain: input.activity_strain,
            energy_burned_kcal: input.energy_burned_kcal,
            max_heart_rate: input.max_heart_rate,
            average_heart_rate: input.average_heart_rate,
            zones: input.zones,
            cycle_start: input.cycle_start,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn apply(&mut self, patch: WhoopWorkoutPatch) {
        if let Some(workout_end) = patch.workout_end {
            self.workout_end = workout_end;
        }
        if let Some(duration_minutes) = patch.duration_minutes {
            self.duration_minutes = duration_minutes;
        }
        if let Some(activity_name) = patch.activity_name {
            self.activity_name = activity_name.trim().to_string();
        }
        if let Some(activity_strain) = patch.activity_strain {
            self.activity_strain = activity_strain;
        }
        if let Some(energy_burned_kcal) = patch.energy_burned_kcal {
            self.energy_burned_kcal = energy_burned_kcal;
        }
        if let Some(max_heart_rate) = patch.max_heart_rate {
            self.max_heart_rate = max_heart_rate;
        }
        if let Some(average_heart_rate) = patch.average_heart_rate {
            self.average_heart_rate = average_heart_rate;
        }
        if let Some(zones) = patch.zones {
            self.zones = zones;
        }
        if let Some(cycle_start) = patch.cycle_start {
            self.cycle_start = cycle_start;
        }
    }

    pub fn validate(&self) -> ValidationResult {
        WorkoutFields {
            start: self.workout_start,
            end: self.workout_end,
            duration_minutes: self.duration_minutes,
            activity_name: &self.activity_name,
            activity_strain: self.activity_strain,
            energy_burned_kcal: self.energy_burned_kcal,
            max_heart_rate: self.max_heart_rate,
            average_heart_rate: self.average_heart_rate,
            zones: &self.zones,
        }
        .validate()
    }
}

#[cfg(test)]
mod tests {
    use super::{CycleMetrics, NewWhoopCycle, NewWhoopWorkout, WhoopMetric};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn cycle(timezone: &str) -> NewWhoopCycle {
        NewWhoopCycle {
            cycle_start: at(1, 22),
            cycle_end: Some(at(2, 22)),
            timezone: timezone.to_string(),
            metrics: CycleMetrics {
                recovery_score: Some(64.0),
                ..CycleMetrics::default()
            },
        }
    }

    #[test]
    fn cycle_timezone_must_be_utc_offset_label() {
        assert!(cycle("UTC-05:00").validate().is_ok());
        assert!(cycle("UTC+14:00").validate().is_ok());
        assert_eq!(cycle("EST").validate().unwrap_err().field, "timezone");
    }

    #[test]
    fn cycle_metric_out_of_range_names_metric() {
        let mut input = cycle("UTC+00:00");
        input.metrics.blood_oxygen_pct = Some(120.0);
        assert_eq!(input.validate().unwrap_err().field, "blood_oxygen_pct");
    }

    #[test]
    fn merge_keeps_absent_readings() {
        let mut stored = CycleMetrics {
            recovery_score: Some(50.0),
            hrv_ms: Some(40.0),
            ..CycleMetrics::default()
        };
        stored.merge(&CycleMetrics {
            hrv_ms: Some(55.0),
            ..CycleMetrics::default()
        });
        assert_eq!(stored.recovery_score, Some(50.0));
        assert_eq!(stored.hrv_ms, Some(55.0));
    }

    #[test]
    fn every_metric_has_distinct_field_name() {
        let mut names: Vec<_> = WhoopMetric::ALL.iter().map(|m| m.field_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), WhoopMetric::ALL.len());
    }

    #[test]
    fn workout_average_hr_cannot_exceed_max() {
        let workout = NewWhoopWorkout {
            workout_start: at(2, 7),
            workout_end: at(2, 8),
            duration_minutes: 60.0,
            activity_name: "Running".to_string(),
            activity_strain: 12.5,
            energy_burned_kcal: Some(600.0),
            max_heart_rate: Some(150.0),
            average_heart_rate: Some(160.0),
            zones: Default::default(),
            cycle_start: Some(at(1, 22)),
        };
        assert_eq!(
            workout.validate().unwrap_err().field,
            "average_heart_rate"
        );
    }
}
