//! Whoop export CSV adapter (`physiological_cycles.csv`, `workouts.csv`).
//!
//! Columns are located by header name, so column order and extra columns
//! do not matter. Blank cells are absent readings.

use super::{ImportError, ImportReport};
use crate::model::{
    CycleMetrics, HeartRateZones, NewWhoopCycle, NewWhoopWorkout, WhoopMetric,
};
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::io::Read;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

const CYCLE_START: &str = "Cycle start time";
const CYCLE_END: &str = "Cycle end time";
const CYCLE_TIMEZONE: &str = "Cycle timezone";

const CYCLE_METRIC_COLUMNS: &[(WhoopMetric, &str)] = &[
    (WhoopMetric::RecoveryScore, "Recovery score %"),
    (WhoopMetric::RestingHeartRate, "Resting heart rate (bpm)"),
    (WhoopMetric::HrvMs, "Heart rate variability (ms)"),
    (WhoopMetric::SkinTempCelsius, "Skin temp (celsius)"),
    (WhoopMetric::BloodOxygenPct, "Blood oxygen %"),
    (WhoopMetric::DayStrain, "Day Strain"),
    (WhoopMetric::EnergyBurnedKcal, "Energy burned (cal)"),
    (WhoopMetric::RespiratoryRate, "Respiratory rate (rpm)"),
    (WhoopMetric::SleepPerformancePct, "Sleep performance %"),
    (WhoopMetric::AsleepMinutes, "Asleep duration (min)"),
    (WhoopMetric::InBedMinutes, "In bed duration (min)"),
    (WhoopMetric::LightSleepMinutes, "Light sleep duration (min)"),
    (WhoopMetric::DeepSleepMinutes, "Deep (SWS) duration (min)"),
    (WhoopMetric::RemSleepMinutes, "REM duration (min)"),
    (WhoopMetric::AwakeMinutes, "Awake duration (min)"),
    (WhoopMetric::SleepNeedMinutes, "Sleep need (min)"),
    (WhoopMetric::SleepDebtMinutes, "Sleep debt (min)"),
    (WhoopMetric::SleepEfficiencyPct, "Sleep efficiency %"),
    (WhoopMetric::SleepConsistencyPct, "Sleep consistency %"),
];

const WORKOUT_START: &str = "Workout start time";
const WORKOUT_END: &str = "Workout end time";
const WORKOUT_DURATION: &str = "Duration (min)";
const WORKOUT_ACTIVITY: &str = "Activity name";
const WORKOUT_STRAIN: &str = "Activity Strain";
const WORKOUT_ENERGY: &str = "Energy burned (cal)";
const WORKOUT_MAX_HR: &str = "Max HR (bpm)";
const WORKOUT_AVG_HR: &str = "Average HR (bpm)";
const WORKOUT_ZONES: [&str; 5] = [
    "HR Zone 1 %",
    "HR Zone 2 %",
    "HR Zone 3 %",
    "HR Zone 4 %",
    "HR Zone 5 %",
];

/// Header name to column index, matched case-insensitively.
struct Columns(HashMap<String, usize>);

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        Self(
            headers
                .iter()
                .enumerate()
                .map(|(index, name)| (name.trim().to_ascii_lowercase(), index))
                .collect(),
        )
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.0.get(&name.to_ascii_lowercase()).copied()
    }

    fn require(&self, name: &'static str) -> Result<usize, ImportError> {
        self.index(name).ok_or(ImportError::MissingColumn(name))
    }
}

/// One failed cell: `(field, message)`.
type CellError = (&'static str, String);

struct Row<'a> {
    record: &'a StringRecord,
    columns: &'a Columns,
}

impl Row<'_> {
    fn cell(&self, column: &str) -> Option<&str> {
        self.columns
            .index(column)
            .and_then(|index| self.record.get(index))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn text(&self, field: &'static str, column: &str) -> Result<String, CellError> {
        self.cell(column)
            .map(str::to_string)
            .ok_or((field, format!("`{column}` is blank")))
    }

    fn datetime(&self, field: &'static str, column: &str) -> Result<Option<NaiveDateTime>, CellError> {
        let Some(raw) = self.cell(column) else {
            return Ok(None);
        };
        DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(Some)
            .ok_or((field, format!("`{raw}` is not a date-time")))
    }

    fn required_datetime(&self, field: &'static str, column: &str) -> Result<NaiveDateTime, CellError> {
        self.datetime(field, column)?
            .ok_or((field, format!("`{column}` is blank")))
    }

    fn number(&self, field: &'static str, column: &str) -> Result<Option<f64>, CellError> {
        let Some(raw) = self.cell(column) else {
            return Ok(None);
        };
        raw.parse::<f64>()
            .map(Some)
            .map_err(|_| (field, format!("`{raw}` is not a number")))
    }

    fn required_number(&self, field: &'static str, column: &str) -> Result<f64, CellError> {
        self.number(field, column)?
            .ok_or((field, format!("`{column}` is blank")))
    }
}

/// Parses a Whoop `physiological_cycles.csv` export.
///
/// # Errors
/// - `MissingColumn` when the start, end or timezone column is absent.
pub fn parse_cycles_csv<R: Read>(reader: R) -> Result<ImportReport<NewWhoopCycle>, ImportError> {
    parse_rows(reader, &[CYCLE_START, CYCLE_END, CYCLE_TIMEZONE], |row| {
        let mut metrics = CycleMetrics::default();
        for (metric, column) in CYCLE_METRIC_COLUMNS {
            metrics.set(*metric, row.number(metric.field_name(), column)?);
        }
        let cycle = NewWhoopCycle {
            cycle_start: row.required_datetime("cycle_start", CYCLE_START)?,
            cycle_end: row.datetime("cycle_end", CYCLE_END)?,
            timezone: row.text("timezone", CYCLE_TIMEZONE)?,
            metrics,
        };
        cycle
            .validate()
            .map_err(|err| (err.field, err.reason))?;
        Ok(cycle)
    })
}

/// Parses a Whoop `workouts.csv` export.
///
/// # Errors
/// - `MissingColumn` when a workout start/end, duration, activity or strain
///   column is absent.
pub fn parse_workouts_csv<R: Read>(
    reader: R,
) -> Result<ImportReport<NewWhoopWorkout>, ImportError> {
    let required = [
        WORKOUT_START,
        WORKOUT_END,
        WORKOUT_DURATION,
        WORKOUT_ACTIVITY,
        WORKOUT_STRAIN,
    ];
    parse_rows(reader, &required, |row| {
        let workout = NewWhoopWorkout {
            workout_start: row.required_datetime("workout_start", WORKOUT_START)?,
            workout_end: row.required_datetime("workout_end", WORKOUT_END)?,
            duration_minutes: row.required_number("duration_minutes", WORKOUT_DURATION)?,
            activity_name: row.text("activity_name", WORKOUT_ACTIVITY)?,
            activity_strain: row.required_number("activity_strain", WORKOUT_STRAIN)?,
            energy_burned_kcal: row.number("energy_burned_kcal", WORKOUT_ENERGY)?,
            max_heart_rate: row.number("max_heart_rate", WORKOUT_MAX_HR)?,
            average_heart_rate: row.number("average_heart_rate", WORKOUT_AVG_HR)?,
            zones: HeartRateZones {
                zone1_pct: row.number("zone1_pct", WORKOUT_ZONES[0])?,
                zone2_pct: row.number("zone2_pct", WORKOUT_ZONES[1])?,
                zone3_pct: row.number("zone3_pct", WORKOUT_ZONES[2])?,
                zone4_pct: row.number("zone4_pct", WORKOUT_ZONES[3])?,
                zone5_pct: row.number("zone5_pct", WORKOUT_ZONES[4])?,
            },
            cycle_start: row.datetime("cycle_start", CYCLE_START)?,
        };
        workout
            .validate()
            .map_err(|err| (err.field, err.reason))?;
        Ok(workout)
    })
}

fn parse_rows<R, T, F>(
    reader: R,
    required: &[&'static str],
    parse: F,
) -> Result<ImportReport<T>, ImportError>
where
    R: Read,
    F: Fn(&Row<'_>) -> Result<T, CellError>,
{
    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let columns = Columns::from_headers(csv.headers()?);
    for column in required {
        columns.require(column)?;
    }

    let mut report = ImportReport::default();
    for (index, result) in csv.records().enumerate() {
        // Header is line 1; fall back to the record index when the reader
        // has no position.
        let fallback_line = index as u64 + 2;
        match result {
            Ok(record) => {
                let line = record.position().map_or(fallback_line, |p| p.line());
                let row = Row {
                    record: &record,
                    columns: &columns,
                };
                match parse(&row) {
                    Ok(value) => report.parsed(line, value),
                    Err((field, message)) => report.failed(line, field, message),
                }
            }
            Err(err) => {
                let line = err.position().map_or(fallback_line, |p| p.line());
                report.failed(line, "row", err.to_string());
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::{parse_cycles_csv, parse_workouts_csv};
    use crate::import::{ImportError, RowOutcome};

    const CYCLES: &str = "\
Cycle start time,Cycle end time,Cycle timezone,Recovery score %,Resting heart rate (bpm),Heart rate variability (ms),Asleep duration (min)
2024-01-01 22:10:00,2024-01-02 22:40:00,UTC-05:00,64,52,71,430
2024-01-02 22:40:00,,UTC-05:00,,55,,
2024-01-03 23:00:00,2024-01-04 22:00:00,UTC-05:00,abc,50,60,400
";

    #[test]
    fn cycles_blank_cells_are_absent_and_bad_cells_fail_the_row() {
        let report = parse_cycles_csv(CYCLES.as_bytes()).unwrap();
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.parsed_count(), 2);

        match &report.rows[1] {
            RowOutcome::Parsed { line, value } => {
                assert_eq!(*line, 3);
                assert_eq!(value.cycle_end, None);
                assert_eq!(value.metrics.recovery_score, None);
                assert_eq!(value.metrics.resting_heart_rate, Some(55.0));
            }
            other => panic!("expected parsed row, got {other:?}"),
        }

        let failure = report.failures().next().unwrap();
        assert_eq!(failure.line, 4);
        assert_eq!(failure.field, "recovery_score");
    }

    #[test]
    fn cycles_missing_required_column_is_whole_file_error() {
        let err = parse_cycles_csv("Recovery score %\n64\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn("Cycle start time")));
    }

    #[test]
    fn cycles_out_of_range_metric_is_reported_by_field() {
        let csv = "Cycle start time,Cycle end time,Cycle timezone,Blood oxygen %\n\
2024-01-01 22:10:00,2024-01-02 22:40:00,UTC+01:00,140\n";
        let report = parse_cycles_csv(csv.as_bytes()).unwrap();
        assert_eq!(report.failures().next().unwrap().field, "blood_oxygen_pct");
    }

    #[test]
    fn workouts_parse_zones_and_cycle_reference() {
        let csv = "\
Cycle start time,Workout start time,Workout end time,Duration (min),Activity name,Activity Strain,Max HR (bpm),Average HR (bpm),HR Zone 1 %,HR Zone 2 %,HR Zone 3 %,HR Zone 4 %,HR Zone 5 %
2024-01-01 22:10:00,2024-01-02 07:00:00,2024-01-02 07:45:00,45,Running,11.2,171,148,5,20,40,30,5
2024-01-01 22:10:00,2024-01-02 18:00:00,2024-01-02 17:00:00,60,Cycling,9.0,,,,,,,
";
        let report = parse_workouts_csv(csv.as_bytes()).unwrap();
        let (values, failures) = report.into_parts();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].zones.zone3_pct, Some(40.0));
        assert!(values[0].cycle_start.is_some());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].field, "workout_end");
    }
}
