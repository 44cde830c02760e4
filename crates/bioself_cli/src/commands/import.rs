use super::store::unlock;
use crate::error::CliResult;
use bioself_core::{
    parse_cycles_csv, parse_imaging_json, parse_workouts_csv, BatchOutcome, RowFailure,
    StoreConfig,
};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub fn run_whoop_cycles(config: &StoreConfig, csv_path: &Path) -> CliResult<()> {
    let report = parse_cycles_csv(BufReader::new(File::open(csv_path)?))?;
    let (cycles, failures) = report.into_parts();
    let mut store = unlock(config)?;
    let outcome = store.add_whoop_cycles(cycles)?;
    print_outcome("whoop cycles", &outcome, &failures);
    Ok(())
}

pub fn run_whoop_workouts(config: &StoreConfig, csv_path: &Path) -> CliResult<()> {
    let report = parse_workouts_csv(BufReader::new(File::open(csv_path)?))?;
    let (workouts, failures) = report.into_parts();
    let mut store = unlock(config)?;
    let outcome = store.add_whoop_workouts(workouts)?;
    print_outcome("whoop workouts", &outcome, &failures);
    Ok(())
}

pub fn run_imaging(config: &StoreConfig, json_path: &Path) -> CliResult<()> {
    let report = parse_imaging_json(BufReader::new(File::open(json_path)?))?;
    let (reports, failures) = report.into_parts();
    let mut store = unlock(config)?;
    let outcome = store.add_imaging_reports(reports)?;
    print_outcome("imaging reports", &outcome, &failures);
    Ok(())
}

fn print_outcome(label: &str, outcome: &BatchOutcome, failures: &[RowFailure]) {
    println!(
        "{label}: inserted={} duplicate={} failed={} revision={}",
        outcome.inserted,
        outcome.skipped,
        failures.len(),
        outcome.snapshot.revision
    );
    for failure in failures {
        eprintln!(
            "  line {}: `{}`: {}",
            failure.line, failure.field, failure.message
        );
    }
}
