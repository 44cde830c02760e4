//! Source-specific import adapters.
//!
//! # Responsibility
//! - Parse external exports into typed `New*` payloads, row by row.
//! - Accumulate a per-run report so one malformed row never aborts a run.
//!
//! # Invariants
//! - Adapters only parse and validate; writing goes through `Store`.
//! - Whole-file failures (unreadable input, missing required column) are
//!   `ImportError`; per-row failures are data in `ImportReport`.

mod imaging_json;
mod whoop_csv;

pub use imaging_json::parse_imaging_json;
pub use whoop_csv::{parse_cycles_csv, parse_workouts_csv};

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;

#[derive(Debug)]
pub enum ImportError {
    Io(io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    /// Header row lacks a column the adapter cannot do without.
    MissingColumn(&'static str),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read import file: {err}"),
            Self::Csv(err) => write!(f, "malformed csv: {err}"),
            Self::Json(err) => write!(f, "malformed json: {err}"),
            Self::MissingColumn(column) => write!(f, "missing required column `{column}`"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::MissingColumn(_) => None,
        }
    }
}

impl From<io::Error> for ImportError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for ImportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Why one input row was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    /// 1-based line in a CSV file, or 1-based item position in a JSON array.
    pub line: u64,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome<T> {
    Parsed { line: u64, value: T },
    Failed(RowFailure),
}

/// Per-run result of an import adapter, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport<T> {
    pub rows: Vec<RowOutcome<T>>,
}

impl<T> Default for ImportReport<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<T> ImportReport<T> {
    pub(crate) fn parsed(&mut self, line: u64, value: T) {
        self.rows.push(RowOutcome::Parsed { line, value });
    }

    pub(crate) fn failed(&mut self, line: u64, field: impl Into<String>, message: impl Into<String>) {
        self.rows.push(RowOutcome::Failed(RowFailure {
            line,
            field: field.into(),
            message: message.into(),
        }));
    }

    pub fn parsed_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| matches!(row, RowOutcome::Parsed { .. }))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &RowFailure> {
        self.rows.iter().filter_map(|row| match row {
            RowOutcome::Failed(failure) => Some(failure),
            RowOutcome::Parsed { .. } => None,
        })
    }

    /// Splits into parsed values (input order) and failures.
    pub fn into_parts(self) -> (Vec<T>, Vec<RowFailure>) {
        let mut values = Vec::new();
        let mut failures = Vec::new();
        for row in self.rows {
            match row {
                RowOutcome::Parsed { value, .. } => values.push(value),
                RowOutcome::Failed(failure) => failures.push(failure),
            }
        }
        (values, failures)
    }
}
