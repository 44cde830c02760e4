//! Field-level validation shared by every entity.

use chrono::{NaiveDate, NaiveDateTime};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ValidationResult = Result<(), ValidationError>;

/// A required field is missing or a value is out of range.
///
/// `field` always names the offending field in snake_case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid `{}`: {}", self.field, self.reason)
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be blank"));
    }
    Ok(())
}

pub(crate) fn check_range(
    field: &'static str,
    value: Option<f64>,
    min: f64,
    max: f64,
) -> ValidationResult {
    match value {
        Some(v) if !v.is_finite() => Err(ValidationError::new(field, "must be a finite number")),
        Some(v) if v < min || v > max => Err(ValidationError::new(
            field,
            format!("{v} is outside {min}..={max}"),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn check_date_order(
    field: &'static str,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> ValidationResult {
    match end {
        Some(end) if end < start => Err(ValidationError::new(
            field,
            format!("{end} is earlier than {start}"),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn check_time_order(
    field: &'static str,
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
) -> ValidationResult {
    match end {
        Some(end) if end < start => Err(ValidationError::new(
            field,
            format!("{end} is earlier than {start}"),
        )),
        _ => Ok(()),
    }
}
