//! Reported symptom entity.

use super::validation::{require_text, ValidationError, ValidationResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_SYMPTOM_SEVERITY: u8 = 1;
pub const MAX_SYMPTOM_SEVERITY: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymptomStatus {
    Active,
    Improving,
    Resolved,
}

impl SymptomStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Improving => "improving",
            Self::Resolved => "resolved",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "improving" => Ok(Self::Improving),
            "resolved" => Ok(Self::Resolved),
            other => Err(ValidationError::new(
                "status",
                format!("`{other}` is not one of active|improving|resolved"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    Hours,
    Days,
    Weeks,
    Months,
}

impl DurationUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Weeks => "weeks",
            Self::Months => "months",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hour" | "hours" => Ok(Self::Hours),
            "day" | "days" => Ok(Self::Days),
            "week" | "weeks" => Ok(Self::Weeks),
            "month" | "months" => Ok(Self::Months),
            other => Err(ValidationError::new(
                "duration.unit",
                format!("`{other}` is not one of hours|days|weeks|months"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomDuration {
    pub value: u32,
    pub unit: DurationUnit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symptom {
    pub id: Uuid,
    pub name: String,
    pub body_location: Option<String>,
    pub onset_date: NaiveDate,
    pub duration: Option<SymptomDuration>,
    /// 1 (barely noticeable) to 10 (worst imaginable).
    pub severity: u8,
    pub status: SymptomStatus,
    pub frequency: Option<String>,
    pub time_of_day: Option<String>,
    #[serde(default)]
    pub associated_factors: Vec<String>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSymptom {
    pub name: String,
    #[serde(default)]
    pub body_location: Option<String>,
    pub onset_date: NaiveDate,
    #[serde(default)]
    pub duration: Option<SymptomDuration>,
    pub severity: u8,
    pub status: SymptomStatus,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub time_of_day: Option<String>,
    #[serde(default)]
    pub associated_factors: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymptomPatch {
    pub name: Option<String>,
    pub body_location: Option<Option<String>>,
    pub onset_date: Option<NaiveDate>,
    pub duration: Option<Option<SymptomDuration>>,
    pub severity: Option<u8>,
    pub status: Option<SymptomStatus>,
    pub frequency: Option<Option<String>>,
    pub time_of_day: Option<Option<String>>,
    pub associated_factors: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl Symptom {
    pub(crate) fn create(input: NewSymptom, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            body_location: trim_optional(input.body_location),
            onset_date: input.onset_date,
            duration: input.duration,
            severity: input.severity,
            status: input.status,
            frequency: trim_optional(input.frequency),
            time_of_day: trim_optional(input.time_of_day),
            associated_factors: input.associated_factors,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn apply(&mut self, patch: SymptomPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(body_location) = patch.body_location {
            self.body_location = trim_optional(body_location);
        }
        if let Some(onset_date) = patch.onset_date {
            self.onset_date = onset_date;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(severity) = patch.severity {
            self.severity = severity;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(frequency) = patch.frequency {
            self.frequency = trim_optional(frequency);
        }
        if let Some(time_of_day) = patch.time_of_day {
            self.time_of_day = trim_optional(time_of_day);
        }
        if let Some(associated_factors) = patch.associated_factors {
            self.associated_factors = associated_factors;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
    }

    pub fn validate(&self) -> ValidationResult {
        require_text("name", &self.name)?;
        if !(MIN_SYMPTOM_SEVERITY..=MAX_SYMPTOM_SEVERITY).contains(&self.severity) {
            return Err(ValidationError::new(
                "severity",
                format!(
                    "{} is outside {MIN_SYMPTOM_SEVERITY}..={MAX_SYMPTOM_SEVERITY}",
                    self.severity
                ),
            ));
        }
        if let Some(duration) = self.duration {
            if duration.value == 0 {
                return Err(ValidationError::new(
                    "duration.value",
                    "must be greater than zero",
                ));
            }
        }
        Ok(())
    }
}

fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{DurationUnit, NewSymptom, Symptom, SymptomDuration, SymptomStatus};
    use chrono::{NaiveDate, Utc};

    fn input(severity: u8) -> NewSymptom {
        NewSymptom {
            name: "Abdominal pain".to_string(),
            body_location: Some("  ".to_string()),
            onset_date: NaiveDate::from_ymd_opt(2017, 11, 1).unwrap(),
            duration: Some(SymptomDuration {
                value: 3,
                unit: DurationUnit::Days,
            }),
            severity,
            status: SymptomStatus::Active,
            frequency: None,
            time_of_day: None,
            associated_factors: vec!["after meals".to_string()],
            notes: String::new(),
        }
    }

    #[test]
    fn blank_optional_text_is_dropped() {
        let symptom = Symptom::create(input(4), Utc::now());
        assert_eq!(symptom.body_location, None);
        assert!(symptom.validate().is_ok());
    }

    #[test]
    fn severity_must_be_between_one_and_ten() {
        assert_eq!(
            Symptom::create(input(0), Utc::now())
                .validate()
                .unwrap_err()
                .field,
            "severity"
        );
        assert!(Symptom::create(input(11), Utc::now()).validate().is_err());
        assert!(Symptom::create(input(10), Utc::now()).validate().is_ok());
    }

    #[test]
    fn duration_unit_parse_accepts_singular() {
        assert_eq!(DurationUnit::parse("Week").unwrap(), DurationUnit::Weeks);
        assert_eq!(
            DurationUnit::parse("fortnight").unwrap_err().field,
            "duration.unit"
        );
    }
}
