//! Diagnosed condition entity.
//!
//! # Invariants
//! - `updated_at >= created_at`.
//! - Any status may follow any other; every change re-stamps `updated_at`.
//! - `resolved_date`, when set, is not earlier than `diagnosed_date`.

use super::validation::{check_date_order, require_text, ValidationError, ValidationResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionStatus {
    Active,
    Resolved,
    Chronic,
    InRemission,
}

impl ConditionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Resolved => "resolved",
            Self::Chronic => "chronic",
            Self::InRemission => "in_remission",
        }
    }

    /// Parses boundary input (`in-remission` and `in_remission` both accepted).
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "active" => Ok(Self::Active),
            "resolved" => Ok(Self::Resolved),
            "chronic" => Ok(Self::Chronic),
            "in_remission" => Ok(Self::InRemission),
            other => Err(ValidationError::new(
                "status",
                format!("`{other}` is not one of active|resolved|chronic|in_remission"),
            )),
        }
    }

    /// Active and chronic conditions are shown as current.
    pub fn is_current(self) -> bool {
        matches!(self, Self::Active | Self::Chronic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mild" => Ok(Self::Mild),
            "moderate" => Ok(Self::Moderate),
            "severe" => Ok(Self::Severe),
            other => Err(ValidationError::new(
                "severity",
                format!("`{other}` is not one of mild|moderate|severe"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: Uuid,
    pub name: String,
    /// External terminology codes, e.g. ICD-10 `K58.0`.
    #[serde(default)]
    pub codes: Vec<String>,
    pub status: ConditionStatus,
    pub severity: Severity,
    pub diagnosed_date: NaiveDate,
    pub resolved_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    /// Draft-cache id this condition was promoted from, if any.
    pub origin_draft: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for `Store::add_condition`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCondition {
    pub name: String,
    #[serde(default)]
    pub codes: Vec<String>,
    pub status: ConditionStatus,
    pub severity: Severity,
    pub diagnosed_date: NaiveDate,
    #[serde(default)]
    pub resolved_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub origin_draft: Option<Uuid>,
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionPatch {
    pub name: Option<String>,
    pub codes: Option<Vec<String>>,
    pub status: Option<ConditionStatus>,
    pub severity: Option<Severity>,
    pub diagnosed_date: Option<NaiveDate>,
    /// `Some(None)` clears the resolved date.
    pub resolved_date: Option<Option<NaiveDate>>,
    pub notes: Option<String>,
}

impl Condition {
    pub(crate) fn create(input: NewCondition, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            codes: normalize_codes(input.codes),
            status: input.status,
            severity: input.severity,
            diagnosed_date: input.diagnosed_date,
            resolved_date: input.resolved_date,
            notes: input.notes,
            origin_draft: input.origin_draft,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn apply(&mut self, patch: ConditionPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(codes) = patch.codes {
            self.codes = normalize_codes(codes);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(severity) = patch.severity {
            self.severity = severity;
        }
        if let Some(diagnosed_date) = patch.diagnosed_date {
            self.diagnosed_date = diagnosed_date;
        }
        if let Some(resolved_date) = patch.resolved_date {
            self.resolved_date = resolved_date;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
    }

    pub fn validate(&self) -> ValidationResult {
        validate_fields(&self.name, &self.codes, self.diagnosed_date, self.resolved_date)
    }
}

impl NewCondition {
    pub fn validate(&self) -> ValidationResult {
        validate_fields(&self.name, &self.codes, self.diagnosed_date, self.resolved_date)
    }
}

fn validate_fields(
    name: &str,
    codes: &[String],
    diagnosed_date: NaiveDate,
    resolved_date: Option<NaiveDate>,
) -> ValidationResult {
    require_text("name", name)?;
    if codes.iter().any(|code| code.trim().is_empty()) {
        return Err(ValidationError::new("codes", "codes must not be blank"));
    }
    check_date_order("resolved_date", diagnosed_date, resolved_date)
}

fn normalize_codes(codes: Vec<String>) -> Vec<String> {
    codes
        .into_iter()
        .map(|code| code.trim().to_ascii_uppercase())
        .collect()
}
