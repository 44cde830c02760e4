//! Imaging report entity.
//!
//! # Invariants
//! - Natural key is `(date, body_part, modality)`; `body_part` compares
//!   trimmed and case-folded.

use super::validation::{require_text, ValidationError, ValidationResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Written as its snake_case code; read through [`ImagingModality::parse`]
/// so report exports spelling `"CT"` or `"X-Ray"` load too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImagingModality {
    XRay,
    Ct,
    Mri,
    Ultrasound,
    Pet,
    Mammography,
    Nuclear,
    Other,
}

impl ImagingModality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::XRay => "x_ray",
            Self::Ct => "ct",
            Self::Mri => "mri",
            Self::Ultrasound => "ultrasound",
            Self::Pet => "pet",
            Self::Mammography => "mammography",
            Self::Nuclear => "nuclear",
            Self::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::XRay => "X-ray",
            Self::Ct => "CT",
            Self::Mri => "MRI",
            Self::Ultrasound => "Ultrasound",
            Self::Pet => "PET",
            Self::Mammography => "Mammography",
            Self::Nuclear => "Nuclear medicine",
            Self::Other => "Imaging",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "x_ray" | "xray" | "radiograph" => Ok(Self::XRay),
            "ct" | "cat" => Ok(Self::Ct),
            "mri" => Ok(Self::Mri),
            "ultrasound" | "us" => Ok(Self::Ultrasound),
            "pet" | "pet_ct" => Ok(Self::Pet),
            "mammography" | "mammogram" => Ok(Self::Mammography),
            "nuclear" => Ok(Self::Nuclear),
            "other" => Ok(Self::Other),
            other => Err(ValidationError::new(
                "type",
                format!("`{other}` is not a known imaging modality"),
            )),
        }
    }
}

impl<'de> Deserialize<'de> for ImagingModality {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(|err| serde::de::Error::custom(err.reason))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagingReport {
    pub id: Uuid,
    /// Serialized as `type` to match the report schema naming.
    #[serde(rename = "type")]
    pub modality: ImagingModality,
    pub body_part: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub indication: String,
    #[serde(default)]
    pub findings: String,
    #[serde(default)]
    pub impression: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewImagingReport {
    #[serde(rename = "type")]
    pub modality: ImagingModality,
    pub body_part: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub indication: String,
    #[serde(default)]
    pub findings: String,
    #[serde(default)]
    pub impression: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImagingReportPatch {
    pub modality: Option<ImagingModality>,
    pub body_part: Option<String>,
    pub date: Option<NaiveDate>,
    pub indication: Option<String>,
    pub findings: Option<String>,
    pub impression: Option<String>,
    pub notes: Option<Option<String>>,
}

/// Dedupe key for imaging reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImagingKey {
    pub date: NaiveDate,
    pub body_part: String,
    pub modality: ImagingModality,
}

impl ImagingKey {
    pub fn new(date: NaiveDate, body_part: &str, modality: ImagingModality) -> Self {
        Self {
            date,
            body_part: body_part.trim().to_lowercase(),
            modality,
        }
    }
}

impl NewImagingReport {
    pub fn natural_key(&self) -> ImagingKey {
        ImagingKey::new(self.date, &self.body_part, self.modality)
    }

    pub fn validate(&self) -> ValidationResult {
        require_text("body_part", &self.body_part)
    }
}

impl ImagingReport {
    pub(crate) fn create(input: NewImagingReport, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            modality: input.modality,
            body_part: input.body_part.trim().to_string(),
            date: input.date,
            indication: input.indication,
            findings: input.findings,
            impression: input.impression,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn apply(&mut self, patch: ImagingReportPatch) {
        if let Some(modality) = patch.modality {
            self.modality = modality;
        }
        if let Some(body_part) = patch.body_part {
            self.body_part = body_part.trim().to_string();
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(indication) = patch.indication {
            self.indication = indication;
        }
        if let Some(findings) = patch.findings {
            self.findings = findings;
        }
        if let Some(impression) = patch.impression {
            self.impression = impression;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
    }

    pub fn natural_key(&self) -> ImagingKey {
        ImagingKey::new(self.date, &self.body_part, self.modality)
    }

    pub fn validate(&self) -> ValidationResult {
        require_text("body_part", &self.body_part)
    }
}

#[cfg(test)]
mod tests {
    use super::{ImagingKey, ImagingModality};
    use chrono::NaiveDate;

    #[test]
    fn natural_key_folds_case_and_whitespace() {
        let date = NaiveDate::from_ymd_opt(2017, 11, 12).unwrap();
        assert_eq!(
            ImagingKey::new(date, " Abdomen and Pelvis ", ImagingModality::Ct),
            ImagingKey::new(date, "abdomen and pelvis", ImagingModality::Ct)
        );
        assert_ne!(
            ImagingKey::new(date, "Abdomen and Pelvis", ImagingModality::Ct),
            ImagingKey::new(date, "Abdomen and Pelvis", ImagingModality::Mri)
        );
    }

    #[test]
    fn modality_parse_accepts_common_spellings() {
        assert_eq!(ImagingModality::parse("X-Ray").unwrap(), ImagingModality::XRay);
        assert_eq!(ImagingModality::parse("CT").unwrap(), ImagingModality::Ct);
        assert_eq!(ImagingModality::parse("pet-ct").unwrap(), ImagingModality::Pet);
        assert_eq!(ImagingModality::parse("sonar").unwrap_err().field, "type");
    }
}
