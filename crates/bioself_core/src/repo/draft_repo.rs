//! Condition draft repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Keep loosely-typed condition drafts for offline editing.
//! - Track which drafts have been promoted into the encrypted store.
//!
//! # Invariants
//! - Drafts are stored as entered; strict parsing happens only when a
//!   draft is promoted (`ConditionDraft::to_new_condition`).
//! - Pending list order is `created_at ASC, id ASC`.

use crate::db::DbError;
use crate::model::{ConditionStatus, NewCondition, Severity, ValidationError};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DRAFT_SELECT_SQL: &str = "SELECT
    id,
    name,
    codes,
    status,
    severity,
    diagnosed_date,
    resolved_date,
    notes,
    created_at,
    updated_at,
    synced_at,
    last_error,
    sync_attempts
FROM condition_drafts";

pub type DraftResult<T> = Result<T, DraftError>;

#[derive(Debug)]
pub enum DraftError {
    Db(DbError),
    NotFound(Uuid),
    /// Draft input rejected before it reached SQLite.
    Validation(ValidationError),
    /// A stored row cannot be decoded.
    InvalidData(String),
}

impl Display for DraftError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "condition draft not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stored draft: {message}"),
        }
    }
}

impl Error for DraftError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for DraftError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for DraftError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ValidationError> for DraftError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Draft input as typed in the offline editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewConditionDraft {
    pub name: String,
    pub codes: Vec<String>,
    pub status: String,
    pub severity: String,
    /// `YYYY-MM-DD`.
    pub diagnosed_date: String,
    pub resolved_date: Option<String>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionDraft {
    pub id: Uuid,
    pub name: String,
    pub codes: Vec<String>,
    pub status: String,
    pub severity: String,
    pub diagnosed_date: String,
    pub resolved_date: Option<String>,
    pub notes: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub updated_at: i64,
    /// Set once the draft has been promoted into the encrypted store.
    pub synced_at: Option<i64>,
    pub last_error: Option<String>,
    pub sync_attempts: u32,
}

impl ConditionDraft {
    pub fn is_pending(&self) -> bool {
        self.synced_at.is_none()
    }

    /// Strictly parses the draft into a store payload tagged with its origin.
    pub fn to_new_condition(&self) -> Result<NewCondition, ValidationError> {
        let input = NewCondition {
            name: self.name.clone(),
            codes: self.codes.clone(),
            status: ConditionStatus::parse(&self.status)?,
            severity: Severity::parse(&self.severity)?,
            diagnosed_date: parse_date("diagnosed_date", &self.diagnosed_date)?,
            resolved_date: self
                .resolved_date
                .as_deref()
                .filter(|value| !value.trim().is_empty())
                .map(|value| parse_date("resolved_date", value))
                .transpose()?,
            notes: self.notes.clone(),
            origin_draft: Some(self.id),
        };
        input.validate()?;
        Ok(input)
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::new(field, format!("`{value}` is not a YYYY-MM-DD date")))
}

pub trait ConditionDraftRepository {
    fn create_draft(&self, draft: &NewConditionDraft) -> DraftResult<Uuid>;
    fn get_draft(&self, id: Uuid) -> DraftResult<Option<ConditionDraft>>;
    fn list_pending(&self) -> DraftResult<Vec<ConditionDraft>>;
    fn mark_synced(&self, id: Uuid) -> DraftResult<()>;
    /// Keeps the draft pending and records why promotion failed.
    fn record_sync_failure(&self, id: Uuid, message: &str) -> DraftResult<()>;
}

pub struct SqliteConditionDraftRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteConditionDraftRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ConditionDraftRepository for SqliteConditionDraftRepository<'_> {
    fn create_draft(&self, draft: &NewConditionDraft) -> DraftResult<Uuid> {
        if draft.name.trim().is_empty() {
            return Err(ValidationError::new("name", "must not be blank").into());
        }
        let id = Uuid::new_v4();
        let codes = serde_json::to_string(&draft.codes)
            .map_err(|err| DraftError::InvalidData(err.to_string()))?;

        self.conn.execute(
            "INSERT INTO condition_drafts (
                id,
                name,
                codes,
                status,
                severity,
                diagnosed_date,
                resolved_date,
                notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                id.to_string(),
                draft.name.trim(),
                codes,
                draft.status.as_str(),
                draft.severity.as_str(),
                draft.diagnosed_date.as_str(),
                draft.resolved_date.as_deref(),
                draft.notes.as_str(),
            ],
        )?;
        Ok(id)
    }

    fn get_draft(&self, id: Uuid) -> DraftResult<Option<ConditionDraft>> {
        let row = self
            .conn
            .query_row(
                &format!("{DRAFT_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(parse_draft_row(row)),
            )
            .optional()?;
        row.transpose()
    }

    fn list_pending(&self) -> DraftResult<Vec<ConditionDraft>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DRAFT_SELECT_SQL}
             WHERE synced_at IS NULL
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut drafts = Vec::new();
        while let Some(row) = rows.next()? {
            drafts.push(parse_draft_row(row)?);
        }
        Ok(drafts)
    }

    fn mark_synced(&self, id: Uuid) -> DraftResult<()> {
        let changed = self.conn.execute(
            "UPDATE condition_drafts
             SET
                synced_at = (strftime('%s', 'now') * 1000),
                updated_at = (strftime('%s', 'now') * 1000),
                last_error = NULL
             WHERE id = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(DraftError::NotFound(id));
        }
        Ok(())
    }

    fn record_sync_failure(&self, id: Uuid, message: &str) -> DraftResult<()> {
        let changed = self.conn.execute(
            "UPDATE condition_drafts
             SET
                last_error = ?1,
                sync_attempts = sync_attempts + 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2;",
            params![message, id.to_string()],
        )?;
        if changed == 0 {
            return Err(DraftError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_draft_row(row: &Row<'_>) -> DraftResult<ConditionDraft> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        DraftError::InvalidData(format!("invalid uuid `{id_text}` in condition_drafts.id"))
    })?;

    let codes_text: String = row.get("codes")?;
    let codes: Vec<String> = serde_json::from_str(&codes_text).map_err(|err| {
        DraftError::InvalidData(format!("invalid codes for draft {id}: {err}"))
    })?;

    Ok(ConditionDraft {
        id,
        name: row.get("name")?,
        codes,
        status: row.get("status")?,
        severity: row.get("severity")?,
        diagnosed_date: row.get("diagnosed_date")?,
        resolved_date: row.get("resolved_date")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        synced_at: row.get("synced_at")?,
        last_error: row.get("last_error")?,
        sync_attempts: row.get("sync_attempts")?,
    })
}

#[cfg(test)]
mod tests {
    use super::ConditionDraft;
    use crate::model::{ConditionStatus, Severity};
    use uuid::Uuid;

    fn draft(status: &str, diagnosed: &str) -> ConditionDraft {
        ConditionDraft {
            id: Uuid::new_v4(),
            name: "Migraine".to_string(),
            codes: vec!["G43.9".to_string()],
            status: status.to_string(),
            severity: "moderate".to_string(),
            diagnosed_date: diagnosed.to_string(),
            resolved_date: Some(String::new()),
            notes: String::new(),
            created_at: 0,
            updated_at: 0,
            synced_at: None,
            last_error: None,
            sync_attempts: 0,
        }
    }

    #[test]
    fn to_new_condition_tags_origin_and_parses_enums() {
        let draft = draft("in-remission", "2021-06-01");
        let input = draft.to_new_condition().unwrap();
        assert_eq!(input.origin_draft, Some(draft.id));
        assert_eq!(input.status, ConditionStatus::InRemission);
        assert_eq!(input.severity, Severity::Moderate);
        assert_eq!(input.resolved_date, None);
    }

    #[test]
    fn to_new_condition_names_bad_field() {
        assert_eq!(
            draft("cured", "2021-06-01").to_new_condition().unwrap_err().field,
            "status"
        );
        assert_eq!(
            draft("active", "06/01/2021").to_new_condition().unwrap_err().field,
            "diagnosed_date"
        );
    }
}
