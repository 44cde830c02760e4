//! Structured imaging report adapter: a JSON array of report objects.

use super::{ImportError, ImportReport};
use crate::model::NewImagingReport;
use serde_json::Value;
use std::io::Read;

/// Parses a JSON array of imaging reports, one outcome per element.
///
/// # Errors
/// - `Json` when the input is not a JSON array at all.
pub fn parse_imaging_json<R: Read>(reader: R) -> Result<ImportReport<NewImagingReport>, ImportError> {
    let items: Vec<Value> = serde_json::from_reader(reader)?;
    let mut report = ImportReport::default();
    for (index, item) in items.into_iter().enumerate() {
        let position = index as u64 + 1;
        match serde_json::from_value::<NewImagingReport>(item) {
            Ok(value) => match value.validate() {
                Ok(()) => report.parsed(position, value),
                Err(err) => report.failed(position, err.field, err.reason),
            },
            Err(err) => report.failed(position, "record", err.to_string()),
        }
    }
    Ok(report)
}
