//! CSV import/export
//!
//! Bridges CSV files and the entity managers. Import goes through the
//! managers' composite template adds, so lookup values (locations,
//! categories, species, schemes, ratings) are resolved or created
//! idempotently. `detect_new_lookups` is the safety gate: it previews
//! which lookup values an import would create, without writing anything.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};

pub mod sightings_csv;
pub mod status_csv;

pub use sightings_csv::{NewSightingLookups, SightingsTransfer};
pub use status_csv::{NewStatusLookups, StatusTransfer};

/// Round-trippable date format used in CSV files.
pub const CSV_DATE_FMT: &str = "%d/%m/%Y";

/// Timestamp format for rating start/end columns.
pub const CSV_DATETIME_FMT: &str = "%d/%m/%Y %H:%M:%S";

pub(crate) fn parse_csv_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), CSV_DATE_FMT)
        .map_err(|_| Error::InvalidDate(value.trim().to_string()))
}

/// Empty cells mean "unknown"; anything else must parse.
pub(crate) fn parse_csv_datetime(value: &str) -> Result<Option<NaiveDateTime>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(value, CSV_DATETIME_FMT)
        .map(Some)
        .map_err(|_| Error::InvalidDate(value.to_string()))
}

pub(crate) fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "yes" | "true" | "y" | "1"
    )
}

pub(crate) fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
