use crate::domain::model::Table;
use crate::utils::error::{ReportError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// The date column every endpoint must expose, and the legacy spelling some still use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateField {
    pub canonical: String,
    pub alias: String,
}

impl Default for DateField {
    fn default() -> Self {
        Self {
            canonical: "entryDate".to_string(),
            alias: "EntryDate".to_string(),
        }
    }
}

/// Parses the date representations the API is known to return.
/// Integers are epoch milliseconds.
pub fn parse_date_value(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_date_str(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.naive_utc()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.naive_local());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Ensures `field.canonical` exists on every record, renaming the alias when only it is
/// present, and rewrites values to [`CANONICAL_DATE_FORMAT`]. Unparseable or missing
/// values become null. An empty table is left alone.
pub fn normalize_date_field(endpoint: &str, table: &mut Table, field: &DateField) -> Result<()> {
    if table.is_empty() {
        return Ok(());
    }

    let source = if table.has_column(&field.canonical) {
        field.canonical.as_str()
    } else if table.has_column(&field.alias) {
        tracing::info!(
            "Column '{}' renamed to '{}' for endpoint '{}'",
            field.alias,
            field.canonical,
            endpoint
        );
        field.alias.as_str()
    } else {
        tracing::error!(
            "Missing '{}' column in data from endpoint '{}'",
            field.canonical,
            endpoint
        );
        return Err(ReportError::Schema {
            endpoint: endpoint.to_string(),
            field: field.canonical.clone(),
            alias: field.alias.clone(),
        });
    };

    let mut coerced = 0usize;
    for record in &mut table.records {
        let raw = if source == field.canonical {
            record.data.get(source).cloned()
        } else {
            record.data.remove(source)
        };
        let normalized = match raw.as_ref().and_then(parse_date_value) {
            Some(dt) => Value::String(dt.format(CANONICAL_DATE_FORMAT).to_string()),
            None => {
                if raw.as_ref().is_some_and(|v| !v.is_null()) {
                    coerced += 1;
                }
                Value::Null
            }
        };
        record.data.insert(field.canonical.clone(), normalized);
    }

    if coerced > 0 {
        tracing::warn!(
            "{} unparseable '{}' value(s) from endpoint '{}' set to null",
            coerced,
            field.canonical,
            endpoint
        );
    }
    Ok(())
}
