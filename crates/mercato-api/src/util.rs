use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

/// Row ids are TEXT in SQLite; a corrupt value is logged rather than bubbled
/// up, matching how read paths tolerate bad rows.
pub(crate) fn parse_uuid(value: &str, what: &str) -> Uuid {
    value.parse().unwrap_or_else(|e| {
        warn!("Corrupt {what} '{value}': {e}");
        Uuid::default()
    })
}

pub(crate) fn parse_opt_uuid(value: Option<&str>, what: &str) -> Option<Uuid> {
    value.map(|v| parse_uuid(v, what))
}

pub(crate) fn parse_utc(value: &str, what: &str) -> DateTime<Utc> {
    value
        .parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt {what} '{value}': {e}");
            DateTime::default()
        })
}
