// Boundary formatting for dates crossing the HTTP surface.
//
// Responses render every date as MM/DD/YYYY. Requests may carry RFC 3339
// timestamps, plain YYYY-MM-DD dates, or the same MM/DD/YYYY form the API
// hands out, so clients can echo values back unchanged.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub const RESPONSE_DATE_FORMAT: &str = "%m/%d/%Y";

/// Render a timestamp as MM/DD/YYYY (UTC calendar day)
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(RESPONSE_DATE_FORMAT).to_string()
}

/// Parse any accepted input date form. Plain dates resolve to midnight UTC.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ndt.and_utc());
    }

    ["%Y-%m-%d", RESPONSE_DATE_FORMAT]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

/// serde helpers for required date fields
pub mod date {
    use super::*;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_date(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw)))
    }
}

/// serde helpers for optional date fields
pub mod date_opt {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_str(&format_date(d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => parse_date(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw))),
        }
    }
}
