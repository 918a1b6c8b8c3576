use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::value::Value;

const DATE_PREFIX: &str = "date-";

/// Turns one raw scalar token into a typed value.
///
/// Tokens carrying the `date-` prefix become date values; a remainder that
/// does not parse becomes an invalid date (`Value::Date(None)`) rather than
/// an error, leaving validation to the consumer. Everything else passes
/// through as a string. Field names and operator tokens are never coerced.
pub fn coerce(raw: &str) -> Value {
    match raw.strip_prefix(DATE_PREFIX) {
        Some(rest) => Value::Date(parse_date(rest)),
        None => Value::String(raw.to_string()),
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    None
}
