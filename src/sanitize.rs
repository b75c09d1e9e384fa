// src/sanitize.rs
//! Input sanitizing shared by request validation and the HTTP layer.
//!
//! Every string that reaches Notion passes through here: trimmed, stripped
//! of control characters and capped in length. Dates and hours are parsed
//! into one canonical form.

use crate::constants::{DEFAULT_EMPLOYEE_HOURS, MAX_EMPLOYEE_HOURS};
use crate::types::ValidationError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Trims, drops control characters (newlines and tabs survive) and caps
/// the result at `max_chars` characters.
pub fn clean_text(input: &str, max_chars: usize) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .take(max_chars)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Like [`clean_text`] but treats an empty result as absent.
pub fn clean_optional(input: Option<&str>, max_chars: usize) -> Option<String> {
    input
        .map(|s| clean_text(s, max_chars))
        .filter(|s| !s.is_empty())
}

/// Rejects text longer than `max_chars` instead of truncating it.
pub fn bounded_text(
    field: &'static str,
    input: &str,
    max_chars: usize,
) -> Result<String, ValidationError> {
    let cleaned = clean_text(input, usize::MAX);
    if cleaned.chars().count() > max_chars {
        return Err(ValidationError::TooLong {
            field,
            max: max_chars,
        });
    }
    Ok(cleaned)
}

/// Canonical form of a parte date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (normalized to UTC with
/// millisecond precision) and `YYYY-MM-DDTHH:MM[:SS]` local timestamps as
/// sent by HTML datetime inputs.
pub fn normalize_date(input: &str) -> Result<String, ValidationError> {
    let value = input.trim();
    let invalid = || ValidationError::InvalidDate {
        value: value.to_string(),
    };

    if value.is_empty() {
        return Err(invalid());
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.format("%Y-%m-%d").to_string());
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true));
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(local) = NaiveDateTime::parse_from_str(value, pattern) {
            return Ok(local.format("%Y-%m-%dT%H:%M:%S").to_string());
        }
    }

    Err(invalid())
}

/// Hours from a JSON value that may be a number, a numeric string or null.
///
/// Null means "not given" and yields the default working day.
pub fn hours_value(employee: &str, value: &Value) -> Result<f64, ValidationError> {
    let invalid = |v: f64| ValidationError::InvalidHours {
        employee: employee.to_string(),
        value: v,
    };

    let hours = match value {
        Value::Null => DEFAULT_EMPLOYEE_HOURS,
        Value::Number(n) => n.as_f64().ok_or_else(|| invalid(f64::NAN))?,
        Value::String(s) if s.trim().is_empty() => DEFAULT_EMPLOYEE_HOURS,
        Value::String(s) => s
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| invalid(f64::NAN))?,
        _ => return Err(invalid(f64::NAN)),
    };

    if !hours.is_finite() || !(0.0..=MAX_EMPLOYEE_HOURS).contains(&hours) {
        return Err(invalid(hours));
    }
    Ok(hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_text_strips_controls_and_caps_length() {
        assert_eq!(clean_text("  hola\u{0007} mundo  ", 100), "hola mundo");
        assert_eq!(clean_text("línea 1\nlínea 2", 100), "línea 1\nlínea 2");
        assert_eq!(clean_text("ñandú", 3), "ñan");
    }

    #[test]
    fn clean_optional_treats_blank_as_absent() {
        assert_eq!(clean_optional(Some("   "), 10), None);
        assert_eq!(clean_optional(None, 10), None);
        assert_eq!(clean_optional(Some(" x "), 10).as_deref(), Some("x"));
    }

    #[test]
    fn bounded_text_rejects_overlong_input() {
        assert!(bounded_text("notas", "abc", 3).is_ok());
        assert_eq!(
            bounded_text("notas", "abcd", 3),
            Err(ValidationError::TooLong {
                field: "notas",
                max: 3
            })
        );
    }

    #[test]
    fn dates_are_normalized() {
        assert_eq!(normalize_date("2024-03-10").unwrap(), "2024-03-10");
        assert_eq!(
            normalize_date("2024-03-10T09:00:00+01:00").unwrap(),
            "2024-03-10T08:00:00.000Z"
        );
        assert_eq!(
            normalize_date("2024-03-10T07:30").unwrap(),
            "2024-03-10T07:30:00"
        );
        assert!(normalize_date("10/03/2024").is_err());
        assert!(normalize_date("").is_err());
        assert!(normalize_date("2024-02-30").is_err());
    }

    #[test]
    fn hours_accept_numbers_and_numeric_strings() {
        assert_eq!(hours_value("e1", &json!(8.5)).unwrap(), 8.5);
        assert_eq!(hours_value("e1", &json!("7,5")).unwrap(), 7.5);
        assert_eq!(hours_value("e1", &json!(null)).unwrap(), 8.0);
        assert!(hours_value("e1", &json!(25)).is_err());
        assert!(hours_value("e1", &json!(-1)).is_err());
        assert!(hours_value("e1", &json!("ocho")).is_err());
        assert!(hours_value("e1", &json!([8])).is_err());
    }
}
