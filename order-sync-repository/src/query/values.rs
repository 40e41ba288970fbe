//! Clause value helpers shared by both backends.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::{Map, Value};

use crate::errors::TranslateError;

/// `{key: value}`.
pub(crate) fn object(key: &str, value: Value) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(key.to_string(), value);
    Value::Object(map)
}

/// Parse a `YYYY-MM-DD` value into midnight UTC of that day.
pub(crate) fn parse_date(field: &str, value: &Value) -> Result<DateTime<Utc>, TranslateError> {
    let invalid = || TranslateError::InvalidDate {
        field: field.to_string(),
        value: value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string()),
    };

    let raw = value.as_str().ok_or_else(invalid)?;
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}

/// Membership operators take a list; a single value is a list of one.
pub(crate) fn as_list(value: &Value) -> Value {
    match value {
        Value::Array(_) => value.clone(),
        other => Value::Array(vec![other.clone()]),
    }
}

/// `exists` takes a boolean; no value means "must exist".
pub(crate) fn as_presence(field: &str, value: &Value) -> Result<bool, TranslateError> {
    match value {
        Value::Null => Ok(true),
        Value::Bool(present) => Ok(*present),
        _ => Err(TranslateError::invalid_value(field, "exists expects true or false")),
    }
}

pub(crate) fn as_pattern<'a>(field: &str, value: &'a Value) -> Result<&'a str, TranslateError> {
    value
        .as_str()
        .ok_or_else(|| TranslateError::invalid_value(field, "regex expects a string pattern"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_date() {
        let parsed = parse_date("createdAt", &json!("2023-03-01")).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2023-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_date_rejects_other_formats() {
        assert!(parse_date("createdAt", &json!("01/03/2023")).is_err());
        assert!(parse_date("createdAt", &json!("2023-02-30")).is_err());

        let err = parse_date("createdAt", &json!(20230301)).unwrap_err();
        assert_eq!(
            err,
            TranslateError::InvalidDate {
                field: "createdAt".to_string(),
                value: "20230301".to_string()
            }
        );
    }

    #[test]
    fn test_as_list_wraps_scalars() {
        assert_eq!(as_list(&json!("a")), json!(["a"]));
        assert_eq!(as_list(&json!(["a", "b"])), json!(["a", "b"]));
    }

    #[test]
    fn test_as_presence() {
        assert!(as_presence("f", &Value::Null).unwrap());
        assert!(!as_presence("f", &json!(false)).unwrap());
        assert!(as_presence("f", &json!("yes")).is_err());
    }
}
