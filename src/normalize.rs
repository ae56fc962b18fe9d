use regex::Regex;
use serde_json::Value;

use crate::model::Reject;

/// Admissible creation-year window for one source. The floor and ceiling are
/// inclusive; `reject_missing` marks sources that treat an absent year as
/// unusable rather than storable as NULL.
#[derive(Debug, Clone, Copy)]
pub struct YearPolicy {
    pub floor: i64,
    pub ceiling: Option<i64>,
    pub reject_missing: bool,
}

impl YearPolicy {
    pub fn check(&self, year: Option<i64>) -> Result<(), Reject> {
        match year {
            Some(year) if year < self.floor => Err(Reject::YearBelowFloor { year }),
            Some(year) if self.ceiling.is_some_and(|ceiling| year > ceiling) => {
                Err(Reject::YearAboveCeiling { year })
            }
            None if self.reject_missing => Err(Reject::MissingYear),
            _ => Ok(()),
        }
    }
}

/// First match of `pattern` in `raw`, trimmed. `None` when the pattern never
/// matches or the match trims to nothing. Left-anchored extraction patterns
/// use this to strip a trailing parenthetical qualifier from titles.
pub fn first_match_trimmed(pattern: &Regex, raw: &str) -> Option<String> {
    let matched = pattern.find(raw)?.as_str().trim();
    if matched.is_empty() {
        None
    } else {
        Some(matched.to_string())
    }
}

/// First numeric token in a free-text measurement string.
pub fn first_float(pattern: &Regex, raw: &str) -> Option<f64> {
    pattern.find(raw).and_then(|m| m.as_str().parse().ok())
}

/// String field access where missing, non-string, and empty values all read
/// as absent.
pub fn non_empty_str<'a>(record: &'a Value, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Integer field access where missing, non-integer, and zero values all read
/// as absent.
pub fn int_field(record: &Value, key: &str) -> Option<i64> {
    record
        .get(key)
        .and_then(Value::as_i64)
        .filter(|&value| value != 0)
}
