//! Serde helpers for the backend's loosely typed JSON
//!
//! The API returns numbers where strings are expected, `null` for blank text
//! and a mix of zoned and naive timestamps.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

/// Accepts a string, number or null and yields text
pub fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .map(Scalar::into_text)
        .unwrap_or_default())
}

/// Record and user ids arrive as numbers or strings
pub fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .map(Scalar::into_text)
        .filter(|s| !s.is_empty()))
}

/// Blank strings read as absent
pub fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

/// Counts arrive as numbers, numeric strings or blanks
pub fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Scalar::Int(n)) => u32::try_from(n).map_err(serde::de::Error::custom),
        Some(Scalar::Float(n)) if n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&n) => {
            Ok(n as u32)
        }
        Some(Scalar::Text(s)) if s.trim().is_empty() => Ok(0),
        Some(Scalar::Text(s)) => s.trim().parse().map_err(serde::de::Error::custom),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a count, got {}",
            other.into_text()
        ))),
    }
}

const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp in any of the shapes the backend emits
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(zoned) = DateTime::parse_from_rfc3339(raw) {
        return Some(zoned.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Optional timestamp; empty strings read as absent, unreadable ones fail
pub fn lenient_datetime<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp '{raw}'"))),
    }
}

/// Remove `null` members recursively so `#[serde(default)]` applies
pub fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

/// Cut `YYYY-MM-DDTHH:MM:SS` values back to the date for editing
pub fn truncate_date_fields(map: &mut Map<String, Value>, fields: &[&str]) {
    for field in fields {
        if let Some(Value::String(s)) = map.get_mut(*field) {
            if let Some((date, _)) = s.split_once('T') {
                *s = date.to_string();
            }
        }
    }
}

/// Expand date-only values to midnight datetimes for the backend
pub fn expand_date_fields(map: &mut Map<String, Value>, fields: &[&str]) {
    for field in fields {
        if let Some(Value::String(s)) = map.get_mut(*field) {
            if !s.is_empty() && !s.contains('T') {
                s.push_str("T00:00:00");
            }
        }
    }
}

/// Shallow merge of `overlay` into `base`
pub fn merge_objects(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        base.insert(key, value);
    }
}
