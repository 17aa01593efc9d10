//! Expiry parsing shared by the profile store and the importers
//!
//! Credential exports disagree on how to express expiry: RFC 3339 strings,
//! Unix seconds, Unix milliseconds (as numbers or strings), or a relative
//! `expires_in`. Everything is normalized to `Option<DateTime<Utc>>` where
//! `None` means "never expires".

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde_json::Value;

/// Numeric timestamps above this are taken as milliseconds
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Cap on `expires_in` (100 years)
const MAX_RELATIVE_SECS: i64 = 100 * 365 * 24 * 60 * 60;

/// Parse an absolute timestamp.
///
/// `Ok(None)` for values that mean "unset" (null, empty string, zero, the
/// `0001-01-01T00:00:00Z` zero time); `Err` for values that are present but
/// unreadable.
pub(crate) fn parse_absolute(value: &Value) -> Result<Option<DateTime<Utc>>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => {
            let raw = n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .ok_or_else(|| format!("timestamp {n} out of range"))?;
            from_epoch(raw)
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            if let Ok(raw) = s.parse::<i64>() {
                return from_epoch(raw);
            }
            let parsed = DateTime::parse_from_rfc3339(s)
                .map_err(|e| format!("invalid timestamp {s:?}: {e}"))?
                .with_timezone(&Utc);
            if parsed.year() <= 1 {
                Ok(None)
            } else {
                Ok(Some(parsed))
            }
        }
        other => Err(format!("unsupported timestamp value: {other}")),
    }
}

/// Parse a relative `expires_in` seconds count (number or numeric string).
///
/// `Ok(None)` for null or an empty string.
pub(crate) fn parse_relative_secs(value: &Value) -> Result<Option<i64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| format!("expires_in {n} out of range")),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|e| format!("invalid expires_in {s:?}: {e}")),
        other => Err(format!("unsupported expires_in value: {other}")),
    }
}

/// Combine relative and absolute expiry.
///
/// A positive relative count wins and is added to `now`; otherwise the
/// absolute timestamp is used; otherwise the credential never expires. A
/// value that is present but unreadable is an error, never "no expiry".
pub(crate) fn resolve_expiry(
    absolute: Option<&Value>,
    relative: Option<&Value>,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, String> {
    let relative = relative.map(parse_relative_secs).transpose()?.flatten();
    if let Some(secs) = relative.filter(|s| *s > 0) {
        return Ok(now.checked_add_signed(Duration::seconds(secs.min(MAX_RELATIVE_SECS))));
    }

    match absolute {
        Some(value) => parse_absolute(value),
        None => Ok(None),
    }
}

fn from_epoch(raw: i64) -> Result<Option<DateTime<Utc>>, String> {
    if raw <= 0 {
        return Ok(None);
    }
    let ts = if raw >= MILLIS_THRESHOLD {
        Utc.timestamp_millis_opt(raw).single()
    } else {
        Utc.timestamp_opt(raw, 0).single()
    };
    ts.map(Some)
        .ok_or_else(|| format!("timestamp {raw} out of range"))
}

/// serde adapter for `AuthProfile::expires_at`
pub(crate) fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
    parse_absolute(&value).map_err(serde::de::Error::custom)
}
