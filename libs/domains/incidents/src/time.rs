//! Timestamp conversion.
//!
//! On disk every instant is double-precision seconds since the epoch at
//! microsecond precision. The read API emits RFC 3339; the write API accepts
//! RFC 3339 or a Unix-millisecond integer depending on the field.

use crate::error::{DomainError, DomainResult};
use chrono::{DateTime, TimeZone, Utc};

/// The current instant as stored seconds.
pub fn now_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

pub fn seconds_to_datetime(seconds: f64) -> DateTime<Utc> {
    let micros = (seconds * 1_000_000.0).round() as i64;
    Utc.timestamp_micros(micros).single().unwrap_or_default()
}

/// RFC 3339 with explicit offset, for the read API.
pub fn seconds_to_rfc3339(seconds: f64) -> String {
    seconds_to_datetime(seconds).to_rfc3339()
}

/// Parse a wire instant: RFC 3339 text or a Unix-millisecond integer.
pub fn parse_instant(value: &serde_json::Value) -> DomainResult<f64> {
    match value {
        serde_json::Value::String(s) => {
            let parsed = DateTime::parse_from_rfc3339(s).map_err(|e| {
                DomainError::InvalidValue(format!("not an RFC 3339 instant '{}': {}", s, e))
            })?;
            Ok(parsed.timestamp_micros() as f64 / 1_000_000.0)
        }
        serde_json::Value::Number(n) => {
            let millis = n.as_i64().ok_or_else(|| {
                DomainError::InvalidValue(format!("not a Unix-millisecond instant: {}", n))
            })?;
            Ok(millis as f64 / 1_000.0)
        }
        other => Err(DomainError::InvalidValue(format!(
            "expected an instant, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_at_microsecond_precision() {
        let seconds = 1_722_470_400.123456;
        let text = seconds_to_rfc3339(seconds);
        let back = parse_instant(&serde_json::Value::String(text)).unwrap();
        assert!((back - seconds).abs() < 1e-6);
    }

    #[test]
    fn accepts_unix_milliseconds() {
        let parsed = parse_instant(&serde_json::json!(1_722_470_400_500i64)).unwrap();
        assert!((parsed - 1_722_470_400.5).abs() < 1e-9);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_instant(&serde_json::json!("yesterday")).is_err());
        assert!(parse_instant(&serde_json::json!(true)).is_err());
    }
}
