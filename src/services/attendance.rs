//! Attendance edit payloads.
//!
//! Admin edits reach the workforce API with `checkInTime` / `checkOutTime` as
//! RFC 3339 UTC timestamps. Clients may send full timestamps (an ISO datetime
//! without an offset is read as local time) or a `date` plus wall-clock
//! `HH:MM[:SS]` times in the server's local zone.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::services::transaction_service::local_instant;

pub const CHECK_IN_FIELD: &str = "checkInTime";
pub const CHECK_OUT_FIELD: &str = "checkOutTime";
pub const DATE_FIELD: &str = "date";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttendanceError {
    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid time for {field}: {value}")]
    InvalidTime { field: &'static str, value: String },

    #[error("Time-of-day for {0} requires a date")]
    MissingDate(&'static str),

    #[error("Check-out must be after check-in")]
    EarlyCheckout,
}

/// Rewrites the time fields of `body` to RFC 3339 UTC in place and checks
/// their order. Every other field is left untouched.
pub fn normalize_update(body: &mut Value) -> Result<(), AttendanceError> {
    normalize_update_in(&Local, body)
}

pub fn normalize_update_in<Tz: TimeZone>(tz: &Tz, body: &mut Value) -> Result<(), AttendanceError> {
    let object = body.as_object_mut().ok_or(AttendanceError::NotAnObject)?;

    let date = match object.get(DATE_FIELD) {
        Some(Value::String(raw)) if !raw.trim().is_empty() => Some(
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| AttendanceError::InvalidDate(raw.clone()))?,
        ),
        _ => None,
    };

    let check_in = resolve_field(tz, object, CHECK_IN_FIELD, date)?;
    let check_out = resolve_field(tz, object, CHECK_OUT_FIELD, date)?;

    if let (Some(check_in), Some(check_out)) = (check_in, check_out) {
        if check_out <= check_in {
            return Err(AttendanceError::EarlyCheckout);
        }
    }

    Ok(())
}

fn resolve_field<Tz: TimeZone>(
    tz: &Tz,
    object: &mut Map<String, Value>,
    field: &'static str,
    date: Option<NaiveDate>,
) -> Result<Option<DateTime<Utc>>, AttendanceError> {
    let raw = match object.get(field) {
        Some(Value::String(raw)) if !raw.trim().is_empty() => raw.trim().to_string(),
        Some(Value::Null) | None => return Ok(None),
        Some(Value::String(_)) => return Ok(None),
        Some(other) => {
            return Err(AttendanceError::InvalidTime {
                field,
                value: other.to_string(),
            });
        }
    };

    let instant = parse_instant(tz, &raw, date, field)?;
    object.insert(
        field.to_string(),
        Value::String(instant.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    Ok(Some(instant))
}

fn parse_instant<Tz: TimeZone>(
    tz: &Tz,
    raw: &str,
    date: Option<NaiveDate>,
    field: &'static str,
) -> Result<DateTime<Utc>, AttendanceError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    // ISO datetime without an offset is wall-clock time in `tz`
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
    {
        return Ok(local_instant(tz, naive.date(), naive.time()));
    }

    let time = NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| AttendanceError::InvalidTime {
            field,
            value: raw.to_string(),
        })?;

    let date = date.ok_or(AttendanceError::MissingDate(field))?;
    Ok(local_instant(tz, date, time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use serde_json::json;

    fn utc_plus_seven() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    #[test]
    fn test_checkout_before_checkin_is_rejected() {
        let mut body = json!({
            "checkInTime": "2025-01-01T09:00:00Z",
            "checkOutTime": "2025-01-01T08:00:00Z",
        });
        assert_eq!(normalize_update(&mut body), Err(AttendanceError::EarlyCheckout));
    }

    #[test]
    fn test_equal_times_are_rejected() {
        let mut body = json!({
            "checkInTime": "2025-01-01T09:00:00Z",
            "checkOutTime": "2025-01-01T09:00:00Z",
        });
        assert_eq!(normalize_update(&mut body), Err(AttendanceError::EarlyCheckout));
    }

    #[test]
    fn test_date_and_times_become_utc() {
        let mut body = json!({
            "date": "2025-03-10",
            "checkInTime": "08:30",
            "checkOutTime": "17:45:10",
            "note": "sua gio",
        });

        normalize_update_in(&utc_plus_seven(), &mut body).unwrap();

        assert_eq!(body["checkInTime"], "2025-03-10T01:30:00.000Z");
        assert_eq!(body["checkOutTime"], "2025-03-10T10:45:10.000Z");
        assert_eq!(body["note"], "sua gio");
        assert_eq!(body["date"], "2025-03-10");
    }

    #[test]
    fn test_offset_timestamps_are_converted() {
        let mut body = json!({ "checkInTime": "2025-01-01T09:00:00+07:00" });
        normalize_update(&mut body).unwrap();
        assert_eq!(body["checkInTime"], "2025-01-01T02:00:00.000Z");
    }

    #[test]
    fn test_iso_datetime_without_offset_is_local_time() {
        let mut body = json!({
            "checkInTime": "2025-01-01T09:00:00",
            "checkOutTime": "2025-01-01T17:00:00.250",
        });

        normalize_update_in(&utc_plus_seven(), &mut body).unwrap();

        assert_eq!(body["checkInTime"], "2025-01-01T02:00:00.000Z");
        assert_eq!(body["checkOutTime"], "2025-01-01T10:00:00.250Z");
    }

    #[test]
    fn test_iso_datetime_without_offset_still_checks_order() {
        let mut body = json!({
            "checkInTime": "2025-01-01T17:00",
            "checkOutTime": "2025-01-01T09:00",
        });
        assert_eq!(
            normalize_update_in(&utc_plus_seven(), &mut body),
            Err(AttendanceError::EarlyCheckout)
        );
    }

    #[test]
    fn test_single_field_skips_order_check() {
        let mut body = json!({ "checkOutTime": "2025-01-01T08:00:00Z" });
        assert!(normalize_update(&mut body).is_ok());
    }

    #[test]
    fn test_time_without_date_is_rejected() {
        let mut body = json!({ "checkInTime": "08:00" });
        assert_eq!(
            normalize_update(&mut body),
            Err(AttendanceError::MissingDate(CHECK_IN_FIELD))
        );
    }

    #[test]
    fn test_garbage_values_are_rejected() {
        let mut body = json!({ "checkInTime": "tomorrow" });
        assert!(matches!(
            normalize_update(&mut body),
            Err(AttendanceError::InvalidTime { .. })
        ));

        let mut body = json!({ "date": "10/03/2025", "checkInTime": "08:00" });
        assert!(matches!(
            normalize_update(&mut body),
            Err(AttendanceError::InvalidDate(_))
        ));

        let mut body = json!([1, 2]);
        assert_eq!(normalize_update(&mut body), Err(AttendanceError::NotAnObject));
    }
}
