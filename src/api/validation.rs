use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};

use super::ApiError;
use crate::constants::pagination::{DEFAULT_LIMIT, DEFAULT_PAGE, MAX_LIMIT};
use crate::services::transaction_service::day_bounds;

/// Which end of a date range a `YYYY-MM-DD` value stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    StartOfDay,
    EndOfDay,
}

fn positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v >= 1)
}

/// Non-numeric or zero pages fall back to the first page.
#[must_use]
pub fn page_or_default(raw: Option<&str>) -> u64 {
    positive(raw).unwrap_or(DEFAULT_PAGE)
}

#[must_use]
pub fn limit_or_default(raw: Option<&str>) -> u64 {
    positive(raw).unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
}

pub fn parse_date_bound(
    field: &str,
    raw: Option<&str>,
    bound: DateBound,
) -> Result<Option<DateTime<Utc>>, ApiError> {
    parse_date_bound_in(&Local, field, raw, bound)
}

/// Accepts a full RFC 3339 timestamp as-is, or a calendar date in `tz`
/// widened to the start or the last millisecond of that day.
pub fn parse_date_bound_in<Tz: TimeZone>(
    tz: &Tz,
    field: &str,
    raw: Option<&str>,
    bound: DateBound,
) -> Result<Option<DateTime<Utc>>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("{field} không hợp lệ: {raw}")))?;

    let (start, end) = day_bounds(tz, date);
    Ok(Some(match bound {
        DateBound::StartOfDay => start,
        DateBound::EndOfDay => end - Duration::milliseconds(1),
    }))
}

pub fn parse_amount(field: &str, raw: Option<&str>) -> Result<Option<f64>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| ApiError::validation(format!("{field} không hợp lệ: {raw}")))
}

pub fn validate_transaction_code(code: &str) -> Result<&str, ApiError> {
    let trimmed = code.trim();
    if trimmed.is_empty() || trimmed.len() > 128 {
        return Err(ApiError::validation("Mã giao dịch không hợp lệ"));
    }
    Ok(trimmed)
}

/// Upstream record ids are spliced into a URL path, so only
/// `[A-Za-z0-9_-]` is allowed. Dot segments and encoded separators never
/// get through.
pub fn validate_record_id(id: &str) -> Result<&str, ApiError> {
    let valid = !id.is_empty()
        && id.len() <= 64
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

    if valid {
        Ok(id)
    } else {
        Err(ApiError::validation("Mã chấm công không hợp lệ"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_page_and_limit_defaults() {
        assert_eq!(page_or_default(None), 1);
        assert_eq!(page_or_default(Some("abc")), 1);
        assert_eq!(page_or_default(Some("0")), 1);
        assert_eq!(page_or_default(Some("-3")), 1);
        assert_eq!(page_or_default(Some("4")), 4);

        assert_eq!(limit_or_default(None), 20);
        assert_eq!(limit_or_default(Some("x")), 20);
        assert_eq!(limit_or_default(Some("5")), 5);
        assert_eq!(limit_or_default(Some("5000")), 100);
    }

    #[test]
    fn test_date_only_bounds_cover_whole_local_day() {
        let tz = FixedOffset::east_opt(7 * 3600).unwrap();

        let from = parse_date_bound_in(&tz, "dateFrom", Some("2025-03-10"), DateBound::StartOfDay)
            .unwrap()
            .unwrap();
        let to = parse_date_bound_in(&tz, "dateTo", Some("2025-03-10"), DateBound::EndOfDay)
            .unwrap()
            .unwrap();

        assert_eq!(from, Utc.with_ymd_and_hms(2025, 3, 9, 17, 0, 0).unwrap());
        assert_eq!(
            to,
            Utc.with_ymd_and_hms(2025, 3, 10, 16, 59, 59).unwrap() + Duration::milliseconds(999)
        );
    }

    #[test]
    fn test_full_timestamps_are_taken_verbatim() {
        let parsed = parse_date_bound("dateTo", Some("2025-03-10T12:00:00Z"), DateBound::EndOfDay)
            .unwrap()
            .unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_bad_dates_and_amounts_are_rejected() {
        assert!(parse_date_bound("dateFrom", Some("10/03/2025"), DateBound::StartOfDay).is_err());
        assert!(parse_amount("minAmount", Some("nhieu")).is_err());
        assert!(parse_amount("minAmount", Some("NaN")).is_err());
    }

    #[test]
    fn test_blank_values_mean_no_filter() {
        assert_eq!(parse_amount("minAmount", Some("  ")).unwrap(), None);
        assert_eq!(parse_amount("minAmount", None).unwrap(), None);
        assert_eq!(
            parse_date_bound("dateFrom", Some(""), DateBound::StartOfDay).unwrap(),
            None
        );
        assert_eq!(parse_amount("maxAmount", Some("150000")).unwrap(), Some(150_000.0));
    }

    #[test]
    fn test_validate_transaction_code() {
        assert_eq!(validate_transaction_code(" FT123 ").unwrap(), "FT123");
        assert!(validate_transaction_code("   ").is_err());
    }

    #[test]
    fn test_validate_record_id() {
        assert_eq!(validate_record_id("65f1c2ab9e").unwrap(), "65f1c2ab9e");
        assert!(validate_record_id("att_2025-01").is_ok());

        for bad in ["", ".", "..", "a/b", "a?b", "a#b", "a%2Fb", "a b", "ngày"] {
            assert!(validate_record_id(bad).is_err(), "{bad:?} should be rejected");
        }
        assert!(validate_record_id(&"x".repeat(65)).is_err());
    }
}
