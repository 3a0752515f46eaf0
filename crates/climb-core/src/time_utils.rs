use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{ClimbError, Result};

/// Date format used for session records and CLI arguments.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Validate that `tz_name` is a recognised IANA timezone identifier.
pub fn validate_timezone(tz_name: &str) -> bool {
    tz_name.parse::<Tz>().is_ok()
}

/// Resolve a timezone name, falling back to UTC with a warning.
pub fn resolve_timezone(tz_name: &str) -> Tz {
    tz_name.parse::<Tz>().unwrap_or_else(|_| {
        warn!(
            "unrecognised timezone \"{}\", falling back to UTC",
            tz_name
        );
        Tz::UTC
    })
}

// ── Dates ─────────────────────────────────────────────────────────────────────

/// Today's calendar date in the named timezone.
pub fn today_in(tz_name: &str) -> NaiveDate {
    Utc::now().with_timezone(&resolve_timezone(tz_name)).date_naive()
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Examples
///
/// ```
/// use climb_core::time_utils::parse_date;
///
/// let d = parse_date("2024-02-29").unwrap();
/// assert_eq!(d.to_string(), "2024-02-29");
/// assert!(parse_date("2023-02-29").is_err());
/// ```
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| ClimbError::DateParse(s.to_string()))
}
