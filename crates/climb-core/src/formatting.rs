use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

/// Glyph for a day with at least one session in a heatmap strip.
pub const HEAT_ON: char = '■';
/// Glyph for a day without a session.
pub const HEAT_OFF: char = '·';

/// Format an integer count with thousands separators.
///
/// # Examples
///
/// ```
/// use climb_core::formatting::format_count;
///
/// assert_eq!(format_count(7), "7");
/// assert_eq!(format_count(1234), "1,234");
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string())
}

/// Format a day count with the right plural.
///
/// # Examples
///
/// ```
/// use climb_core::formatting::format_days;
///
/// assert_eq!(format_days(0), "0 days");
/// assert_eq!(format_days(1), "1 day");
/// assert_eq!(format_days(12), "12 days");
/// ```
pub fn format_days(days: u32) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{} days", days)
    }
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero.
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let raw = (part / whole) * 100.0;
    let factor = 10_f64.powi(decimal_places as i32);
    (raw * factor).round() / factor
}

/// Horizontal bar scaled so that `max` fills `width` cells.
///
/// Non-zero values always get at least one cell.
pub fn render_bar(value: u64, max: u64, width: usize) -> String {
    if max == 0 || value == 0 || width == 0 {
        return String::new();
    }
    let cells = ((value as f64 / max as f64) * width as f64).round() as usize;
    "█".repeat(cells.clamp(1, width))
}

/// One heatmap strip for a calendar month: one glyph per day of the month.
pub fn render_heatmap_row(year: i32, month: u32, attendance: &BTreeSet<NaiveDate>) -> String {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return String::new();
    };
    first
        .iter_days()
        .take_while(|d| d.month() == month)
        .map(|d| {
            if attendance.contains(&d) {
                HEAT_ON
            } else {
                HEAT_OFF
            }
        })
        .collect()
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
