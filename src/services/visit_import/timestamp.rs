//! Timestamp normalization for export date/time cells
//!
//! The export carries local wall-clock values without a zone. They are
//! pinned to UTC+10 with no daylight-saving adjustment.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike};

/// Offset of the export's wall-clock values, in seconds east of UTC
pub const SOURCE_UTC_OFFSET_SECS: i32 = 10 * 60 * 60;

/// Combine a date cell and a time cell into an absolute instant.
///
/// Dates are `d/m/yyyy` (zero padding optional) or `yyyy-mm-dd`; times are
/// `h:mm` with optional `:ss`, seconds dropped. Anything else, including a
/// date that does not exist on the calendar, gives `None`.
pub fn normalize(date: &str, time: &str) -> Option<DateTime<FixedOffset>> {
    let date = parse_date(date.trim())?;
    let time = parse_time(time.trim())?;
    let offset = FixedOffset::east_opt(SOURCE_UTC_OFFSET_SECS)?;
    offset.from_local_datetime(&date.and_time(time)).single()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let (parts, year, format): (Vec<&str>, _, _) = if s.contains('/') {
        let parts: Vec<&str> = s.split('/').collect();
        let year = parts.last().copied();
        (parts, year, "%d/%m/%Y")
    } else {
        let parts: Vec<&str> = s.split('-').collect();
        let year = parts.first().copied();
        (parts, year, "%Y-%m-%d")
    };

    // chrono reads "24" as year 24, so the width is checked up front
    let year = year?;
    if parts.len() != 3 || year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    NaiveDate::parse_from_str(s, format).ok()
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()?
        .with_second(0)
}
