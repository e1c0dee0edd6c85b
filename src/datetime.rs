//! Date/time helpers for schedule-aware expansion.
//!
//! Transit schedules are stored as service-day bitsets counted from a fixed
//! pivot date, with departure times in seconds from local midnight. These
//! helpers translate the caller's ISO 8601 strings into those units.

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};

use crate::error::Error;

/// All service-day bitsets count days from this date.
pub const PIVOT_DATE: &str = "2014-01-01";

fn parse_date_time(dt: &str) -> Result<NaiveDateTime, Error> {
    NaiveDateTime::parse_from_str(dt, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(dt, "%Y-%m-%dT%H:%M"))
        .map_err(|_| Error::InvalidDateTime(dt.to_string()))
}

fn parse_date(dt: &str) -> Result<NaiveDate, Error> {
    let date_part = dt.split('T').next().unwrap_or(dt);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| Error::InvalidDateTime(dt.to_string()))
}

/// Seconds from local midnight for an ISO date/time or bare time.
pub fn seconds_from_midnight(dt: &str) -> Result<u32, Error> {
    let time = parse_date_time(dt).map(|d| d.time()).or_else(|_| {
        NaiveTime::parse_from_str(dt, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(dt, "%H:%M"))
            .map_err(|_| Error::InvalidDateTime(dt.to_string()))
    })?;
    Ok(time.num_seconds_from_midnight())
}

/// Days elapsed from the pivot date to the date part of `dt`.
pub fn days_from_pivot_date(dt: &str) -> Result<u32, Error> {
    let pivot = NaiveDate::parse_from_str(PIVOT_DATE, "%Y-%m-%d").expect("valid pivot date");
    let date = parse_date(dt)?;
    let days = date.signed_duration_since(pivot).num_days();
    Ok(days.max(0) as u32)
}

/// Day-of-week bitmask for the date part of `dt`, Sunday = bit 0.
pub fn day_of_week_mask(dt: &str) -> Result<u8, Error> {
    let date = parse_date(dt)?;
    Ok(1u8 << date.weekday().num_days_from_sunday())
}

/// Current local date/time as an ISO string, for `"current"` origins.
/// `utc_offset_seconds` is the timezone offset of the origin node.
pub fn iso_date_time(utc_offset_seconds: i32) -> String {
    let offset = FixedOffset::east_opt(utc_offset_seconds)
        .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset"));
    Utc::now()
        .with_timezone(&offset)
        .format("%Y-%m-%dT%H:%M")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_from_midnight_parses_variants() {
        assert_eq!(seconds_from_midnight("2026-08-02T08:30").unwrap(), 8 * 3600 + 30 * 60);
        assert_eq!(seconds_from_midnight("2026-08-02T08:30:15").unwrap(), 8 * 3600 + 30 * 60 + 15);
        assert_eq!(seconds_from_midnight("08:30").unwrap(), 8 * 3600 + 30 * 60);
        assert!(seconds_from_midnight("not a time").is_err());
    }

    #[test]
    fn days_from_pivot() {
        assert_eq!(days_from_pivot_date("2014-01-01").unwrap(), 0);
        assert_eq!(days_from_pivot_date("2014-01-31T12:00").unwrap(), 30);
        // Dates before the pivot clamp to zero.
        assert_eq!(days_from_pivot_date("2013-12-25").unwrap(), 0);
    }

    #[test]
    fn day_of_week_mask_is_sunday_based() {
        // 2014-01-05 was a Sunday.
        assert_eq!(day_of_week_mask("2014-01-05").unwrap(), 1);
        assert_eq!(day_of_week_mask("2014-01-06").unwrap(), 2);
        assert_eq!(day_of_week_mask("2014-01-11").unwrap(), 1 << 6);
    }
}
