//! Conversions between grid coordinates and event time fields.
//!
//! Everything here is pure. Dates are compared as `YYYY-MM-DD` keys with no
//! timezone conversion, so callers must hand in dates from one local frame.

use chrono::{NaiveDate, NaiveTime, Timelike};

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";
pub const CLOCK_FORMAT: &str = "%H:%M";

/// Minutes from the first displayed hour of the grid. Negative for times
/// before the window.
pub fn minutes_since_window_start(time: NaiveTime, window_start_hour: u32) -> i64 {
    minutes_of_day(time) - i64::from(window_start_hour) * 60
}

pub fn minutes_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

pub fn span_minutes(start: NaiveTime, end: NaiveTime) -> i64 {
    minutes_of_day(end) - minutes_of_day(start)
}

pub fn cell_to_clock_time(hour: u32) -> String {
    format!("{hour:02}:00")
}

/// Clock time at the top of a grid row. `None` past 23.
pub fn hour_to_time(hour: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour, 0, 0)
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT).ok()
}

pub fn format_clock(time: NaiveTime) -> String {
    time.format(CLOCK_FORMAT).to_string()
}

pub fn parse_clock(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, CLOCK_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_minutes_since_window_start() {
        assert_eq!(minutes_since_window_start(t(8, 0), 8), 0);
        assert_eq!(minutes_since_window_start(t(9, 30), 8), 90);
        assert_eq!(minutes_since_window_start(t(7, 0), 8), -60);
    }

    #[test]
    fn test_cell_to_clock_time_is_zero_padded() {
        assert_eq!(cell_to_clock_time(8), "08:00");
        assert_eq!(cell_to_clock_time(21), "21:00");
    }

    #[test]
    fn test_hour_to_time_rejects_24() {
        assert_eq!(hour_to_time(22), Some(t(22, 0)));
        assert_eq!(hour_to_time(24), None);
    }

    #[test]
    fn test_date_key() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert_eq!(date_key(date), "2025-06-02");
        assert_eq!(parse_date_key("2025-06-02"), Some(date));
        assert_eq!(parse_date_key("2025-6-2x"), None);
    }

    #[test]
    fn test_clock_round_trip() {
        assert_eq!(format_clock(t(13, 5)), "13:05");
        assert_eq!(parse_clock("13:05"), Some(t(13, 5)));
        assert_eq!(span_minutes(t(9, 0), t(10, 30)), 90);
    }
}
