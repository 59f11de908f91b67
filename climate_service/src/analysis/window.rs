/// Rolling 12-month window used by `/precipitation` and `/tobs`.
///
/// The window is the 365-day period ending at the latest recorded date.
/// Subtraction is done on calendar dates, so a window that spans Feb 29
/// lands one calendar day later than "same day last year".

use chrono::{Duration, NaiveDate};

use crate::error::StoreError;

/// Length of the rolling window in days.
pub const WINDOW_DAYS: i64 = 365;

/// Format of the `date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Returns the first date (inclusive) of the window ending at `latest`,
/// formatted back as `YYYY-MM-DD` so it compares lexically against stored dates.
pub fn window_start(latest: &str) -> Result<String, StoreError> {
    let latest = NaiveDate::parse_from_str(latest.trim(), DATE_FORMAT)
        .map_err(|_| StoreError::invalid_date(latest))?;

    let start = latest - Duration::days(WINDOW_DAYS);
    Ok(start.format(DATE_FORMAT).to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_start_for_hawaii_latest_date() {
        assert_eq!(window_start("2017-08-23").unwrap(), "2016-08-23");
    }

    #[test]
    fn test_window_spanning_leap_day_is_calendar_exact() {
        // 2016-02-29 falls inside the window, so 365 days back is 2015-03-02.
        assert_eq!(window_start("2016-03-01").unwrap(), "2015-03-02");
        assert_eq!(window_start("2017-01-01").unwrap(), "2016-01-02");
    }

    #[test]
    fn test_window_without_leap_day() {
        assert_eq!(window_start("2015-06-15").unwrap(), "2014-06-15");
    }

    #[test]
    fn test_window_start_crosses_year_boundary() {
        assert_eq!(window_start("2018-12-31").unwrap(), "2017-12-31");
    }

    #[test]
    fn test_unparseable_latest_date_is_an_error() {
        let err = window_start("not-a-date").unwrap_err();
        assert!(matches!(err, StoreError::InvalidDate { .. }));
    }

    #[test]
    fn test_window_start_sorts_before_latest() {
        let latest = "2017-08-23";
        let start = window_start(latest).unwrap();
        assert!(start.as_str() < latest);
    }
}
