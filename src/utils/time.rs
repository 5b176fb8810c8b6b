use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};

/// Calendar day a timestamp falls on in the given local offset.
pub fn local_date_at(timestamp: DateTime<Utc>, tz: FixedOffset) -> NaiveDate {
    timestamp.with_timezone(&tz).date_naive()
}

pub fn current_local_date(tz: FixedOffset) -> NaiveDate {
    local_date_at(Utc::now(), tz)
}

/// Whole minutes between two timestamps, floored, never negative.
pub fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let seconds = end.signed_duration_since(start).num_seconds();
    if seconds <= 0 { 0 } else { seconds / 60 }
}

/// Whole seconds since `start`, never negative.
pub fn elapsed_seconds(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(start).num_seconds().max(0)
}

pub fn in_month(date: NaiveDate, month: u32, year: i32) -> bool {
    date.month() == month && date.year() == year
}

/// First and last day of a month; `None` for an invalid month number.
pub fn month_window(month: u32, year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next_first.pred_opt()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn duration_floors_to_whole_minutes() {
        let start = ts(2025, 7, 7, 9, 0, 0);
        let end = ts(2025, 7, 7, 17, 30, 45);
        assert_eq!(duration_minutes(start, end), 510);
    }

    #[test]
    fn duration_clamps_clock_skew_to_zero() {
        let start = ts(2025, 7, 7, 9, 0, 0);
        let end = ts(2025, 7, 7, 8, 59, 0);
        assert_eq!(duration_minutes(start, end), 0);
    }

    #[test]
    fn duration_of_equal_timestamps_is_zero() {
        let t = ts(2025, 7, 7, 9, 0, 0);
        assert_eq!(duration_minutes(t, t), 0);
    }

    #[test]
    fn local_date_follows_the_offset_across_midnight() {
        // 16:30 UTC is already the next day at UTC+9.
        let t = ts(2025, 7, 7, 16, 30, 0);
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(local_date_at(t, jst), NaiveDate::from_ymd_opt(2025, 7, 8).unwrap());
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(local_date_at(t, utc), NaiveDate::from_ymd_opt(2025, 7, 7).unwrap());
    }

    #[test]
    fn elapsed_seconds_never_negative() {
        let start = ts(2025, 7, 7, 9, 0, 0);
        assert_eq!(elapsed_seconds(start, ts(2025, 7, 7, 9, 1, 30)), 90);
        assert_eq!(elapsed_seconds(start, ts(2025, 7, 7, 8, 0, 0)), 0);
    }

    #[test]
    fn month_window_covers_december_rollover() {
        let (first, last) = month_window(12, 2025).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert!(month_window(13, 2025).is_none());
    }

    #[test]
    fn in_month_compares_parsed_components() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 31).unwrap();
        assert!(in_month(date, 7, 2025));
        assert!(!in_month(date, 7, 2024));
        assert!(!in_month(date, 8, 2025));
    }
}
