use chrono::NaiveDate;
use serde::Serialize;

use crate::store::models::WorkingHoursSchedule;

/// Target hours for a date: the schedule's daily hours on a working day,
/// zero otherwise. The weekday is resolved on the date's own calendar.
pub fn expected_hours(date: NaiveDate, schedule: &WorkingHoursSchedule) -> f64 {
    let weekday = date.format("%A").to_string();
    if schedule
        .working_days
        .iter()
        .any(|day| day.eq_ignore_ascii_case(&weekday))
    {
        schedule.total_hours_per_day
    } else {
        0.0
    }
}

/// Actual vs. expected, capped at 100. A day with no target reports 0
/// regardless of hours worked.
pub fn completion_percentage(actual_hours: f64, expected_hours: f64) -> f64 {
    if expected_hours <= 0.0 {
        return 0.0;
    }
    (actual_hours / expected_hours * 100.0).min(100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DayStatus {
    Completed,
    OnTrack,
    Behind,
    FarBehind,
}

impl DayStatus {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 100.0 {
            DayStatus::Completed
        } else if percentage >= 75.0 {
            DayStatus::OnTrack
        } else if percentage >= 50.0 {
            DayStatus::Behind
        } else {
            DayStatus::FarBehind
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DayStatus::Completed => "Completed",
            DayStatus::OnTrack => "On Track",
            DayStatus::Behind => "Behind",
            DayStatus::FarBehind => "Far Behind",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayEvaluation {
    pub date: NaiveDate,
    pub expected_hours: f64,
    pub actual_hours: f64,
    pub completion_percentage: f64,
    pub status: DayStatus,
}

pub fn evaluate_day(
    date: NaiveDate,
    schedule: &WorkingHoursSchedule,
    actual_minutes: i64,
) -> DayEvaluation {
    let expected = expected_hours(date, schedule);
    let actual = actual_minutes as f64 / 60.0;
    let percentage = completion_percentage(actual, expected);

    DayEvaluation {
        date,
        expected_hours: expected,
        actual_hours: actual,
        completion_percentage: percentage,
        status: DayStatus::from_percentage(percentage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveTime, Weekday};

    fn weekday_schedule() -> WorkingHoursSchedule {
        WorkingHoursSchedule {
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            working_days: vec![
                "Monday".to_string(),
                "Tuesday".to_string(),
                "Wednesday".to_string(),
                "Thursday".to_string(),
                "Friday".to_string(),
            ],
            total_hours_per_day: 8.0,
            total_hours_per_week: 40.0,
        }
    }

    #[test]
    fn working_day_expects_the_daily_hours() {
        let monday = NaiveDate::from_ymd_opt(2025, 7, 7).unwrap();
        assert_eq!(monday.weekday(), Weekday::Mon);
        assert_eq!(expected_hours(monday, &weekday_schedule()), 8.0);
    }

    #[test]
    fn non_working_day_expects_zero_and_reports_zero_percent() {
        let saturday = NaiveDate::from_ymd_opt(2025, 7, 5).unwrap();
        assert_eq!(saturday.weekday(), Weekday::Sat);
        assert_eq!(expected_hours(saturday, &weekday_schedule()), 0.0);

        // Hours worked on a day with no target still report 0%.
        let evaluation = evaluate_day(saturday, &weekday_schedule(), 6 * 60);
        assert_eq!(evaluation.completion_percentage, 0.0);
        assert_eq!(evaluation.status, DayStatus::FarBehind);
    }

    #[test]
    fn six_of_eight_hours_is_on_track() {
        let monday = NaiveDate::from_ymd_opt(2025, 7, 7).unwrap();
        let evaluation = evaluate_day(monday, &weekday_schedule(), 6 * 60);
        assert!((evaluation.completion_percentage - 75.0).abs() < f64::EPSILON);
        assert_eq!(evaluation.status, DayStatus::OnTrack);
        assert_eq!(evaluation.status.label(), "On Track");
    }

    #[test]
    fn completion_is_capped_at_one_hundred() {
        let monday = NaiveDate::from_ymd_opt(2025, 7, 7).unwrap();
        let evaluation = evaluate_day(monday, &weekday_schedule(), 12 * 60);
        assert_eq!(evaluation.completion_percentage, 100.0);
        assert_eq!(evaluation.status, DayStatus::Completed);
    }

    #[test]
    fn status_thresholds_are_fixed() {
        assert_eq!(DayStatus::from_percentage(100.0), DayStatus::Completed);
        assert_eq!(DayStatus::from_percentage(99.9), DayStatus::OnTrack);
        assert_eq!(DayStatus::from_percentage(75.0), DayStatus::OnTrack);
        assert_eq!(DayStatus::from_percentage(74.9), DayStatus::Behind);
        assert_eq!(DayStatus::from_percentage(50.0), DayStatus::Behind);
        assert_eq!(DayStatus::from_percentage(49.9), DayStatus::FarBehind);
        assert_eq!(DayStatus::from_percentage(0.0), DayStatus::FarBehind);
    }

    #[test]
    fn weekday_names_match_case_insensitively() {
        let mut schedule = weekday_schedule();
        schedule.working_days = vec!["monday".to_string()];
        let monday = NaiveDate::from_ymd_opt(2025, 7, 7).unwrap();
        assert_eq!(expected_hours(monday, &schedule), 8.0);
    }
}
