use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::store::models::AttendanceSession;
use crate::utils::time::in_month;

/// All of one employee's work on one calendar date. A pure projection:
/// recomputed from the session list on every read, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// That day's sessions, ordered by check-in ascending.
    pub sessions: Vec<AttendanceSession>,
    pub total_minutes: i64,
    pub sessions_count: usize,
    pub has_open_session: bool,
}

/// Groups sessions by their stored date and totals each day's minutes at
/// `now`. An open session contributes its live elapsed time, so callers
/// must recompute rather than cache across real time. Days come back most
/// recent first; a day without sessions is absent, not a zero entry.
pub fn summarize_daily(sessions: &[AttendanceSession], now: DateTime<Utc>) -> Vec<DailySummary> {
    let mut by_date: BTreeMap<NaiveDate, Vec<AttendanceSession>> = BTreeMap::new();
    for session in sessions {
        by_date.entry(session.date).or_default().push(session.clone());
    }

    by_date
        .into_iter()
        .rev()
        .map(|(date, mut sessions)| {
            sessions.sort_by(|a, b| a.check_in_time.cmp(&b.check_in_time));
            DailySummary {
                date,
                total_minutes: sessions.iter().map(|s| s.minutes_at(now)).sum(),
                sessions_count: sessions.len(),
                has_open_session: sessions.iter().any(AttendanceSession::is_open),
                sessions,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRollup {
    pub total_minutes: i64,
    /// Days with at least one session; absent days are not zero-padded in.
    pub total_days: usize,
    pub avg_minutes_per_day: f64,
    pub total_sessions: usize,
}

/// Totals the summaries falling inside the given month, comparing parsed
/// date components rather than string prefixes.
pub fn rollup_month(summaries: &[DailySummary], month: u32, year: i32) -> MonthlyRollup {
    let included: Vec<&DailySummary> = summaries
        .iter()
        .filter(|summary| in_month(summary.date, month, year))
        .collect();

    let total_minutes: i64 = included.iter().map(|s| s.total_minutes).sum();
    let total_days = included.len();
    let avg_minutes_per_day = if total_days == 0 {
        0.0
    } else {
        total_minutes as f64 / total_days as f64
    };

    MonthlyRollup {
        total_minutes,
        total_days,
        avg_minutes_per_day,
        total_sessions: included.iter().map(|s| s.sessions_count).sum(),
    }
}
