use chrono::{DateTime, FixedOffset, Utc};

use crate::attendance::summary::DailySummary;
use crate::utils::time::elapsed_seconds;

/// "Hh Mm" for historical durations. Hours accumulate past 23, no day
/// rollover.
pub fn format_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// "Hh Mm Ss" for a ticking open session. Recompute from the caller's
/// clock every second instead of caching the string.
pub fn format_live_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}h {}m {}s", seconds / 3600, (seconds % 3600) / 60, seconds % 60)
}

pub fn format_clock_time(timestamp: DateTime<Utc>, tz: FixedOffset) -> String {
    timestamp.with_timezone(&tz).format("%H:%M").to_string()
}

/// One day's session breakdown as display text.
pub fn format_day_report(summary: &DailySummary, now: DateTime<Utc>, tz: FixedOffset) -> String {
    if summary.sessions.is_empty() {
        return "No sessions recorded".to_string();
    }

    let mut report = format!("{}\n", summary.date.format("%Y-%m-%d (%a)"));

    for (index, session) in summary.sessions.iter().enumerate() {
        report.push_str(&format!(
            "#{} in {}",
            index + 1,
            format_clock_time(session.check_in_time, tz)
        ));

        match session.check_out_time {
            Some(check_out) => {
                let minutes = session
                    .duration_minutes
                    .or_else(|| session.derived_duration_minutes())
                    .unwrap_or(0);
                report.push_str(&format!(
                    " out {} ({})\n",
                    format_clock_time(check_out, tz),
                    format_duration(minutes)
                ));
            }
            None => {
                let live = elapsed_seconds(session.check_in_time, now);
                report.push_str(&format!(" still working ({})\n", format_live_duration(live)));
            }
        }
    }

    report.push_str(&format!(
        "Total: {} ({} sessions)",
        format_duration(summary.total_minutes),
        summary.sessions_count
    ));
    report
}

/// Multi-day overview, one line per day in the order given, with a grand
/// total.
pub fn format_range_report(summaries: &[DailySummary]) -> String {
    if summaries.is_empty() {
        return "No sessions in the selected period".to_string();
    }

    let mut report = String::new();
    let mut total_minutes = 0i64;

    for summary in summaries {
        total_minutes += summary.total_minutes;
        report.push_str(&format!(
            "{}  {} sessions  {}\n",
            summary.date.format("%Y-%m-%d (%a)"),
            summary.sessions_count,
            format_duration(summary.total_minutes)
        ));
    }

    report.push_str(&format!("Total: {}", format_duration(total_minutes)));
    report
}
