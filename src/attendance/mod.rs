pub mod schedule;
pub mod summary;
pub mod tracker;

pub use schedule::{DayEvaluation, DayStatus, completion_percentage, evaluate_day, expected_hours};
pub use summary::{DailySummary, MonthlyRollup, rollup_month, summarize_daily};
pub use tracker::{AttendanceTracker, CheckInOutcome, CheckOutOutcome};
