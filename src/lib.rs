//! Attendance and HR tracking core: check-in/check-out session tracking,
//! daily and monthly aggregation, working-hours evaluation, leave requests
//! and messaging over a pluggable store.
//!
//! The UI shell, authentication and report export live outside this crate;
//! they consume [`AttendanceTracker`] and the `store` traits.

pub mod attendance;
pub mod config;
pub mod leave;
pub mod location;
pub mod store;
pub mod utils;

pub use attendance::{AttendanceTracker, CheckInOutcome, CheckOutOutcome, DailySummary, MonthlyRollup};
pub use config::Config;
pub use leave::{LeaveDesk, LeaveError};
pub use location::{LocationProvider, LocationUnavailable, best_effort_location};
pub use store::feed::SessionFeed;
pub use store::models::{AttendanceSession, EmployeeProfile, GeoPoint, WorkingHoursSchedule};
pub use store::sqlite::SqliteStore;
pub use store::StoreError;
