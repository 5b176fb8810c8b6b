use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::time::duration_minutes;

/// Coordinate pair captured best-effort at check-in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// One continuous work interval. Created by check-in, closed exactly once
/// by check-out; a session with no `check_out_time` is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSession {
    pub id: i64,
    pub employee_id: String,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    /// Cached at check-out; always re-derivable from the timestamps.
    pub duration_minutes: Option<i64>,
    /// Local calendar day of the check-in, fixed at creation. A session
    /// spanning midnight still belongs to its start date.
    pub date: NaiveDate,
    pub location: Option<GeoPoint>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceSession {
    pub fn is_open(&self) -> bool {
        self.check_out_time.is_none()
    }

    /// Recomputes the closed duration from the stored timestamps.
    pub fn derived_duration_minutes(&self) -> Option<i64> {
        self.check_out_time
            .map(|check_out| duration_minutes(self.check_in_time, check_out))
    }

    /// Minutes this session counts for at `now`: the cached duration for a
    /// closed session, the live elapsed time for an open one.
    pub fn minutes_at(&self, now: DateTime<Utc>) -> i64 {
        if self.is_open() {
            duration_minutes(self.check_in_time, now)
        } else {
            self.duration_minutes
                .or_else(|| self.derived_duration_minutes())
                .unwrap_or(0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "admin" => Role::Admin,
            "employee" => Role::Employee,
            _ => panic!("Invalid role: {}", s),
        }
    }
}

/// Target working hours for one employee; read input to the evaluator,
/// never mutated by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingHoursSchedule {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Weekday names, e.g. "Monday".
    pub working_days: Vec<String>,
    pub total_hours_per_day: f64,
    pub total_hours_per_week: f64,
}

/// Mirror of an externally authenticated identity plus its HR attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub schedule: Option<WorkingHoursSchedule>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Unpaid,
}

impl LeaveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveType::Annual => "annual",
            LeaveType::Sick => "sick",
            LeaveType::Unpaid => "unpaid",
        }
    }
}

impl From<String> for LeaveType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "annual" => LeaveType::Annual,
            "sick" => LeaveType::Sick,
            "unpaid" => LeaveType::Unpaid,
            _ => panic!("Invalid leave type: {}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
        }
    }
}

impl From<String> for LeaveStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => LeaveStatus::Pending,
            "approved" => LeaveStatus::Approved,
            "rejected" => LeaveStatus::Rejected,
            _ => panic!("Invalid leave status: {}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: i64,
    pub employee_id: String,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub status: LeaveStatus,
    pub reviewed_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: String,
    pub recipient_id: String,
    pub body: String,
    pub is_read: bool,
    pub sent_at: DateTime<Utc>,
}
