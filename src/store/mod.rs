pub mod feed;
pub mod migrations;
pub mod models;
pub mod sqlite;

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::broadcast;

use self::models::{
    AttendanceSession, EmployeeProfile, GeoPoint, LeaveRequest, LeaveStatus, LeaveType, Message,
    Role, WorkingHoursSchedule,
};

/// Failure taxonomy of the persistence boundary. Reads and writes are
/// transient and retryable by re-invoking the operation; nothing here is
/// retried automatically. `OpenSessionExists` is the store refusing a
/// second concurrent open session for one employee.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store read failed: {0}")]
    Read(String),
    #[error("store write failed: {0}")]
    Write(String),
    #[error("employee already has an open session")]
    OpenSessionExists,
}

/// Broadcast on every session write. Subscribers re-query the full set;
/// the change itself carries no data to merge.
#[derive(Debug, Clone)]
pub struct SessionChange {
    pub employee_id: String,
}

#[allow(async_fn_in_trait)]
pub trait SessionStore {
    async fn create_session(
        &self,
        employee_id: &str,
        check_in_time: DateTime<Utc>,
        date: NaiveDate,
        location: Option<GeoPoint>,
    ) -> Result<AttendanceSession, StoreError>;

    /// Sets `check_out_time` and the cached duration on exactly the given
    /// session id; fails if that session is not open.
    async fn close_session(
        &self,
        session_id: i64,
        check_out_time: DateTime<Utc>,
        duration_minutes: i64,
    ) -> Result<(), StoreError>;

    async fn open_session_for(
        &self,
        employee_id: &str,
    ) -> Result<Option<AttendanceSession>, StoreError>;

    async fn sessions_for(
        &self,
        employee_id: &str,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<AttendanceSession>, StoreError>;

    /// Every currently open session across all employees.
    async fn open_sessions(&self) -> Result<Vec<AttendanceSession>, StoreError>;

    fn changes(&self) -> broadcast::Receiver<SessionChange>;
}

#[allow(async_fn_in_trait)]
pub trait EmployeeDirectory {
    /// Create-or-get for an externally authenticated identity.
    async fn upsert_employee(
        &self,
        employee_id: &str,
        name: &str,
        email: &str,
        role: Role,
    ) -> Result<EmployeeProfile, StoreError>;

    async fn profile(&self, employee_id: &str) -> Result<Option<EmployeeProfile>, StoreError>;

    async fn set_schedule(
        &self,
        employee_id: &str,
        schedule: &WorkingHoursSchedule,
    ) -> Result<(), StoreError>;
}

#[allow(async_fn_in_trait)]
pub trait LeaveStore {
    async fn create_leave_request(
        &self,
        employee_id: &str,
        leave_type: LeaveType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<LeaveRequest, StoreError>;

    async fn leave_request(&self, request_id: i64) -> Result<Option<LeaveRequest>, StoreError>;

    async fn leave_requests_for(
        &self,
        employee_id: &str,
    ) -> Result<Vec<LeaveRequest>, StoreError>;

    async fn pending_leave_requests(&self) -> Result<Vec<LeaveRequest>, StoreError>;

    async fn set_leave_status(
        &self,
        request_id: i64,
        status: LeaveStatus,
        reviewed_by: &str,
    ) -> Result<(), StoreError>;
}

#[allow(async_fn_in_trait)]
pub trait MessageStore {
    async fn send_message(
        &self,
        sender_id: &str,
        recipient_id: &str,
        body: &str,
    ) -> Result<Message, StoreError>;

    /// Messages for a recipient, newest first.
    async fn inbox(&self, recipient_id: &str) -> Result<Vec<Message>, StoreError>;

    async fn mark_read(&self, message_id: i64) -> Result<(), StoreError>;
}
