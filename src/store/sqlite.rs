use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tokio::sync::broadcast;

use super::migrations;
use super::models::{
    AttendanceSession, EmployeeProfile, GeoPoint, LeaveRequest, LeaveStatus, LeaveType, Message,
    Role, WorkingHoursSchedule,
};
use super::{
    EmployeeDirectory, LeaveStore, MessageStore, SessionChange, SessionStore, StoreError,
};

const TIME_FORMAT: &str = "%H:%M";

/// SQLite-backed reference store. Cloning shares the pool and the change
/// channel.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    changes: broadcast::Sender<SessionChange>,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(write_err)?
            .create_if_missing(true);

        // In-memory databases live per connection; a single-connection pool
        // keeps every query on the same database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(write_err)?;

        migrations::run_migrations(&pool).await.map_err(write_err)?;

        let (changes, _) = broadcast::channel(64);
        Ok(Self { pool, changes })
    }

    fn notify(&self, employee_id: &str) {
        let _ = self.changes.send(SessionChange {
            employee_id: employee_id.to_string(),
        });
    }

    async fn session_by_id(&self, session_id: i64) -> Result<AttendanceSession, StoreError> {
        let row = sqlx::query(
            "SELECT id, employee_id, check_in_time, check_out_time, duration_minutes, date,
                    latitude, longitude, created_at, updated_at
             FROM attendance_sessions WHERE id = ?",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(read_err)?;

        Ok(session_from_row(&row))
    }
}

fn read_err(e: sqlx::Error) -> StoreError {
    StoreError::Read(e.to_string())
}

fn write_err(e: sqlx::Error) -> StoreError {
    StoreError::Write(e.to_string())
}

fn session_from_row(row: &SqliteRow) -> AttendanceSession {
    let latitude: Option<f64> = row.get("latitude");
    let longitude: Option<f64> = row.get("longitude");
    let location = match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint {
            latitude,
            longitude,
        }),
        _ => None,
    };

    AttendanceSession {
        id: row.get("id"),
        employee_id: row.get("employee_id"),
        check_in_time: row.get("check_in_time"),
        check_out_time: row.get("check_out_time"),
        duration_minutes: row.get("duration_minutes"),
        date: row.get("date"),
        location,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn schedule_from_row(row: &SqliteRow) -> Option<WorkingHoursSchedule> {
    let start: Option<String> = row.get("schedule_start");
    let end: Option<String> = row.get("schedule_end");
    let days: Option<String> = row.get("working_days");

    let start_time = NaiveTime::parse_from_str(&start?, TIME_FORMAT).ok()?;
    let end_time = NaiveTime::parse_from_str(&end?, TIME_FORMAT).ok()?;

    Some(WorkingHoursSchedule {
        start_time,
        end_time,
        working_days: days?
            .split(',')
            .filter(|day| !day.is_empty())
            .map(str::to_string)
            .collect(),
        total_hours_per_day: row.get::<Option<f64>, _>("hours_per_day").unwrap_or(0.0),
        total_hours_per_week: row.get::<Option<f64>, _>("hours_per_week").unwrap_or(0.0),
    })
}

fn profile_from_row(row: &SqliteRow) -> EmployeeProfile {
    EmployeeProfile {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        role: Role::from(row.get::<String, _>("role")),
        schedule: schedule_from_row(row),
        created_at: row.get("created_at"),
    }
}

fn leave_from_row(row: &SqliteRow) -> LeaveRequest {
    LeaveRequest {
        id: row.get("id"),
        employee_id: row.get("employee_id"),
        leave_type: LeaveType::from(row.get::<String, _>("leave_type")),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        reason: row.get("reason"),
        status: LeaveStatus::from(row.get::<String, _>("status")),
        reviewed_by: row.get("reviewed_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn message_from_row(row: &SqliteRow) -> Message {
    Message {
        id: row.get("id"),
        sender_id: row.get("sender_id"),
        recipient_id: row.get("recipient_id"),
        body: row.get("body"),
        is_read: row.get("is_read"),
        sent_at: row.get("sent_at"),
    }
}

impl SessionStore for SqliteStore {
    async fn create_session(
        &self,
        employee_id: &str,
        check_in_time: DateTime<Utc>,
        date: NaiveDate,
        location: Option<GeoPoint>,
    ) -> Result<AttendanceSession, StoreError> {
        let result = sqlx::query(
            "INSERT INTO attendance_sessions (employee_id, check_in_time, date, latitude, longitude)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(employee_id)
        .bind(check_in_time)
        .bind(date)
        .bind(location.map(|point| point.latitude))
        .bind(location.map(|point| point.longitude))
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::OpenSessionExists,
            _ => StoreError::Write(e.to_string()),
        })?;

        let session = self.session_by_id(result.last_insert_rowid()).await?;
        self.notify(employee_id);
        Ok(session)
    }

    async fn close_session(
        &self,
        session_id: i64,
        check_out_time: DateTime<Utc>,
        duration_minutes: i64,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE attendance_sessions
             SET check_out_time = ?, duration_minutes = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ? AND check_out_time IS NULL",
        )
        .bind(check_out_time)
        .bind(duration_minutes)
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Write(format!(
                "session {} is not open",
                session_id
            )));
        }

        let session = self.session_by_id(session_id).await?;
        self.notify(&session.employee_id);
        Ok(())
    }

    async fn open_session_for(
        &self,
        employee_id: &str,
    ) -> Result<Option<AttendanceSession>, StoreError> {
        let row_opt = sqlx::query(
            "SELECT id, employee_id, check_in_time, check_out_time, duration_minutes, date,
                    latitude, longitude, created_at, updated_at
             FROM attendance_sessions
             WHERE employee_id = ? AND check_out_time IS NULL
             ORDER BY check_in_time DESC
             LIMIT 1",
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_err)?;

        Ok(row_opt.map(|row| session_from_row(&row)))
    }

    async fn sessions_for(
        &self,
        employee_id: &str,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<AttendanceSession>, StoreError> {
        let rows = match range {
            Some((start_date, end_date)) => {
                sqlx::query(
                    "SELECT id, employee_id, check_in_time, check_out_time, duration_minutes, date,
                            latitude, longitude, created_at, updated_at
                     FROM attendance_sessions
                     WHERE employee_id = ? AND date >= ? AND date <= ?
                     ORDER BY date ASC, check_in_time ASC",
                )
                .bind(employee_id)
                .bind(start_date)
                .bind(end_date)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, employee_id, check_in_time, check_out_time, duration_minutes, date,
                            latitude, longitude, created_at, updated_at
                     FROM attendance_sessions
                     WHERE employee_id = ?
                     ORDER BY date ASC, check_in_time ASC",
                )
                .bind(employee_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(read_err)?;

        Ok(rows.iter().map(session_from_row).collect())
    }

    async fn open_sessions(&self) -> Result<Vec<AttendanceSession>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, employee_id, check_in_time, check_out_time, duration_minutes, date,
                    latitude, longitude, created_at, updated_at
             FROM attendance_sessions
             WHERE check_out_time IS NULL
             ORDER BY check_in_time ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(read_err)?;

        Ok(rows.iter().map(session_from_row).collect())
    }

    fn changes(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }
}

impl EmployeeDirectory for SqliteStore {
    async fn upsert_employee(
        &self,
        employee_id: &str,
        name: &str,
        email: &str,
        role: Role,
    ) -> Result<EmployeeProfile, StoreError> {
        // Try to get existing employee first
        if let Some(profile) = self.profile(employee_id).await? {
            return Ok(profile);
        }

        sqlx::query("INSERT INTO employees (id, name, email, role) VALUES (?, ?, ?, ?)")
            .bind(employee_id)
            .bind(name)
            .bind(email)
            .bind(role.as_str())
            .execute(&self.pool)
            .await
            .map_err(write_err)?;

        match self.profile(employee_id).await? {
            Some(profile) => Ok(profile),
            None => Err(StoreError::Read(format!(
                "employee {} missing after insert",
                employee_id
            ))),
        }
    }

    async fn profile(&self, employee_id: &str) -> Result<Option<EmployeeProfile>, StoreError> {
        let row_opt = sqlx::query(
            "SELECT id, name, email, role, schedule_start, schedule_end, working_days,
                    hours_per_day, hours_per_week, created_at
             FROM employees WHERE id = ?",
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_err)?;

        Ok(row_opt.map(|row| profile_from_row(&row)))
    }

    async fn set_schedule(
        &self,
        employee_id: &str,
        schedule: &WorkingHoursSchedule,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE employees
             SET schedule_start = ?, schedule_end = ?, working_days = ?,
                 hours_per_day = ?, hours_per_week = ?
             WHERE id = ?",
        )
        .bind(schedule.start_time.format(TIME_FORMAT).to_string())
        .bind(schedule.end_time.format(TIME_FORMAT).to_string())
        .bind(schedule.working_days.join(","))
        .bind(schedule.total_hours_per_day)
        .bind(schedule.total_hours_per_week)
        .bind(employee_id)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Write(format!(
                "unknown employee: {}",
                employee_id
            )));
        }

        Ok(())
    }
}

impl LeaveStore for SqliteStore {
    async fn create_leave_request(
        &self,
        employee_id: &str,
        leave_type: LeaveType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<LeaveRequest, StoreError> {
        let result = sqlx::query(
            "INSERT INTO leave_requests (employee_id, leave_type, start_date, end_date, reason)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(employee_id)
        .bind(leave_type.as_str())
        .bind(start_date)
        .bind(end_date)
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        match self.leave_request(result.last_insert_rowid()).await? {
            Some(request) => Ok(request),
            None => Err(StoreError::Read(
                "leave request missing after insert".to_string(),
            )),
        }
    }

    async fn leave_request(&self, request_id: i64) -> Result<Option<LeaveRequest>, StoreError> {
        let row_opt = sqlx::query(
            "SELECT id, employee_id, leave_type, start_date, end_date, reason, status,
                    reviewed_by, created_at, updated_at
             FROM leave_requests WHERE id = ?",
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_err)?;

        Ok(row_opt.map(|row| leave_from_row(&row)))
    }

    async fn leave_requests_for(
        &self,
        employee_id: &str,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, employee_id, leave_type, start_date, end_date, reason, status,
                    reviewed_by, created_at, updated_at
             FROM leave_requests
             WHERE employee_id = ?
             ORDER BY start_date DESC, id DESC",
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await
        .map_err(read_err)?;

        Ok(rows.iter().map(leave_from_row).collect())
    }

    async fn pending_leave_requests(&self) -> Result<Vec<LeaveRequest>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, employee_id, leave_type, start_date, end_date, reason, status,
                    reviewed_by, created_at, updated_at
             FROM leave_requests
             WHERE status = 'pending'
             ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(read_err)?;

        Ok(rows.iter().map(leave_from_row).collect())
    }

    async fn set_leave_status(
        &self,
        request_id: i64,
        status: LeaveStatus,
        reviewed_by: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE leave_requests
             SET status = ?, reviewed_by = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(reviewed_by)
        .bind(request_id)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Write(format!(
                "unknown leave request: {}",
                request_id
            )));
        }

        Ok(())
    }
}

impl MessageStore for SqliteStore {
    async fn send_message(
        &self,
        sender_id: &str,
        recipient_id: &str,
        body: &str,
    ) -> Result<Message, StoreError> {
        let result = sqlx::query(
            "INSERT INTO messages (sender_id, recipient_id, body) VALUES (?, ?, ?)",
        )
        .bind(sender_id)
        .bind(recipient_id)
        .bind(body)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        let row = sqlx::query(
            "SELECT id, sender_id, recipient_id, body, is_read, sent_at FROM messages WHERE id = ?",
        )
        .bind(result.last_insert_rowid())
        .fetch_one(&self.pool)
        .await
        .map_err(read_err)?;

        Ok(message_from_row(&row))
    }

    async fn inbox(&self, recipient_id: &str) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, sender_id, recipient_id, body, is_read, sent_at
             FROM messages
             WHERE recipient_id = ?
             ORDER BY sent_at DESC, id DESC",
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(read_err)?;

        Ok(rows.iter().map(message_from_row).collect())
    }

    async fn mark_read(&self, message_id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE messages SET is_read = TRUE WHERE id = ?")
            .bind(message_id)
            .execute(&self.pool)
            .await
            .map_err(write_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Write(format!(
                "unknown message: {}",
                message_id
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time::month_window;
    use chrono::TimeZone;

    async fn memory_store() -> SqliteStore {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("timeclock=debug")
            .try_init();
        SqliteStore::connect("sqlite::memory:").await.unwrap()
    }

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn schedule() -> WorkingHoursSchedule {
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

    #[tokio::test]
    async fn create_and_reload_session() {
        let store = memory_store().await;
        let check_in = ts(2025, 7, 7, 9, 0, 0);
        let location = Some(GeoPoint {
            latitude: 35.6812,
            longitude: 139.7671,
        });

        let created = store
            .create_session("emp-1", check_in, check_in.date_naive(), location)
            .await
            .unwrap();
        assert!(created.is_open());
        assert_eq!(created.location, location);

        let open = store.open_session_for("emp-1").await.unwrap().unwrap();
        assert_eq!(open.id, created.id);
        assert_eq!(open.check_in_time, check_in);
        assert_eq!(open.date, check_in.date_naive());

        let all = store.sessions_for("emp-1", None).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn second_open_session_is_rejected() {
        let store = memory_store().await;
        let check_in = ts(2025, 7, 7, 9, 0, 0);

        let first = store
            .create_session("emp-1", check_in, check_in.date_naive(), None)
            .await
            .unwrap();

        let second = store
            .create_session("emp-1", check_in, check_in.date_naive(), None)
            .await;
        assert!(matches!(second, Err(StoreError::OpenSessionExists)));

        // Another employee is unaffected.
        store
            .create_session("emp-2", check_in, check_in.date_naive(), None)
            .await
            .unwrap();

        // Closing the first session frees the slot.
        store
            .close_session(first.id, ts(2025, 7, 7, 17, 0, 0), 480)
            .await
            .unwrap();
        store
            .create_session("emp-1", ts(2025, 7, 7, 18, 0, 0), check_in.date_naive(), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn close_session_targets_open_rows_only() {
        let store = memory_store().await;
        let check_in = ts(2025, 7, 7, 9, 0, 0);
        let session = store
            .create_session("emp-1", check_in, check_in.date_naive(), None)
            .await
            .unwrap();

        store
            .close_session(session.id, ts(2025, 7, 7, 17, 30, 0), 510)
            .await
            .unwrap();
        assert!(store.open_session_for("emp-1").await.unwrap().is_none());

        let reloaded = &store.sessions_for("emp-1", None).await.unwrap()[0];
        assert_eq!(reloaded.duration_minutes, Some(510));
        assert_eq!(reloaded.check_out_time, Some(ts(2025, 7, 7, 17, 30, 0)));

        let again = store
            .close_session(session.id, ts(2025, 7, 7, 18, 0, 0), 540)
            .await;
        assert!(matches!(again, Err(StoreError::Write(_))));
    }

    #[tokio::test]
    async fn sessions_for_filters_by_date_range() {
        let store = memory_store().await;

        for (day, month) in [(30, 6), (7, 7), (31, 7), (1, 8)] {
            let check_in = ts(2025, month, day, 9, 0, 0);
            let session = store
                .create_session("emp-1", check_in, check_in.date_naive(), None)
                .await
                .unwrap();
            store
                .close_session(session.id, ts(2025, month, day, 17, 0, 0), 480)
                .await
                .unwrap();
        }

        let july = store
            .sessions_for("emp-1", month_window(7, 2025))
            .await
            .unwrap();
        assert_eq!(july.len(), 2);
        assert!(july.iter().all(|s| s.date.to_string().starts_with("2025-07")));
    }

    #[tokio::test]
    async fn open_sessions_spans_employees() {
        let store = memory_store().await;
        let check_in = ts(2025, 7, 7, 9, 0, 0);

        store
            .create_session("emp-1", check_in, check_in.date_naive(), None)
            .await
            .unwrap();
        store
            .create_session("emp-2", ts(2025, 7, 7, 9, 5, 0), check_in.date_naive(), None)
            .await
            .unwrap();

        let open = store.open_sessions().await.unwrap();
        assert_eq!(open.len(), 2);
        assert_eq!(open[0].employee_id, "emp-1");
        assert_eq!(open[1].employee_id, "emp-2");
    }

    #[tokio::test]
    async fn upsert_employee_is_create_or_get() {
        let store = memory_store().await;

        let created = store
            .upsert_employee("emp-1", "Aiko Tanaka", "aiko@example.com", Role::Employee)
            .await
            .unwrap();
        assert_eq!(created.role, Role::Employee);
        assert!(created.schedule.is_none());

        // A second sight of the same identity returns the existing record.
        let again = store
            .upsert_employee("emp-1", "Renamed", "other@example.com", Role::Admin)
            .await
            .unwrap();
        assert_eq!(again.name, "Aiko Tanaka");
        assert_eq!(again.role, Role::Employee);
    }

    #[tokio::test]
    async fn schedule_roundtrips_through_the_store() {
        let store = memory_store().await;
        store
            .upsert_employee("emp-1", "Aiko Tanaka", "aiko@example.com", Role::Employee)
            .await
            .unwrap();

        store.set_schedule("emp-1", &schedule()).await.unwrap();

        let profile = store.profile("emp-1").await.unwrap().unwrap();
        assert_eq!(profile.schedule, Some(schedule()));

        let missing = store.set_schedule("ghost", &schedule()).await;
        assert!(matches!(missing, Err(StoreError::Write(_))));
    }

    #[tokio::test]
    async fn leave_request_lifecycle() {
        let store = memory_store().await;
        let start = NaiveDate::from_ymd_opt(2025, 8, 11).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 8, 15).unwrap();

        let request = store
            .create_leave_request("emp-1", LeaveType::Annual, start, end, Some("summer break"))
            .await
            .unwrap();
        assert_eq!(request.status, LeaveStatus::Pending);
        assert_eq!(request.reason.as_deref(), Some("summer break"));

        assert_eq!(store.pending_leave_requests().await.unwrap().len(), 1);

        store
            .set_leave_status(request.id, LeaveStatus::Approved, "admin-1")
            .await
            .unwrap();

        let reviewed = store.leave_request(request.id).await.unwrap().unwrap();
        assert_eq!(reviewed.status, LeaveStatus::Approved);
        assert_eq!(reviewed.reviewed_by.as_deref(), Some("admin-1"));
        assert!(store.pending_leave_requests().await.unwrap().is_empty());

        let listed = store.leave_requests_for("emp-1").await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn messages_inbox_is_newest_first() {
        let store = memory_store().await;

        store
            .send_message("admin-1", "emp-1", "Welcome aboard")
            .await
            .unwrap();
        let second = store
            .send_message("admin-1", "emp-1", "Staff meeting at 10")
            .await
            .unwrap();

        let inbox = store.inbox("emp-1").await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].body, "Staff meeting at 10");
        assert!(!inbox[0].is_read);

        store.mark_read(second.id).await.unwrap();
        let inbox = store.inbox("emp-1").await.unwrap();
        assert!(inbox[0].is_read);

        assert!(matches!(
            store.mark_read(9999).await,
            Err(StoreError::Write(_))
        ));
    }
}
