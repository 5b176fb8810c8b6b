use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};

use crate::location::{LocationProvider, best_effort_location};
use crate::store::models::AttendanceSession;
use crate::store::{SessionStore, StoreError};
use crate::utils::time::{duration_minutes, in_month, local_date_at};

use super::summary::{DailySummary, MonthlyRollup, rollup_month, summarize_daily};

pub const LOCATION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub enum CheckInOutcome {
    Started(AttendanceSession),
    /// A session was already open, here or on another device. No-op.
    AlreadyCheckedIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutOutcome {
    Completed { duration_minutes: i64 },
    /// No open session to close. No-op.
    NotCheckedIn,
}

/// Per-employee attendance state machine. Owns the in-memory open session
/// and the last delivered session list; all persistence goes through the
/// injected store. One instance per employee.
pub struct AttendanceTracker<S, L> {
    store: S,
    locator: L,
    employee_id: String,
    tz: FixedOffset,
    location_timeout: Duration,
    current: Option<AttendanceSession>,
    sessions: Vec<AttendanceSession>,
}

impl<S: SessionStore, L: LocationProvider> AttendanceTracker<S, L> {
    pub fn new(store: S, locator: L, employee_id: impl Into<String>, tz: FixedOffset) -> Self {
        Self {
            store,
            locator,
            employee_id: employee_id.into(),
            tz,
            location_timeout: LOCATION_TIMEOUT,
            current: None,
            sessions: Vec::new(),
        }
    }

    pub fn with_location_timeout(mut self, timeout: Duration) -> Self {
        self.location_timeout = timeout;
        self
    }

    /// Initial load: the full session history, with the open session (if
    /// any) re-derived from it.
    pub async fn hydrate(&mut self) -> Result<(), StoreError> {
        let sessions = self.store.sessions_for(&self.employee_id, None).await?;
        self.apply_snapshot(sessions);
        Ok(())
    }

    pub fn employee_id(&self) -> &str {
        &self.employee_id
    }

    pub fn is_checked_in(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_session(&self) -> Option<&AttendanceSession> {
        self.current.as_ref()
    }

    pub fn sessions(&self) -> &[AttendanceSession] {
        &self.sessions
    }

    /// Starts a session. Checking in while already checked in is a no-op;
    /// the open-session lookup goes to the store, and a lookup failure is
    /// surfaced rather than treated as idle.
    pub async fn check_in(&mut self) -> Result<CheckInOutcome, StoreError> {
        if self.current.is_some() {
            return Ok(CheckInOutcome::AlreadyCheckedIn);
        }

        if let Some(open) = self.store.open_session_for(&self.employee_id).await? {
            self.current = Some(open);
            return Ok(CheckInOutcome::AlreadyCheckedIn);
        }

        let location = best_effort_location(&self.locator, self.location_timeout).await;
        let now = Utc::now();
        let date = local_date_at(now, self.tz);

        let session = match self
            .store
            .create_session(&self.employee_id, now, date, location)
            .await
        {
            Ok(session) => session,
            // Lost a race with another device; the session it created wins.
            Err(StoreError::OpenSessionExists) => {
                if let Some(open) = self.store.open_session_for(&self.employee_id).await? {
                    self.current = Some(open);
                }
                return Ok(CheckInOutcome::AlreadyCheckedIn);
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            employee_id = %self.employee_id,
            session_id = session.id,
            "checked in"
        );
        self.current = Some(session.clone());
        self.sessions.push(session.clone());
        Ok(CheckInOutcome::Started(session))
    }

    /// Closes the open session. Checking out while idle is a no-op. The
    /// open session is only forgotten once the store confirms the write;
    /// on failure it stays held so the user can retry.
    pub async fn check_out(&mut self) -> Result<CheckOutOutcome, StoreError> {
        let Some(current) = self.current.clone() else {
            return Ok(CheckOutOutcome::NotCheckedIn);
        };

        let now = Utc::now();
        let minutes = duration_minutes(current.check_in_time, now);

        self.store.close_session(current.id, now, minutes).await?;

        tracing::info!(
            employee_id = %self.employee_id,
            session_id = current.id,
            duration_minutes = minutes,
            "checked out"
        );
        self.current = None;
        if let Some(entry) = self.sessions.iter_mut().find(|s| s.id == current.id) {
            entry.check_out_time = Some(now);
            entry.duration_minutes = Some(minutes);
        }
        Ok(CheckOutOutcome::Completed {
            duration_minutes: minutes,
        })
    }

    /// Live elapsed minutes of the open session at `now`; 0 when idle.
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> i64 {
        self.current
            .as_ref()
            .map(|session| duration_minutes(session.check_in_time, now))
            .unwrap_or(0)
    }

    /// Recomputed on every call; drive it from a ticking clock for a live
    /// display.
    pub fn current_session_elapsed(&self) -> i64 {
        self.elapsed_at(Utc::now())
    }

    /// Atomically replaces the in-memory session list with a delivered
    /// snapshot and re-derives the open session from it.
    pub fn apply_snapshot(&mut self, sessions: Vec<AttendanceSession>) {
        self.current = sessions.iter().find(|s| s.is_open()).cloned();
        self.sessions = sessions;
    }

    pub fn daily_summaries_at(
        &self,
        month: u32,
        year: i32,
        now: DateTime<Utc>,
    ) -> Vec<DailySummary> {
        let month_sessions: Vec<AttendanceSession> = self
            .sessions
            .iter()
            .filter(|s| in_month(s.date, month, year))
            .cloned()
            .collect();
        summarize_daily(&month_sessions, now)
    }

    pub fn daily_summaries(&self, month: u32, year: i32) -> Vec<DailySummary> {
        self.daily_summaries_at(month, year, Utc::now())
    }

    pub fn monthly_rollup_at(&self, month: u32, year: i32, now: DateTime<Utc>) -> MonthlyRollup {
        rollup_month(&self.daily_summaries_at(month, year, now), month, year)
    }

    pub fn monthly_rollup(&self, month: u32, year: i32) -> MonthlyRollup {
        self.monthly_rollup_at(month, year, Utc::now())
    }
}
