use chrono::NaiveDate;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use super::models::AttendanceSession;
use super::{SessionChange, SessionStore, StoreError};

/// Replace-semantics subscription over a session store: every relevant
/// change produces a full re-query, never a delta to merge. Dropping the
/// feed unsubscribes.
pub struct SessionFeed<S> {
    store: S,
    employee_id: String,
    range: Option<(NaiveDate, NaiveDate)>,
    rx: broadcast::Receiver<SessionChange>,
}

impl<S: SessionStore> SessionFeed<S> {
    pub fn new(
        store: S,
        employee_id: impl Into<String>,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Self {
        let rx = store.changes();
        Self {
            store,
            employee_id: employee_id.into(),
            range,
            rx,
        }
    }

    /// Current full set, without waiting for a change.
    pub async fn snapshot(&self) -> Result<Vec<AttendanceSession>, StoreError> {
        self.store.sessions_for(&self.employee_id, self.range).await
    }

    /// Waits for the next relevant change and returns the full current
    /// set. A lagged receiver re-queries immediately; the fresh snapshot
    /// absorbs whatever notifications were missed.
    pub async fn next_snapshot(&mut self) -> Result<Vec<AttendanceSession>, StoreError> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.employee_id == self.employee_id => {
                    return self.snapshot().await;
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "session feed lagged, re-querying");
                    return self.snapshot().await;
                }
                Err(RecvError::Closed) => {
                    return Err(StoreError::Read("session change feed closed".to_string()));
                }
            }
        }
    }
}
