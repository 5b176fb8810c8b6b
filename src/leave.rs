use chrono::NaiveDate;

use crate::store::models::{LeaveRequest, LeaveStatus, LeaveType};
use crate::store::{LeaveStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum LeaveError {
    #[error("invalid leave range: {0}")]
    InvalidRange(String),
    #[error("leave request {0} not found")]
    NotFound(i64),
    #[error("leave request {0} was already reviewed")]
    AlreadyReviewed(i64),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Leave-request workflow over any leave store: employees submit, admins
/// review. A request is immutable once reviewed.
pub struct LeaveDesk<S> {
    store: S,
}

impl<S: LeaveStore> LeaveDesk<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn submit(
        &self,
        employee_id: &str,
        leave_type: LeaveType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<LeaveRequest, LeaveError> {
        validate_range(start_date, end_date)?;

        let request = self
            .store
            .create_leave_request(employee_id, leave_type, start_date, end_date, reason)
            .await?;

        tracing::info!(employee_id, request_id = request.id, "leave request submitted");
        Ok(request)
    }

    pub async fn review(
        &self,
        request_id: i64,
        approve: bool,
        reviewer_id: &str,
    ) -> Result<LeaveRequest, LeaveError> {
        let request = self
            .store
            .leave_request(request_id)
            .await?
            .ok_or(LeaveError::NotFound(request_id))?;

        if request.status != LeaveStatus::Pending {
            return Err(LeaveError::AlreadyReviewed(request_id));
        }

        let status = if approve {
            LeaveStatus::Approved
        } else {
            LeaveStatus::Rejected
        };
        self.store
            .set_leave_status(request_id, status, reviewer_id)
            .await?;

        tracing::info!(
            request_id,
            reviewer_id,
            status = status.as_str(),
            "leave request reviewed"
        );

        self.store
            .leave_request(request_id)
            .await?
            .ok_or(LeaveError::NotFound(request_id))
    }

    pub async fn requests_for(&self, employee_id: &str) -> Result<Vec<LeaveRequest>, LeaveError> {
        Ok(self.store.leave_requests_for(employee_id).await?)
    }

    pub async fn pending(&self) -> Result<Vec<LeaveRequest>, LeaveError> {
        Ok(self.store.pending_leave_requests().await?)
    }
}

fn validate_range(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), LeaveError> {
    if end_date < start_date {
        return Err(LeaveError::InvalidRange(
            "end date is before start date".to_string(),
        ));
    }

    let days = end_date.signed_duration_since(start_date).num_days();
    if days > 365 {
        return Err(LeaveError::InvalidRange(
            "leave spans more than a year".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sqlite::SqliteStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn desk() -> LeaveDesk<SqliteStore> {
        LeaveDesk::new(SqliteStore::connect("sqlite::memory:").await.unwrap())
    }

    #[tokio::test]
    async fn submit_and_approve() {
        let desk = desk().await;

        let request = desk
            .submit(
                "emp-1",
                LeaveType::Sick,
                date(2025, 8, 11),
                date(2025, 8, 12),
                Some("flu"),
            )
            .await
            .unwrap();
        assert_eq!(request.status, LeaveStatus::Pending);
        assert_eq!(desk.pending().await.unwrap().len(), 1);

        let reviewed = desk.review(request.id, true, "admin-1").await.unwrap();
        assert_eq!(reviewed.status, LeaveStatus::Approved);
        assert_eq!(reviewed.reviewed_by.as_deref(), Some("admin-1"));
        assert!(desk.pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reject_keeps_the_request_listed_for_the_employee() {
        let desk = desk().await;

        let request = desk
            .submit(
                "emp-1",
                LeaveType::Annual,
                date(2025, 8, 11),
                date(2025, 8, 15),
                None,
            )
            .await
            .unwrap();
        let reviewed = desk.review(request.id, false, "admin-1").await.unwrap();
        assert_eq!(reviewed.status, LeaveStatus::Rejected);

        let listed = desk.requests_for("emp-1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, LeaveStatus::Rejected);
    }

    #[tokio::test]
    async fn reversed_range_is_rejected_before_the_store() {
        let desk = desk().await;

        let result = desk
            .submit(
                "emp-1",
                LeaveType::Unpaid,
                date(2025, 8, 15),
                date(2025, 8, 11),
                None,
            )
            .await;
        assert!(matches!(result, Err(LeaveError::InvalidRange(_))));
        assert!(desk.pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn over_long_range_is_rejected() {
        let desk = desk().await;

        let result = desk
            .submit(
                "emp-1",
                LeaveType::Unpaid,
                date(2025, 1, 1),
                date(2026, 6, 1),
                None,
            )
            .await;
        assert!(matches!(result, Err(LeaveError::InvalidRange(_))));
    }

    #[tokio::test]
    async fn double_review_is_refused() {
        let desk = desk().await;

        let request = desk
            .submit(
                "emp-1",
                LeaveType::Sick,
                date(2025, 8, 11),
                date(2025, 8, 12),
                None,
            )
            .await
            .unwrap();
        desk.review(request.id, true, "admin-1").await.unwrap();

        let again = desk.review(request.id, false, "admin-2").await;
        assert!(matches!(again, Err(LeaveError::AlreadyReviewed(_))));

        let missing = desk.review(9999, true, "admin-1").await;
        assert!(matches!(missing, Err(LeaveError::NotFound(9999))));
    }
}
