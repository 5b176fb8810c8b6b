use std::time::Duration;

use crate::store::models::GeoPoint;

/// Raised by a provider that could not produce a position. Callers always
/// degrade to "no location"; check-in is never blocked on it.
#[derive(Debug, thiserror::Error)]
#[error("location unavailable: {0}")]
pub struct LocationUnavailable(pub String);

#[allow(async_fn_in_trait)]
pub trait LocationProvider {
    async fn current_position(&self) -> Result<GeoPoint, LocationUnavailable>;
}

/// Provider for deployments without location capture.
pub struct NoLocation;

impl LocationProvider for NoLocation {
    async fn current_position(&self) -> Result<GeoPoint, LocationUnavailable> {
        Err(LocationUnavailable("location capture disabled".to_string()))
    }
}

/// A fixed coordinate, e.g. a kiosk terminal.
pub struct FixedLocation(pub GeoPoint);

impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<GeoPoint, LocationUnavailable> {
        Ok(self.0)
    }
}

/// Best-effort acquisition with a hard timeout. Failure and timeout both
/// resolve to `None`.
pub async fn best_effort_location<L: LocationProvider>(
    provider: &L,
    timeout: Duration,
) -> Option<GeoPoint> {
    match tokio::time::timeout(timeout, provider.current_position()).await {
        Ok(Ok(position)) => Some(position),
        Ok(Err(e)) => {
            tracing::warn!("proceeding without location: {}", e);
            None
        }
        Err(_) => {
            tracing::warn!("location request timed out after {:?}", timeout);
            None
        }
    }
}
