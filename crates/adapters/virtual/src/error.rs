//! Virtual adapter error types.

use heatkeeper_domain::error::{HeatKeeperError, NotFoundError};
use heatkeeper_domain::id::ZoneId;

/// Errors raised by the simulated vendor.
#[derive(Debug, thiserror::Error)]
pub enum VirtualError {
    /// The zone does not exist in the simulated home.
    #[error("unknown zone {0}")]
    UnknownZone(ZoneId),

    /// Failure injected with [`VirtualController::set_offline`](crate::VirtualController::set_offline).
    #[error("simulated vendor is offline")]
    Offline,
}

impl VirtualError {
    /// Convert into a [`HeatKeeperError`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> HeatKeeperError {
        match self {
            Self::UnknownZone(zone_id) => NotFoundError {
                entity: "Zone",
                id: zone_id.to_string(),
            }
            .into(),
            other => HeatKeeperError::vendor(other),
        }
    }
}

impl From<VirtualError> for HeatKeeperError {
    fn from(err: VirtualError) -> Self {
        err.into_domain()
    }
}
