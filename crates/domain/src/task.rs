//! Scheduled task: a pending, delayed state change for one zone.

use serde::{Deserialize, Serialize};

use crate::decision::TargetState;
use crate::id::{TaskId, ZoneId};
use crate::time::Timestamp;

/// A state change waiting for its activation time.
///
/// At most one exists per zone at any instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub zone_id: ZoneId,
    pub zone_name: String,
    pub target: TargetState,
    /// Decision time plus delay.
    pub activation: Timestamp,
    pub reason: String,
}
