//! Report: a read-only view of what the controller currently intends.

use serde::{Deserialize, Serialize};

use crate::id::ZoneId;
use crate::task::ScheduledTask;
use crate::zone::ZoneState;

/// Per-zone status as of the last processed update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneReport {
    pub zone_id: ZoneId,
    pub zone_name: String,
    pub state: ZoneState,
    /// Human-readable authoritative decision.
    pub decision: String,
    /// Pending or executing task, if any.
    pub scheduled: Option<ScheduledTask>,
}

/// Every controlled zone, in configuration order. Zones whose rules could
/// not be resolved are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub zones: Vec<ZoneReport>,
}
