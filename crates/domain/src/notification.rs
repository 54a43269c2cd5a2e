//! Notification: an operator-facing record of a scheduler transition.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::decision::TargetState;
use crate::id::ZoneId;
use crate::time::{Timestamp, format_delay, now};

/// Which scheduler transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Queued,
    Executed,
    Cancelled,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => f.write_str("queued"),
            Self::Executed => f.write_str("executed"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Something an operator should hear about: a task for `zone_name` was
/// queued, carried out, or dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub zone_id: ZoneId,
    pub zone_name: String,
    /// Target of the task the transition applies to.
    pub target: TargetState,
    /// Only set for [`NotificationKind::Queued`].
    pub delay_secs: Option<u64>,
    /// Why the task was queued or executed, or why it was cancelled.
    pub reason: String,
    /// When the transition happened.
    pub timestamp: Timestamp,
}

impl Notification {
    /// Build a notification stamped with the current time.
    #[must_use]
    pub fn new(
        kind: NotificationKind,
        zone_id: ZoneId,
        zone_name: impl Into<String>,
        target: TargetState,
        delay: Option<Duration>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            zone_id,
            zone_name: zone_name.into(),
            target,
            delay_secs: delay.map(|d| d.as_secs()),
            reason: reason.into(),
            timestamp: now(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = self.target.describe();
        match (self.kind, self.delay_secs) {
            (NotificationKind::Queued, Some(secs)) => write!(
                f,
                "{}: {action} in {}",
                self.zone_name,
                format_delay(Duration::from_secs(secs))
            )?,
            (NotificationKind::Queued | NotificationKind::Executed, _) => {
                write!(f, "{}: {action}", self.zone_name)?;
            }
            (NotificationKind::Cancelled, _) => {
                write!(f, "{}: cancel {action}", self.zone_name)?;
            }
        }
        write!(f, ". Reason: {}", self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_queued_notification_with_delay() {
        let n = Notification::new(
            NotificationKind::Queued,
            ZoneId::new(1),
            "Living room",
            TargetState::Off,
            Some(Duration::from_secs(7200)),
            "alice is away",
        );
        assert_eq!(
            n.to_string(),
            "Living room: switching off heating in 2h. Reason: alice is away"
        );
    }

    #[test]
    fn should_display_executed_notification_without_delay() {
        let n = Notification::new(
            NotificationKind::Executed,
            ZoneId::new(1),
            "Study",
            TargetState::Auto,
            None,
            "manual temperature setting detected",
        );
        assert_eq!(
            n.to_string(),
            "Study: moving to auto mode. Reason: manual temperature setting detected"
        );
    }

    #[test]
    fn should_display_cancelled_notification() {
        let n = Notification::new(
            NotificationKind::Cancelled,
            ZoneId::new(1),
            "Living room",
            TargetState::Off,
            None,
            "alice is home",
        );
        assert_eq!(
            n.to_string(),
            "Living room: cancel switching off heating. Reason: alice is home"
        );
    }
}
