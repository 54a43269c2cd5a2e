//! Night-time: clear manual overrides at a fixed time of day.

use chrono::Local;

use crate::decision::{CandidateDecision, TargetState};
use crate::id::ZoneId;
use crate::time::ClockTime;
use crate::update::Update;

use super::{MANUAL_SETTING_DETECTED, NO_MANUAL_SETTING};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightTimeRule {
    pub zone_id: ZoneId,
    /// Local wall-clock time at which overrides are removed.
    pub time: ClockTime,
}

impl NightTimeRule {
    #[must_use]
    pub fn evaluate(&self, update: &Update) -> CandidateDecision {
        if !update.zone_state(self.zone_id).is_manual() {
            return CandidateDecision::no_action(self.zone_id, NO_MANUAL_SETTING);
        }
        let now = update.timestamp().with_timezone(&Local);
        CandidateDecision::act(
            self.zone_id,
            TargetState::Auto,
            self.time.until_next(&now),
            MANUAL_SETTING_DETECTED,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::zone::{Zone, ZoneState};

    const ZONE: ZoneId = ZoneId::new(2);

    fn update_at_local(h: u32, m: u32, state: ZoneState) -> Update {
        let local = Local.with_ymd_and_hms(2026, 1, 15, h, m, 0).unwrap();
        Update::builder()
            .zone(Zone::new(ZONE, "Bedroom"), state)
            .timestamp(local.with_timezone(&Utc))
            .build()
    }

    fn rule(h: u32, m: u32) -> NightTimeRule {
        NightTimeRule {
            zone_id: ZONE,
            time: ClockTime::from_hms(h, m, 0).unwrap(),
        }
    }

    #[test]
    fn should_wait_until_configured_time_today() {
        let update = update_at_local(22, 0, ZoneState::Manual { temperature: 21.0 });
        let decision = rule(23, 30).evaluate(&update);
        let action = decision.action.unwrap();
        assert_eq!(action.target, TargetState::Auto);
        assert_eq!(action.delay, Duration::from_secs(90 * 60));
        assert_eq!(decision.reason, MANUAL_SETTING_DETECTED);
    }

    #[test]
    fn should_wait_until_tomorrow_when_time_has_passed() {
        let update = update_at_local(23, 45, ZoneState::Manual { temperature: 21.0 });
        let action = rule(23, 30).evaluate(&update).action.unwrap();
        assert_eq!(action.delay, Duration::from_secs(24 * 3600 - 15 * 60));
    }

    #[test]
    fn should_not_act_without_manual_override() {
        let update = update_at_local(22, 0, ZoneState::Auto);
        let decision = rule(23, 30).evaluate(&update);
        assert!(!decision.is_action());
        assert_eq!(decision.reason, NO_MANUAL_SETTING);
    }
}
