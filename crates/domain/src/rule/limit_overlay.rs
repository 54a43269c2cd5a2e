//! Limit-overlay: put a manual override back to auto after a while.

use std::time::Duration;

use crate::decision::{CandidateDecision, TargetState};
use crate::id::ZoneId;
use crate::update::Update;

use super::{MANUAL_SETTING_DETECTED, NO_MANUAL_SETTING};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitOverlayRule {
    pub zone_id: ZoneId,
    /// Maximum lifetime of a manual override.
    pub delay: Duration,
}

impl LimitOverlayRule {
    #[must_use]
    pub fn evaluate(&self, update: &Update) -> CandidateDecision {
        if update.zone_state(self.zone_id).is_manual() {
            CandidateDecision::act(
                self.zone_id,
                TargetState::Auto,
                self.delay,
                MANUAL_SETTING_DETECTED,
            )
        } else {
            CandidateDecision::no_action(self.zone_id, NO_MANUAL_SETTING)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Action;
    use crate::zone::{Overlay, Termination, Zone, ZoneState};

    const ZONE: ZoneId = ZoneId::new(4);

    fn rule() -> LimitOverlayRule {
        LimitOverlayRule {
            zone_id: ZONE,
            delay: Duration::from_secs(3600),
        }
    }

    fn update(state: ZoneState) -> Update {
        Update::builder()
            .zone(Zone::new(ZONE, "Study"), state)
            .build()
    }

    #[test]
    fn should_move_to_auto_after_limit_when_manual() {
        let decision = rule().evaluate(&update(ZoneState::Manual { temperature: 23.0 }));
        assert_eq!(
            decision.action,
            Some(Action {
                target: TargetState::Auto,
                delay: Duration::from_secs(3600)
            })
        );
        assert_eq!(decision.reason, MANUAL_SETTING_DETECTED);
    }

    #[test]
    fn should_not_act_when_zone_is_auto() {
        let decision = rule().evaluate(&update(ZoneState::Auto));
        assert!(!decision.is_action());
        assert_eq!(decision.reason, NO_MANUAL_SETTING);
    }

    #[test]
    fn should_not_act_when_zone_is_off() {
        assert!(!rule().evaluate(&update(ZoneState::Off)).is_action());
    }

    #[test]
    fn should_not_act_on_overlay_with_its_own_expiry() {
        let overlay = Overlay {
            power: true,
            temperature: Some(23.0),
            termination: Termination::Timer {
                remaining_secs: 1800,
            },
        };
        let state = ZoneState::from_overlay(Some(&overlay));
        assert!(!rule().evaluate(&update(state)).is_action());
    }
}
