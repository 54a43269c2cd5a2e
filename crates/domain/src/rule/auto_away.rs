//! Auto-away: switch heating off when every tracked user has left.

use std::time::Duration;

use crate::decision::{CandidateDecision, TargetState};
use crate::id::{UserId, ZoneId};
use crate::presence::{Presence, describe};
use crate::update::Update;
use crate::zone::ZoneState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoAwayRule {
    pub zone_id: ZoneId,
    /// How long everyone must have been away before switching off.
    pub delay: Duration,
    pub users: Vec<UserId>,
}

impl AutoAwayRule {
    #[must_use]
    pub fn evaluate(&self, update: &Update) -> CandidateDecision {
        // Users without geo-tracking take no part in the decision.
        let tracked: Vec<_> = self
            .users
            .iter()
            .filter_map(|id| update.user(*id))
            .filter(|u| u.is_geo_tracked())
            .collect();

        if tracked.is_empty() {
            return CandidateDecision::no_action(self.zone_id, "no geo-tracked users");
        }

        let home: Vec<&str> = tracked
            .iter()
            .filter(|u| u.presence == Presence::Home)
            .map(|u| u.name.as_str())
            .collect();
        let away: Vec<&str> = tracked
            .iter()
            .filter(|u| u.presence == Presence::Away)
            .map(|u| u.name.as_str())
            .collect();

        let state = update.zone_state(self.zone_id);

        if home.is_empty() {
            let reason = describe(&away, Presence::Away);
            if state == ZoneState::Off {
                return CandidateDecision::no_action(self.zone_id, reason);
            }
            return CandidateDecision::act(self.zone_id, TargetState::Off, self.delay, reason);
        }

        let reason = describe(&home, Presence::Home);
        if state == ZoneState::Off {
            return CandidateDecision::act(self.zone_id, TargetState::Auto, Duration::ZERO, reason);
        }
        CandidateDecision::no_action(self.zone_id, reason)
    }
}
