//! Decisions: what a zone should do next, and how competing ones resolve.
//!
//! Every rule produces a [`CandidateDecision`] per poll cycle. [`aggregate`]
//! reduces all candidates for one zone to the single authoritative decision.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::id::ZoneId;
use crate::zone::ZoneState;

/// A state the rules can drive a zone to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetState {
    /// Low-temperature overlay.
    Off,
    /// Overlay removed, schedule resumes.
    Auto,
}

impl TargetState {
    /// Whether the zone already reflects this target.
    #[must_use]
    pub fn is_reached_by(self, state: ZoneState) -> bool {
        matches!(
            (self, state),
            (Self::Off, ZoneState::Off) | (Self::Auto, ZoneState::Auto)
        )
    }

    /// Operator-facing description of the transition.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Off => "switching off heating",
            Self::Auto => "moving to auto mode",
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str("off"),
            Self::Auto => f.write_str("auto"),
        }
    }
}

/// The actionable part of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub target: TargetState,
    pub delay: Duration,
}

/// One rule's (or the aggregator's) verdict for a zone in one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDecision {
    pub zone_id: ZoneId,
    /// `None` means "leave the zone alone".
    pub action: Option<Action>,
    /// Always populated, even when not acting.
    pub reason: String,
}

impl CandidateDecision {
    #[must_use]
    pub fn act(
        zone_id: ZoneId,
        target: TargetState,
        delay: Duration,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            zone_id,
            action: Some(Action { target, delay }),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn no_action(zone_id: ZoneId, reason: impl Into<String>) -> Self {
        Self {
            zone_id,
            action: None,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_action(&self) -> bool {
        self.action.is_some()
    }
}

impl fmt::Display for CandidateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            Some(Action { target, delay }) if delay.is_zero() => {
                write!(f, "{}. Reason: {}", target.describe(), self.reason)
            }
            Some(Action { target, delay }) => write!(
                f,
                "{} in {}. Reason: {}",
                target.describe(),
                crate::time::format_delay(delay),
                self.reason
            ),
            None => write!(f, "no action. Reason: {}", self.reason),
        }
    }
}

/// Reduce all candidates for `zone_id` to one authoritative decision.
///
/// Acting candidates win over non-acting ones. Among acting candidates an
/// `Off` target beats any other target whatever its delay; within the same
/// target the smallest delay wins and ties go to the earliest candidate.
/// Without any acting candidate the result carries the sorted, deduplicated
/// union of all non-empty reasons.
#[must_use]
pub fn aggregate(zone_id: ZoneId, candidates: &[CandidateDecision]) -> CandidateDecision {
    let acting: Vec<(&CandidateDecision, Action)> = candidates
        .iter()
        .filter_map(|c| c.action.map(|a| (c, a)))
        .collect();

    if !acting.is_empty() {
        let switching_off = acting.iter().any(|(_, a)| a.target == TargetState::Off);
        let winner = acting
            .iter()
            .filter(|(_, a)| !switching_off || a.target == TargetState::Off)
            .min_by_key(|(_, a)| a.delay);
        if let Some((decision, _)) = winner {
            return CandidateDecision {
                zone_id,
                ..(*decision).clone()
            };
        }
    }

    let reasons: BTreeSet<&str> = candidates
        .iter()
        .map(|c| c.reason.as_str())
        .filter(|r| !r.is_empty())
        .collect();
    CandidateDecision::no_action(zone_id, reasons.into_iter().collect::<Vec<_>>().join(", "))
}
