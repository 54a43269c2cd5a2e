//! Rules: declarative per-zone configuration and the evaluators built from it.
//!
//! A [`ZoneConfig`] names its zone and users; [`ZoneConfig::resolve`] turns
//! those names into vendor ids against a snapshot, producing [`ZoneRules`]
//! whose [`Rule`]s evaluate to [`CandidateDecision`]s.

mod auto_away;
mod limit_overlay;
mod night_time;

pub use auto_away::AutoAwayRule;
pub use limit_overlay::LimitOverlayRule;
pub use night_time::NightTimeRule;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::decision::{CandidateDecision, aggregate};
use crate::error::{HeatKeeperError, NotFoundError, ValidationError};
use crate::id::ZoneId;
use crate::time::ClockTime;
use crate::update::Update;

/// Reason reported by rules reacting to a manual override.
pub const MANUAL_SETTING_DETECTED: &str = "manual temperature setting detected";
/// Reason reported by rules when no manual override is present.
pub const NO_MANUAL_SETTING: &str = "no manual temperature setting detected";

/// Declarative rule, as loaded from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleConfig {
    /// Switch heating off when every tracked user is away.
    AutoAway {
        #[serde(default)]
        delay_secs: u64,
        users: Vec<String>,
    },
    /// Remove manual overrides after they have been active for a while.
    LimitOverlay {
        #[serde(default)]
        delay_secs: u64,
    },
    /// Remove manual overrides at a fixed time of day.
    NightTime { time: ClockTime },
}

/// All rules configured for one zone, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub zone: String,
    pub rules: Vec<RuleConfig>,
}

impl ZoneConfig {
    /// Check invariants that do not need a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`HeatKeeperError::Validation`] when:
    /// - `zone` is empty ([`ValidationError::EmptyName`])
    /// - `rules` is empty ([`ValidationError::NoRules`])
    /// - an auto-away rule lists no users ([`ValidationError::NoUsers`])
    pub fn validate(&self) -> Result<(), HeatKeeperError> {
        if self.zone.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.rules.is_empty() {
            return Err(ValidationError::NoRules {
                zone: self.zone.clone(),
            }
            .into());
        }
        let missing_users = self.rules.iter().any(|rule| {
            matches!(rule, RuleConfig::AutoAway { users, .. }
                if users.is_empty() || users.iter().any(String::is_empty))
        });
        if missing_users {
            return Err(ValidationError::NoUsers {
                zone: self.zone.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Resolve zone and user names against a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`HeatKeeperError::NotFound`] when the zone or any tracked
    /// user is unknown to the vendor, or a validation error from
    /// [`validate`](Self::validate).
    pub fn resolve(&self, update: &Update) -> Result<ZoneRules, HeatKeeperError> {
        self.validate()?;
        let zone = update.zone_by_name(&self.zone).ok_or_else(|| NotFoundError {
            entity: "Zone",
            id: self.zone.clone(),
        })?;

        let rules = self
            .rules
            .iter()
            .map(|config| Rule::resolve(zone.id, config, update))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ZoneRules {
            zone_id: zone.id,
            zone_name: zone.name.clone(),
            rules,
        })
    }
}

/// An evaluator with all names resolved to vendor ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    AutoAway(AutoAwayRule),
    LimitOverlay(LimitOverlayRule),
    NightTime(NightTimeRule),
}

impl Rule {
    fn resolve(
        zone_id: ZoneId,
        config: &RuleConfig,
        update: &Update,
    ) -> Result<Self, HeatKeeperError> {
        Ok(match config {
            RuleConfig::AutoAway { delay_secs, users } => {
                let users = users
                    .iter()
                    .map(|name| {
                        update.user_by_name(name).map(|u| u.id).ok_or_else(|| NotFoundError {
                            entity: "User",
                            id: name.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Self::AutoAway(AutoAwayRule {
                    zone_id,
                    delay: Duration::from_secs(*delay_secs),
                    users,
                })
            }
            RuleConfig::LimitOverlay { delay_secs } => Self::LimitOverlay(LimitOverlayRule {
                zone_id,
                delay: Duration::from_secs(*delay_secs),
            }),
            RuleConfig::NightTime { time } => Self::NightTime(NightTimeRule {
                zone_id,
                time: *time,
            }),
        })
    }

    /// Produce this rule's candidate decision for the snapshot.
    #[must_use]
    pub fn evaluate(&self, update: &Update) -> CandidateDecision {
        match self {
            Self::AutoAway(rule) => rule.evaluate(update),
            Self::LimitOverlay(rule) => rule.evaluate(update),
            Self::NightTime(rule) => rule.evaluate(update),
        }
    }
}

/// The resolved rule set of one zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRules {
    pub zone_id: ZoneId,
    pub zone_name: String,
    pub rules: Vec<Rule>,
}

impl ZoneRules {
    /// Each rule's own candidate, in rule order.
    #[must_use]
    pub fn candidates(&self, update: &Update) -> Vec<CandidateDecision> {
        self.rules.iter().map(|r| r.evaluate(update)).collect()
    }

    /// Evaluate every rule and aggregate into the authoritative decision.
    #[must_use]
    pub fn decide(&self, update: &Update) -> CandidateDecision {
        aggregate(self.zone_id, &self.candidates(update))
    }
}
