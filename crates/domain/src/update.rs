//! Update: an immutable, point-in-time snapshot of zones and presence.
//!
//! The poller builds one per cycle; evaluators only ever read it.

use std::collections::BTreeMap;

use crate::id::{UserId, ZoneId};
use crate::presence::User;
use crate::time::Timestamp;
use crate::zone::{Zone, ZoneState};

/// Snapshot of everything the rules need for one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    zones: BTreeMap<ZoneId, Zone>,
    zone_states: BTreeMap<ZoneId, ZoneState>,
    users: BTreeMap<UserId, User>,
    timestamp: Timestamp,
}

impl Update {
    /// Create a builder for constructing an [`Update`].
    #[must_use]
    pub fn builder() -> UpdateBuilder {
        UpdateBuilder::default()
    }

    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    #[must_use]
    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(&id)
    }

    #[must_use]
    pub fn zone_by_name(&self, name: &str) -> Option<&Zone> {
        self.zones.values().find(|z| z.name == name)
    }

    /// Current state of a zone, [`ZoneState::Unknown`] when not reported.
    #[must_use]
    pub fn zone_state(&self, id: ZoneId) -> ZoneState {
        self.zone_states.get(&id).copied().unwrap_or_default()
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    #[must_use]
    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    #[must_use]
    pub fn user_by_name(&self, name: &str) -> Option<&User> {
        self.users.values().find(|u| u.name == name)
    }
}

/// Step-by-step builder for [`Update`].
#[derive(Debug, Default)]
pub struct UpdateBuilder {
    zones: BTreeMap<ZoneId, Zone>,
    zone_states: BTreeMap<ZoneId, ZoneState>,
    users: BTreeMap<UserId, User>,
    timestamp: Option<Timestamp>,
}

impl UpdateBuilder {
    /// Add a zone together with its current state.
    #[must_use]
    pub fn zone(mut self, zone: Zone, state: ZoneState) -> Self {
        self.zone_states.insert(zone.id, state);
        self.zones.insert(zone.id, zone);
        self
    }

    #[must_use]
    pub fn user(mut self, user: User) -> Self {
        self.users.insert(user.id, user);
        self
    }

    #[must_use]
    pub fn timestamp(mut self, ts: Timestamp) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Consume the builder; the timestamp defaults to now.
    #[must_use]
    pub fn build(self) -> Update {
        Update {
            zones: self.zones,
            zone_states: self.zone_states,
            users: self.users,
            timestamp: self.timestamp.unwrap_or_else(crate::time::now),
        }
    }
}
