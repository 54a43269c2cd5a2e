//! # heatkeeper-adapter-virtual
//!
//! Simulated vendor API for testing and demonstration purposes.
//!
//! The simulated home holds zones with an optional overlay each, and users
//! with a presence. Reads reflect the current state, mutations change it and
//! are recorded so tests can assert on them. The vendor can be taken offline
//! to exercise failure paths.
//!
//! ## Dependency rule
//!
//! Depends on `heatkeeper-app` (port traits) and `heatkeeper-domain` only.

mod error;

pub use error::VirtualError;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use heatkeeper_app::ports::ZoneController;
use heatkeeper_domain::error::{HeatKeeperError, NotFoundError};
use heatkeeper_domain::id::{UserId, ZoneId};
use heatkeeper_domain::presence::{Presence, User};
use heatkeeper_domain::zone::{Overlay, Termination, Zone, ZoneState};

/// A vendor mutation received by the simulated API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mutation {
    SetOverlay {
        zone_id: ZoneId,
        temperature: f64,
        duration: Option<Duration>,
    },
    DeleteOverlay {
        zone_id: ZoneId,
    },
}

#[derive(Debug)]
struct SimulatedZone {
    zone: Zone,
    overlay: Option<Overlay>,
}

#[derive(Debug, Default)]
struct Home {
    zones: BTreeMap<ZoneId, SimulatedZone>,
    users: BTreeMap<UserId, User>,
    mutations: Vec<Mutation>,
    offline: bool,
}

/// In-memory [`ZoneController`].
#[derive(Debug, Default)]
pub struct VirtualController {
    home: Mutex<Home>,
}

impl VirtualController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zone without overlay.
    #[must_use]
    pub fn with_zone(self, zone: Zone) -> Self {
        self.add_zone(zone);
        self
    }

    /// Add a user.
    #[must_use]
    pub fn with_user(self, user: User) -> Self {
        self.add_user(user);
        self
    }

    pub fn add_zone(&self, zone: Zone) {
        self.lock()
            .zones
            .insert(zone.id, SimulatedZone { zone, overlay: None });
    }

    pub fn add_user(&self, user: User) {
        self.lock().users.insert(user.id, user);
    }

    /// Change a user's presence, as if their phone had moved.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown user.
    pub fn set_presence(&self, user_id: UserId, presence: Presence) -> Result<(), HeatKeeperError> {
        let mut home = self.lock();
        let user = home.users.get_mut(&user_id).ok_or_else(|| NotFoundError {
            entity: "User",
            id: user_id.to_string(),
        })?;
        tracing::debug!(user = %user.name, %presence, "presence changed");
        user.presence = presence;
        Ok(())
    }

    /// Place an overlay directly, as if someone had used the thermostat.
    /// Not recorded as a mutation.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown zone.
    pub fn place_overlay(&self, zone_id: ZoneId, overlay: Option<Overlay>) -> Result<(), HeatKeeperError> {
        let mut home = self.lock();
        let zone = home
            .zones
            .get_mut(&zone_id)
            .ok_or(VirtualError::UnknownZone(zone_id))?;
        zone.overlay = overlay;
        Ok(())
    }

    /// Set a manual, indefinite overlay at `temperature`.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown zone.
    pub fn set_manual(&self, zone_id: ZoneId, temperature: f64) -> Result<(), HeatKeeperError> {
        self.place_overlay(
            zone_id,
            Some(Overlay {
                power: true,
                temperature: Some(temperature),
                termination: Termination::Manual,
            }),
        )
    }

    /// Make every call fail with [`VirtualError::Offline`] until reset.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Mutations received so far, oldest first.
    #[must_use]
    pub fn mutations(&self) -> Vec<Mutation> {
        self.lock().mutations.clone()
    }

    /// Current state of a zone, as the poller would see it.
    #[must_use]
    pub fn zone_state(&self, zone_id: ZoneId) -> Option<ZoneState> {
        self.lock()
            .zones
            .get(&zone_id)
            .map(|z| ZoneState::from_overlay(z.overlay.as_ref()))
    }

    fn lock(&self) -> MutexGuard<'_, Home> {
        self.home.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn online(&self) -> Result<MutexGuard<'_, Home>, VirtualError> {
        let home = self.lock();
        if home.offline {
            return Err(VirtualError::Offline);
        }
        Ok(home)
    }

    fn apply_overlay(
        &self,
        zone_id: ZoneId,
        temperature: f64,
        duration: Option<Duration>,
    ) -> Result<(), VirtualError> {
        let mut home = self.online()?;
        let zone = home
            .zones
            .get_mut(&zone_id)
            .ok_or(VirtualError::UnknownZone(zone_id))?;
        zone.overlay = Some(Overlay {
            power: true,
            temperature: Some(temperature),
            termination: Termination::from_duration(duration),
        });
        tracing::info!(zone = %zone.zone.name, temperature, "overlay set");
        home.mutations.push(Mutation::SetOverlay {
            zone_id,
            temperature,
            duration,
        });
        Ok(())
    }

    fn remove_overlay(&self, zone_id: ZoneId) -> Result<(), VirtualError> {
        let mut home = self.online()?;
        let zone = home
            .zones
            .get_mut(&zone_id)
            .ok_or(VirtualError::UnknownZone(zone_id))?;
        zone.overlay = None;
        tracing::info!(zone = %zone.zone.name, "overlay deleted");
        home.mutations.push(Mutation::DeleteOverlay { zone_id });
        Ok(())
    }
}

impl ZoneController for VirtualController {
    fn get_zones(&self) -> impl Future<Output = Result<Vec<Zone>, HeatKeeperError>> + Send {
        let result: Result<Vec<Zone>, _> = self
            .online()
            .map(|home| home.zones.values().map(|z| z.zone.clone()).collect())
            .map_err(VirtualError::into_domain);
        async { result }
    }

    fn get_zone_state(
        &self,
        zone_id: ZoneId,
    ) -> impl Future<Output = Result<ZoneState, HeatKeeperError>> + Send {
        let result = self
            .online()
            .and_then(|home| {
                home.zones
                    .get(&zone_id)
                    .map(|z| ZoneState::from_overlay(z.overlay.as_ref()))
                    .ok_or(VirtualError::UnknownZone(zone_id))
            })
            .map_err(VirtualError::into_domain);
        async { result }
    }

    fn get_presence(&self) -> impl Future<Output = Result<Vec<User>, HeatKeeperError>> + Send {
        let result: Result<Vec<User>, _> = self
            .online()
            .map(|home| home.users.values().cloned().collect())
            .map_err(VirtualError::into_domain);
        async { result }
    }

    fn set_overlay(
        &self,
        zone_id: ZoneId,
        temperature: f64,
        duration: Option<Duration>,
    ) -> impl Future<Output = Result<(), HeatKeeperError>> + Send {
        let result = self
            .apply_overlay(zone_id, temperature, duration)
            .map_err(VirtualError::into_domain);
        async { result }
    }

    fn delete_overlay(
        &self,
        zone_id: ZoneId,
    ) -> impl Future<Output = Result<(), HeatKeeperError>> + Send {
        let result = self
            .remove_overlay(zone_id)
            .map_err(VirtualError::into_domain);
        async { result }
    }
}
