//! Vendor control port: read zone/presence state and mutate overlays.

use std::future::Future;
use std::time::Duration;

use heatkeeper_domain::error::HeatKeeperError;
use heatkeeper_domain::id::ZoneId;
use heatkeeper_domain::presence::User;
use heatkeeper_domain::zone::{Zone, ZoneState};

/// Client for the vendor's climate-control API.
///
/// Implementations live in adapter crates (e.g. `heatkeeper-adapter-virtual`).
pub trait ZoneController {
    /// List every zone of the home.
    fn get_zones(&self) -> impl Future<Output = Result<Vec<Zone>, HeatKeeperError>> + Send;

    /// Current heating state of one zone.
    fn get_zone_state(
        &self,
        zone_id: ZoneId,
    ) -> impl Future<Output = Result<ZoneState, HeatKeeperError>> + Send;

    /// Every user device with its presence.
    fn get_presence(&self) -> impl Future<Output = Result<Vec<User>, HeatKeeperError>> + Send;

    /// Place a manual overlay. `duration: None` means it never expires.
    fn set_overlay(
        &self,
        zone_id: ZoneId,
        temperature: f64,
        duration: Option<Duration>,
    ) -> impl Future<Output = Result<(), HeatKeeperError>> + Send;

    /// Remove any overlay so the zone follows its schedule again.
    fn delete_overlay(
        &self,
        zone_id: ZoneId,
    ) -> impl Future<Output = Result<(), HeatKeeperError>> + Send;
}

impl<T: ZoneController + Send + Sync> ZoneController for std::sync::Arc<T> {
    fn get_zones(&self) -> impl Future<Output = Result<Vec<Zone>, HeatKeeperError>> + Send {
        (**self).get_zones()
    }

    fn get_zone_state(
        &self,
        zone_id: ZoneId,
    ) -> impl Future<Output = Result<ZoneState, HeatKeeperError>> + Send {
        (**self).get_zone_state(zone_id)
    }

    fn get_presence(&self) -> impl Future<Output = Result<Vec<User>, HeatKeeperError>> + Send {
        (**self).get_presence()
    }

    fn set_overlay(
        &self,
        zone_id: ZoneId,
        temperature: f64,
        duration: Option<Duration>,
    ) -> impl Future<Output = Result<(), HeatKeeperError>> + Send {
        (**self).set_overlay(zone_id, temperature, duration)
    }

    fn delete_overlay(
        &self,
        zone_id: ZoneId,
    ) -> impl Future<Output = Result<(), HeatKeeperError>> + Send {
        (**self).delete_overlay(zone_id)
    }
}
