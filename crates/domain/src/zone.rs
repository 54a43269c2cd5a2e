//! Zones (controllable heating areas) and their derived heating state.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::id::ZoneId;

/// Temperature (°C) at or below which an indefinite overlay counts as "off".
///
/// This is also the setpoint written when a rule switches a zone off.
pub const OFF_TEMPERATURE: f64 = 5.0;

/// Immutable reference data for a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
}

impl Zone {
    #[must_use]
    pub fn new(id: ZoneId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// How a vendor-side overlay ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Termination {
    /// Stays until someone removes it.
    Manual,
    /// Expires after a fixed period.
    Timer { remaining_secs: u64 },
    /// Expires at the next block of the automatic schedule.
    NextTimeBlock,
}

impl Termination {
    /// Build a termination from an optional overlay duration.
    #[must_use]
    pub fn from_duration(duration: Option<Duration>) -> Self {
        match duration {
            Some(d) => Self::Timer {
                remaining_secs: d.as_secs(),
            },
            None => Self::Manual,
        }
    }
}

/// A vendor-side manual override of a zone's automatic schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    /// `false` when heating is powered off entirely.
    pub power: bool,
    /// Target temperature in °C, absent when powered off.
    pub temperature: Option<f64>,
    pub termination: Termination,
}

/// Heating state of a zone, derived each poll cycle from vendor data.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ZoneState {
    #[default]
    Unknown,
    Off,
    Auto,
    Manual { temperature: f64 },
}

impl ZoneState {
    /// Classify a zone from its current overlay.
    ///
    /// Overlays that expire on their own do not count as a manual override:
    /// the zone is reported as [`Auto`](Self::Auto).
    #[must_use]
    pub fn from_overlay(overlay: Option<&Overlay>) -> Self {
        let Some(overlay) = overlay else {
            return Self::Auto;
        };
        if overlay.termination != Termination::Manual {
            return Self::Auto;
        }
        match overlay.temperature {
            Some(temperature) if overlay.power && temperature > OFF_TEMPERATURE => {
                Self::Manual { temperature }
            }
            _ => Self::Off,
        }
    }

    #[must_use]
    pub fn is_manual(&self) -> bool {
        matches!(self, Self::Manual { .. })
    }
}

impl fmt::Display for ZoneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Off => f.write_str("off"),
            Self::Auto => f.write_str("auto"),
            Self::Manual { temperature } => write!(f, "manual ({temperature:.1}°C)"),
        }
    }
}
