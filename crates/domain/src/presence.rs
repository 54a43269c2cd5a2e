//! Users and their home/away classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// Presence of a tracked user device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Home,
    Away,
    /// The device has no geolocation tracking enabled.
    #[default]
    Unknown,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("home"),
            Self::Away => f.write_str("away"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// A user (mobile device) known to the vendor account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub presence: Presence,
}

impl User {
    #[must_use]
    pub fn new(id: UserId, name: impl Into<String>, presence: Presence) -> Self {
        Self {
            id,
            name: name.into(),
            presence,
        }
    }

    /// Whether the user's location is tracked at all.
    #[must_use]
    pub fn is_geo_tracked(&self) -> bool {
        self.presence != Presence::Unknown
    }
}

/// Join user names and conjugate for a reason string: `"alice is away"`,
/// `"alice, bob are home"`.
#[must_use]
pub fn describe(names: &[&str], presence: Presence) -> String {
    let verb = if names.len() == 1 { "is" } else { "are" };
    format!("{} {verb} {presence}", names.join(", "))
}
