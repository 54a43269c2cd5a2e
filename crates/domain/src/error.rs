//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`HeatKeeperError`] via `#[from]` or an explicit `into_domain`.

use std::error::Error as StdError;

/// Top-level error type shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum HeatKeeperError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced zone, user, or task does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The vendor control API failed.
    #[error("vendor API error")]
    Vendor(#[source] Box<dyn StdError + Send + Sync>),

    /// The control loop is not running anymore.
    #[error("control loop unavailable")]
    Unavailable,
}

impl HeatKeeperError {
    /// Wrap any error raised by a vendor client.
    pub fn vendor(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::Vendor(Box::new(err))
    }
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("zone {zone:?} has no rules")]
    NoRules { zone: String },

    #[error("auto-away rule for zone {zone:?} tracks no users")]
    NoUsers { zone: String },

    #[error("invalid clock time {0:?}, expected HH:MM[:SS]")]
    InvalidClockTime(String),
}

/// A lookup by identifier or name returned nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id:?} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
