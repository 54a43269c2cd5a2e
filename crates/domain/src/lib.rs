//! # heatkeeper-domain
//!
//! Pure domain model for the heatkeeper zone controller.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Zones** and their derived heating state
//! - Define **Users** and their presence
//! - Define **Updates** (immutable per-cycle snapshots)
//! - Define **Rules** (auto-away, overlay limit, night-time) and their evaluation
//! - Define **Decisions** and the aggregation policy between competing rules
//! - Define **Scheduled tasks**, **Notifications**, and the **Report** read model
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod decision;
pub mod notification;
pub mod presence;
pub mod report;
pub mod rule;
pub mod task;
pub mod update;
pub mod zone;
