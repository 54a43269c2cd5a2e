//! # heatkeeper-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `ZoneController`: read zones and presence, set or delete overlays
//!   - `Notifier`: deliver operator notifications
//!   - `EventPublisher`: publish scheduler notifications
//! - Poll the vendor and distribute snapshots (`Poller`)
//! - Schedule, cancel and execute delayed per-zone actions (`TaskScheduler`)
//! - Tie it together in a single serialized `ControlLoop`
//! - Provide **in-process infrastructure** (notification bus, log notifier)
//!
//! ## Dependency rule
//! Depends on `heatkeeper-domain` only (plus `tokio` for channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod control_loop;
pub mod event_bus;
pub mod notifier;
pub mod poller;
pub mod ports;
pub mod scheduler;
