//! # heatkeeper-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - `GET /health` for liveness probes
//! - `GET /api/report`: JSON view of every controlled zone, its last
//!   decision and pending task
//! - `POST /api/refresh`: force an out-of-cycle poll
//!
//! ## Dependency rule
//! Depends on `heatkeeper-app` (for the control handle) and
//! `heatkeeper-domain` (for response types). Never leaks axum types into the
//! domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
