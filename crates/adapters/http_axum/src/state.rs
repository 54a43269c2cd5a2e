//! Shared application state for axum handlers.

use heatkeeper_app::control_loop::ControlHandle;

/// Application state shared across all axum handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Client of the running control loop.
    pub control: ControlHandle,
}

impl AppState {
    #[must_use]
    pub fn new(control: ControlHandle) -> Self {
        Self { control }
    }
}
