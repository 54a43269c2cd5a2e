//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod report;

use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/report", get(report::get))
        .route("/refresh", post(report::refresh))
}
