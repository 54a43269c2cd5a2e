//! Report and refresh handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use heatkeeper_domain::report::Report;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the report endpoint.
pub enum GetResponse {
    Ok(Json<Report>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the refresh endpoint.
pub enum RefreshResponse {
    Accepted,
}

impl IntoResponse for RefreshResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted => StatusCode::ACCEPTED.into_response(),
        }
    }
}

/// `GET /api/report`
pub async fn get(State(state): State<AppState>) -> Result<GetResponse, ApiError> {
    let report = state.control.report().await?;
    Ok(GetResponse::Ok(Json(report)))
}

/// `POST /api/refresh`
pub async fn refresh(State(state): State<AppState>) -> RefreshResponse {
    tracing::debug!("refresh requested over http");
    state.control.refresh();
    RefreshResponse::Accepted
}
