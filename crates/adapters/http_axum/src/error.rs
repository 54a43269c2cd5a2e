//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use heatkeeper_domain::error::HeatKeeperError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`HeatKeeperError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(HeatKeeperError);

impl From<HeatKeeperError> for ApiError {
    fn from(err: HeatKeeperError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            HeatKeeperError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            HeatKeeperError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            HeatKeeperError::Vendor(err) => {
                tracing::error!(error = %err, "vendor error");
                (StatusCode::BAD_GATEWAY, "vendor API error".to_string())
            }
            HeatKeeperError::Unavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, self.0.to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
