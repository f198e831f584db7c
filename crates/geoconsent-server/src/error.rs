//! HTTP rendering of gateway errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use geoconsent_core::Error;
use tracing::{error, warn};

/// Wrapper so core errors can be returned from axum handlers.
#[derive(Debug)]
pub struct AppError(pub Error);

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Origin(_) => {
                warn!("Origin fetch failed: {}", self.0);
                StatusCode::BAD_GATEWAY
            }
            other => {
                error!("Request failed: {}", other);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let reason = status.canonical_reason().unwrap_or("Error");
        (status, reason).into_response()
    }
}
