//! Router: every request goes through the interceptor.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::response::Response;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::intercept::intercept;
use crate::state::AppState;

/// Build the main Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(handle)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, AppError> {
    Ok(intercept(&state, request).await?)
}
