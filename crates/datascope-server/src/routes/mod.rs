//! HTTP route handlers.

pub mod privacy;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use datascope_core::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::state::AppState;

/// Error body returned by every handler: `{"error": "..."}`.
pub type ApiError = (StatusCode, Json<serde_json::Value>);

pub fn error_response(err: Error) -> ApiError {
    let status = match &err {
        e if e.is_invalid_input() => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Request failed: {}", err);
    }
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .merge(privacy::routes())
}

/// GET /api/health — liveness plus store row counts.
async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (namespaces, modules, records) = state.store.counts().map_err(error_response)?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "namespaces": namespaces,
        "modules": modules,
        "records": records,
    })))
}
