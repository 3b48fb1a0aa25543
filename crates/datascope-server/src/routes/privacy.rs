//! Data privacy routes — sensitive-data listing and privacy-module catalog.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use datascope_privacy::{ModuleListRequest, PrivacyModuleSetPayload, SensitiveDataSetPayload};

use super::{error_response, ApiError};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/data-privacy/sensitive-data", get(sensitive_data_list))
        .route("/data-privacy/module", get(module_list))
}

// ---------------------------------------------------------------
// Query parsing
// ---------------------------------------------------------------

/// Raw query pairs; `connectionID` may repeat (also accepted as `connectionID[]`).
type QueryPairs = Vec<(String, String)>;

fn connection_ids(pairs: &QueryPairs) -> Vec<String> {
    pairs
        .iter()
        .filter(|(k, _)| k == "connectionID" || k == "connectionID[]")
        .map(|(_, v)| v.clone())
        .collect()
}

fn last_value(pairs: &QueryPairs, key: &str) -> Option<String> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

// ---------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------

/// GET /api/data-privacy/sensitive-data
async fn sensitive_data_list(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<SensitiveDataSetPayload>, ApiError> {
    let ids = connection_ids(&pairs);
    state
        .privacy
        .sensitive_data_list(ids.as_slice())
        .map(Json)
        .map_err(error_response)
}

/// GET /api/data-privacy/module
async fn module_list(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<PrivacyModuleSetPayload>, ApiError> {
    let req = ModuleListRequest {
        connection_id: connection_ids(&pairs),
        limit: last_value(&pairs, "limit"),
        page_cursor: last_value(&pairs, "pageCursor"),
        sort: last_value(&pairs, "sort"),
    };
    state
        .privacy
        .module_list(&req)
        .map(Json)
        .map_err(error_response)
}
