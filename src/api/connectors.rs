/// Connector catalog REST API endpoints
///
/// Listing plus connect/disconnect state changes. Connection state is
/// advisory metadata for the UI; it does not gate planning or execution.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use crate::{api::workflows::AppState, catalog::types::Connector, error::WorkflowError};

/// Create connector catalog routes
pub fn create_connector_routes() -> Router<AppState> {
    Router::new()
        .route("/api/connectors", get(list_connectors))
        .route("/api/connectors/{key}/connect", post(connect_connector))
        .route("/api/connectors/{key}/disconnect", post(disconnect_connector))
}

/// List all connectors with their connection state
///
/// GET /api/connectors
async fn list_connectors(State(state): State<AppState>) -> Result<Json<Value>, WorkflowError> {
    let connectors = state.catalog_storage.list_connectors().await?;
    Ok(Json(json!({ "connectors": connectors })))
}

/// POST /api/connectors/{key}/connect
async fn connect_connector(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Connector>, WorkflowError> {
    Ok(Json(state.catalog_storage.connect_connector(&key).await?))
}

/// POST /api/connectors/{key}/disconnect
async fn disconnect_connector(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Connector>, WorkflowError> {
    Ok(Json(state.catalog_storage.disconnect_connector(&key).await?))
}
