/// Workflow management REST API endpoints
///
/// Thin handlers over `WorkflowService`: generation from a prompt, listing,
/// activation, deletion, and synthetic runs. Error mapping to HTTP status
/// codes lives on `WorkflowError` itself, so every handler just propagates.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{
    catalog::storage::CatalogStorage,
    error::{ValidationCode, WorkflowError},
    workflow::{
        service::WorkflowService,
        types::{Workflow, WorkflowWithSteps},
    },
};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Orchestration service for the plan/validate/persist/execute pipeline
    pub service: Arc<WorkflowService>,
    /// Connector catalog persistence, used by the connector endpoints
    pub catalog_storage: CatalogStorage,
}

/// Request body for prompt-driven workflow generation
#[derive(Debug, Deserialize)]
pub struct GenerateWorkflowRequest {
    pub prompt: String,
}

/// Create workflow management routes
pub fn create_workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflows/generate", post(generate_workflow))
        .route("/api/workflows", get(list_workflows))
        .route("/api/workflows/{id}", get(get_workflow))
        .route("/api/workflows/{id}", delete(delete_workflow))
        .route("/api/workflows/{id}/activate", post(activate_workflow))
        .route("/api/workflows/{id}/deactivate", post(deactivate_workflow))
        .route("/api/workflows/{id}/run", post(run_workflow))
}

/// Generate and persist a workflow from a natural-language prompt
///
/// POST /api/workflows/generate
/// Body: { "prompt": "when a shopify order is paid, ..." }
async fn generate_workflow(
    State(state): State<AppState>,
    Json(payload): Json<GenerateWorkflowRequest>,
) -> Result<Json<WorkflowWithSteps>, WorkflowError> {
    if payload.prompt.trim().is_empty() {
        return Err(WorkflowError::validation(
            ValidationCode::MalformedResponse,
            "Prompt must not be empty",
        ));
    }

    // HTTP abort already works by axum dropping this future; the token is
    // the cancellation seam for non-HTTP callers of the service
    let cancel = CancellationToken::new();
    let created = state.service.create_from_prompt(&payload.prompt, &cancel).await?;
    Ok(Json(created))
}

/// List all workflows with step counts
///
/// GET /api/workflows
async fn list_workflows(State(state): State<AppState>) -> Result<Json<Value>, WorkflowError> {
    let workflows = state.service.get_all().await?;
    Ok(Json(json!({ "workflows": workflows })))
}

/// Get a specific workflow with its steps
///
/// GET /api/workflows/{id}
async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkflowWithSteps>, WorkflowError> {
    Ok(Json(state.service.get_one(&id).await?))
}

/// Delete an inactive workflow
///
/// DELETE /api/workflows/{id}
async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, WorkflowError> {
    state.service.delete_one(&id).await?;
    Ok(Json(json!({ "message": "Workflow deleted successfully" })))
}

/// POST /api/workflows/{id}/activate
async fn activate_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Workflow>, WorkflowError> {
    Ok(Json(state.service.change_status(&id, true).await?))
}

/// POST /api/workflows/{id}/deactivate
async fn deactivate_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Workflow>, WorkflowError> {
    Ok(Json(state.service.change_status(&id, false).await?))
}

/// Dry-run a workflow's steps with synthetic example inputs
///
/// POST /api/workflows/{id}/run
/// Returns: { "workflowId": "...", "results": [{ "externalId", "status", ... }] }
async fn run_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, WorkflowError> {
    let outcomes = state.service.run_synthetic(&id).await?;
    Ok(Json(json!({ "workflowId": id, "results": outcomes })))
}
