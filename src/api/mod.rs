/// HTTP API Layer
///
/// This module provides the REST API endpoints for the backend. It handles:
/// - Prompt-driven workflow generation and lifecycle management
/// - Synthetic workflow execution
/// - Connector catalog listing and connection state

// Workflow generation, lifecycle, and execution endpoints
pub mod workflows;

// Connector catalog endpoints
pub mod connectors;

// Re-export router builders and shared state
pub use connectors::create_connector_routes;
pub use workflows::{create_workflow_routes, AppState};
