/// Planweave: Schema-gated workflow automation backend with LLM planning
///
/// This library turns natural-language automation requests into validated,
/// persisted workflows over a typed action catalog, and executes them through
/// JSON Schema contract gates with mock connector executors.

// Core configuration and setup
pub mod config;

// Error taxonomy shared across all layers
pub mod error;

// JSON Schema contract compilation and checking
pub mod schema;

// Connector and action catalog - seed data, persistence, compiled registry
pub mod catalog;

// Plan generation pipeline - reasoning client, extraction, validation
pub mod planner;

// Workflow management layer - persistence and orchestration service
pub mod workflow;

// Runtime execution engine - topological DAG execution with contract gates
pub mod runtime;

// HTTP API layer - REST endpoints for workflows and connectors
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use error::{ValidationCode, WorkflowError};
pub use planner::{validate_plan, PlanResponse, ValidatedPlan};
pub use runtime::{ExecutionEngine, StepOutcome};
pub use server::start_server;
pub use workflow::{Workflow, WorkflowService, WorkflowWithSteps};
