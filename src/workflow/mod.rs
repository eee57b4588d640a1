/// Workflow Management Layer
///
/// This module handles persisted workflows and the service facade over
/// planning, validation, persistence, and execution:
/// - Type definitions (Workflow, WorkflowStep)
/// - SQLite persistence with sqlx (atomic workflow + steps creation)
/// - The prompt-to-persisted-workflow service

// Persisted workflow type definitions
pub mod types;

// SQLite persistence layer for workflows and their steps
pub mod storage;

// Service facade: generate, validate, persist, execute
pub mod service;

// Re-export commonly used types
pub use service::WorkflowService;
pub use storage::WorkflowStorage;
pub use types::{Workflow, WorkflowStep, WorkflowSummary, WorkflowWithSteps};
