/// Error taxonomy for the planning and execution core
///
/// Every error that reaches the API boundary carries a stable machine-readable
/// code plus a human-readable message. Validation errors additionally carry the
/// offending data so callers can remediate (e.g. show the valid action keys).

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::{json, Value};
use thiserror::Error;

/// Reason codes for plan / input validation failures
///
/// These are the codes surfaced in API error bodies and step outcomes.
/// They are stable identifiers; renaming one is a breaking API change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    /// Plan response is missing workflowName/description or has no steps
    MalformedResponse,
    /// One or more step action keys do not resolve in the catalog
    InvalidActionKey,
    /// First step is not a trigger, or step ids are duplicated
    InvalidWorkflowStructure,
    /// A dependsOn entry references a step id not present in the plan
    InvalidDependency,
    /// The step dependency graph contains a cycle
    DependencyCycle,
    /// Attempted to delete a workflow while it is still active
    WorkflowActive,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::MalformedResponse => "MALFORMED_RESPONSE",
            ValidationCode::InvalidActionKey => "INVALID_ACTION_KEY",
            ValidationCode::InvalidWorkflowStructure => "INVALID_WORKFLOW_STRUCTURE",
            ValidationCode::InvalidDependency => "INVALID_DEPENDENCY",
            ValidationCode::DependencyCycle => "DEPENDENCY_CYCLE",
            ValidationCode::WorkflowActive => "WORKFLOW_ACTIVE",
        }
    }
}

/// Which side of an action contract was violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractSide {
    Input,
    Output,
}

impl ContractSide {
    pub fn code(&self) -> &'static str {
        match self {
            ContractSide::Input => "INPUT_CONTRACT_VIOLATION",
            ContractSide::Output => "OUTPUT_CONTRACT_VIOLATION",
        }
    }
}

/// Top-level error type for the planning and execution core
///
/// Propagation policy: validation and referential errors are never retried;
/// only transient reasoning-service failures are retried (by the Plan
/// Generator, up to its attempt cap). Nothing is swallowed silently except the
/// documented "no executor registered -> skip" policy in the engine.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Missing catalog entry, workflow, or connector
    #[error("{0}")]
    NotFound(String),

    /// Malformed or non-conforming plan / request data
    #[error("{message}")]
    Validation {
        code: ValidationCode,
        message: String,
        /// Offending data for caller remediation (invalid keys, cycle path, ...)
        details: Option<Value>,
    },

    /// Reasoning service unreachable or unparseable after exhausting retries
    #[error("planning failed: {0}")]
    Planning(String),

    /// The caller cancelled the planning request before it completed
    #[error("planning cancelled")]
    Cancelled,

    /// An action executor's own logic failed
    #[error("executor failed for '{action_key}': {message}")]
    Executor { action_key: String, message: String },

    /// Input or output did not conform to the action's contract
    #[error("{side:?} contract violation for '{action_key}': {message}")]
    Contract {
        side: ContractSide,
        action_key: String,
        message: String,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored data that should be well-formed failed to parse back
    #[error("corrupt stored data: {0}")]
    Corrupt(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WorkflowError {
    /// Convenience constructor for validation failures without details
    pub fn validation(code: ValidationCode, message: impl Into<String>) -> Self {
        WorkflowError::Validation {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::NotFound(_) => "NOT_FOUND",
            WorkflowError::Validation { code, .. } => code.as_str(),
            WorkflowError::Planning(_) => "PLANNING_ERROR",
            WorkflowError::Cancelled => "CANCELLED",
            WorkflowError::Executor { .. } => "EXECUTOR_ERROR",
            WorkflowError::Contract { side, .. } => side.code(),
            WorkflowError::Database(_) => "DATABASE_ERROR",
            WorkflowError::Corrupt(_) => "CORRUPT_DATA",
            WorkflowError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkflowError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            WorkflowError::Planning(_) => StatusCode::BAD_GATEWAY,
            WorkflowError::Cancelled => StatusCode::REQUEST_TIMEOUT,
            WorkflowError::Executor { .. } | WorkflowError::Contract { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            WorkflowError::Database(_)
            | WorkflowError::Corrupt(_)
            | WorkflowError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WorkflowError {
    /// Map core errors to JSON API error bodies
    ///
    /// Body shape: { "error": { "code": "...", "message": "...", "details": ... } }
    fn into_response(self) -> Response {
        let status = self.status();
        let details = match &self {
            WorkflowError::Validation { details, .. } => details.clone(),
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!("request failed: {} ({})", self, self.code());
        } else {
            tracing::warn!("request rejected: {} ({})", self, self.code());
        }

        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
                "details": details,
            }
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            WorkflowError::validation(ValidationCode::InvalidActionKey, "bad key").code(),
            "INVALID_ACTION_KEY"
        );
        assert_eq!(WorkflowError::NotFound("x".into()).code(), "NOT_FOUND");
        assert_eq!(WorkflowError::Cancelled.code(), "CANCELLED");
        assert_eq!(
            WorkflowError::Corrupt("timestamp 'x'".into()).code(),
            "CORRUPT_DATA"
        );
        assert_eq!(
            WorkflowError::Contract {
                side: ContractSide::Output,
                action_key: "stripe.verify_payment".into(),
                message: "missing field".into(),
            }
            .code(),
            "OUTPUT_CONTRACT_VIOLATION"
        );
    }

    #[test]
    fn validation_details_survive_into_response() {
        let err = WorkflowError::Validation {
            code: ValidationCode::InvalidActionKey,
            message: "invalid keys".into(),
            details: Some(json!({ "invalidKeys": ["acme.unknown_action"] })),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
