/// Persisted workflow type definitions
///
/// A workflow and its steps are created together from a validated plan and
/// read back for display and execution. Step order is 1-based, dense, and
/// matches the plan's generation order - not necessarily dependency order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored automation workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Execution eligibility gate; workflows are created inactive
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One stored step of a workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub id: String,
    pub workflow_id: String,
    /// Catalog action this step runs
    pub action_key: String,
    /// Owning connector, denormalized for fast lookup
    pub connector_key: String,
    /// 1-based position matching plan generation order
    pub step_order: i64,
    /// Planner-assigned symbolic id (e.g. "step_1")
    pub external_id: String,
    /// External ids of steps this one depends on, within the same workflow
    pub depends_on: Vec<String>,
    pub description: String,
}

/// A workflow with its steps in step order
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowWithSteps {
    #[serde(flatten)]
    pub workflow: Workflow,
    pub steps: Vec<WorkflowStep>,
}

/// Listing row without the step payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub step_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
