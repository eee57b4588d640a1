/// Untrusted plan types parsed from reasoning-service output
///
/// Deliberately lenient: missing fields default to empty values and the step
/// type stays a free string, so shape problems surface as validator reason
/// codes rather than parse failures. Nothing here is persisted as-is.

use serde::{Deserialize, Serialize};

/// A plan proposed by the reasoning service, not yet trusted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    #[serde(default)]
    pub workflow_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<PlanStep>,
}

/// One proposed step, referencing a catalog action by key
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    /// Planner-assigned symbolic id (e.g. "step_1")
    #[serde(default)]
    pub step_id: String,
    /// "trigger" or "action" as declared by the planner
    #[serde(default, rename = "type")]
    pub step_type: String,
    #[serde(default)]
    pub action_key: String,
    #[serde(default)]
    pub description: String,
    /// Step ids this step depends on; empty for the first step
    #[serde(default)]
    pub depends_on: Vec<String>,
}
