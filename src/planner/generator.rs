/// Plan generation against the reasoning service
///
/// Builds the planner instruction from the catalog and the user prompt, calls
/// the injected client with bounded exponential backoff for transient
/// failures, and extracts an untrusted `PlanResponse` from the reply. Semantic
/// checking is the validator's job, not this module's.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::catalog::types::ActionCatalogEntry;
use crate::error::WorkflowError;
use crate::planner::client::{ClientError, CompletionRequest, ReasoningClient};
use crate::planner::extract::extract_json;
use crate::planner::types::PlanResponse;

/// Tunables for plan generation
#[derive(Debug, Clone)]
pub struct PlanGeneratorConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Total attempts, including the first (not a retry count)
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per subsequent retry
    pub base_delay: Duration,
}

impl Default for PlanGeneratorConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-5-sonnet-20241022".to_string(),
            max_tokens: 4000,
            temperature: 0.1,
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Issues planning requests and parses structured plans from the replies
pub struct PlanGenerator {
    client: Arc<dyn ReasoningClient>,
    config: PlanGeneratorConfig,
}

impl PlanGenerator {
    pub fn new(client: Arc<dyn ReasoningClient>, config: PlanGeneratorConfig) -> Self {
        Self { client, config }
    }

    /// Generate an untrusted plan for the prompt using only the given actions
    ///
    /// Retries only rate-limit and server-side failure classes, with the base
    /// delay doubling between attempts up to the attempt cap. Cancellation is
    /// honored during both the outbound call and the backoff wait and
    /// surfaces as `Cancelled`, distinct from `Planning`.
    pub async fn generate_plan(
        &self,
        prompt: &str,
        available_actions: &[ActionCatalogEntry],
        cancel: &CancellationToken,
    ) -> Result<PlanResponse, WorkflowError> {
        let instruction = self.build_instruction(prompt, available_actions)?;
        let mut delay = self.config.base_delay;

        for attempt in 1..=self.config.max_attempts {
            tracing::debug!(attempt, "Requesting workflow plan");

            let request = CompletionRequest {
                prompt: instruction.clone(),
                system: None,
                model: self.config.model.clone(),
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            };

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WorkflowError::Cancelled),
                result = self.client.complete(request) => result,
            };

            match result {
                Ok(text) => return self.parse_plan(&text),
                Err(e) if e.is_retriable() && attempt < self.config.max_attempts => {
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Transient planning failure, backing off: {e}"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(WorkflowError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    delay *= 2;
                }
                Err(e) => {
                    tracing::error!(attempt, "Planning request failed: {e}");
                    return Err(WorkflowError::Planning(e.to_string()));
                }
            }
        }

        // max_attempts >= 1, so the loop always returns before reaching here
        Err(WorkflowError::Planning("attempt cap exhausted".into()))
    }

    /// Build the planner instruction embedding the full catalog
    fn build_instruction(
        &self,
        prompt: &str,
        available_actions: &[ActionCatalogEntry],
    ) -> Result<String, WorkflowError> {
        let actions_json = serde_json::to_string_pretty(available_actions)?;

        Ok(format!(
            r#"You are a strict workflow planner. You MUST follow these rules exactly:

CRITICAL RULES:
1. You can ONLY use actions from the provided list below
2. You MUST NOT create workflows if the required actions/services are NOT in the available list
3. Every step MUST have an "actionKey" that exists in the available actions
4. The first step MUST be a trigger
5. Return ONLY valid JSON - no explanations, no additional text

AVAILABLE ACTIONS (you can ONLY use these):
{actions_json}

USER REQUEST: {prompt}

Return this exact JSON format:
{{
    "workflowName": "string (descriptive name)",
    "description": "string (what this workflow does)",
    "steps": [
        {{
            "stepId": "step_1",
            "type": "trigger|action",
            "actionKey": "EXACT_KEY_FROM_AVAILABLE_ACTIONS",
            "description": "string (what this step does)",
            "dependsOn": ["previous_step_ids"]
        }}
    ]
}}

RETURN ONLY THE JSON OBJECT - NO OTHER TEXT."#
        ))
    }

    /// Extract and deserialize a plan from raw model text
    fn parse_plan(&self, text: &str) -> Result<PlanResponse, WorkflowError> {
        let (strategy, value) = extract_json(text)
            .ok_or_else(|| WorkflowError::Planning("no parseable plan".into()))?;

        tracing::debug!("Parsed plan using {} strategy", strategy.name());

        // PlanStep fields are lenient, so this only fails on structural
        // mismatches like steps not being an array
        serde_json::from_value(value)
            .map_err(|e| WorkflowError::Planning(format!("no parseable plan: {e}")))
    }
}
