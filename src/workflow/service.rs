/// Workflow orchestration service
///
/// Ties the pipeline together: prompt -> plan generation -> catalog validation
/// -> atomic persistence, plus lifecycle operations (activation, deletion) and
/// synthetic dry runs through the execution engine. HTTP handlers stay thin;
/// everything with semantics lives here.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::catalog::registry::CatalogRegistry;
use crate::error::WorkflowError;
use crate::planner::generator::PlanGenerator;
use crate::planner::validator::validate_plan;
use crate::runtime::engine::{ExecutionEngine, StepOutcome};
use crate::workflow::storage::WorkflowStorage;
use crate::workflow::types::{Workflow, WorkflowSummary, WorkflowWithSteps};

pub struct WorkflowService {
    catalog: Arc<CatalogRegistry>,
    generator: PlanGenerator,
    storage: WorkflowStorage,
    engine: ExecutionEngine,
}

impl WorkflowService {
    pub fn new(
        catalog: Arc<CatalogRegistry>,
        generator: PlanGenerator,
        storage: WorkflowStorage,
        engine: ExecutionEngine,
    ) -> Self {
        Self {
            catalog,
            generator,
            storage,
            engine,
        }
    }

    /// Generate, validate, and persist a workflow from a natural-language prompt
    ///
    /// The untrusted plan from the reasoning service never reaches storage
    /// directly; only the catalog-validated form is materialized. The new
    /// workflow starts inactive.
    pub async fn create_from_prompt(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<WorkflowWithSteps, WorkflowError> {
        let actions = self.catalog.entries();
        if actions.is_empty() {
            return Err(WorkflowError::NotFound(
                "No actions available in catalog".to_string(),
            ));
        }

        tracing::info!("Generating workflow plan from prompt ({} chars)", prompt.len());
        let plan = self.generator.generate_plan(prompt, &actions, cancel).await?;

        let validated = validate_plan(&plan, &actions)?;
        tracing::info!(
            steps = validated.steps.len(),
            "Plan '{}' validated against catalog",
            validated.workflow_name
        );

        self.storage.create_workflow_with_steps(&validated).await
    }

    /// Dry-run a stored workflow with synthetic example inputs
    pub async fn run_synthetic(&self, id: &str) -> Result<Vec<StepOutcome>, WorkflowError> {
        let workflow = self.require_workflow(id).await?;
        self.engine.execute(&workflow).await
    }

    pub async fn get_one(&self, id: &str) -> Result<WorkflowWithSteps, WorkflowError> {
        self.require_workflow(id).await
    }

    pub async fn get_all(&self) -> Result<Vec<WorkflowSummary>, WorkflowError> {
        self.storage.list_workflows().await
    }

    /// Activate or deactivate a workflow
    pub async fn change_status(&self, id: &str, active: bool) -> Result<Workflow, WorkflowError> {
        let workflow = self.storage.set_active(id, active).await?;
        tracing::info!(
            workflow_id = %id,
            active,
            "Changed workflow activation"
        );
        Ok(workflow)
    }

    /// Delete a workflow; refused with WORKFLOW_ACTIVE while it is active
    pub async fn delete_one(&self, id: &str) -> Result<(), WorkflowError> {
        self.storage.delete_if_inactive(id).await
    }

    async fn require_workflow(&self, id: &str) -> Result<WorkflowWithSteps, WorkflowError> {
        self.storage
            .get_workflow(id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("Workflow not found: {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed::builtin_actions;
    use crate::planner::client::{ClientError, CompletionRequest, ReasoningClient};
    use crate::planner::generator::PlanGeneratorConfig;
    use crate::runtime::engine::{EngineConfig, StepStatus};
    use crate::runtime::executors::ExecutorRegistry;
    use async_trait::async_trait;
    use sqlx::sqlite::SqlitePoolOptions;

    /// Always replies with the same text
    struct StaticClient(String);

    #[async_trait]
    impl ReasoningClient for StaticClient {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, ClientError> {
            Ok(self.0.clone())
        }
    }

    async fn service(reply: &str) -> WorkflowService {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let storage = WorkflowStorage::new(pool);
        storage.init_schema().await.unwrap();

        let catalog = Arc::new(CatalogRegistry::from_entries(builtin_actions()).unwrap());
        let generator = PlanGenerator::new(
            Arc::new(StaticClient(reply.to_string())),
            PlanGeneratorConfig::default(),
        );
        let engine = ExecutionEngine::new(
            Arc::clone(&catalog),
            ExecutorRegistry::builtin(),
            EngineConfig::default(),
        );
        WorkflowService::new(catalog, generator, storage, engine)
    }

    const GOOD_PLAN: &str = r#"
    Here is the plan you asked for:
    ```json
    {
      "workflowName": "Order fulfillment",
      "description": "Verify payment, then fulfill",
      "steps": [
        { "stepId": "step_1", "type": "trigger", "actionKey": "shopify.order_paid",
          "description": "order paid", "dependsOn": [] },
        { "stepId": "step_2", "type": "action", "actionKey": "stripe.verify_payment",
          "description": "verify payment", "dependsOn": ["step_1"] },
        { "stepId": "step_3", "type": "action", "actionKey": "shopify.fulfill_order",
          "description": "fulfill order", "dependsOn": ["step_2"] }
      ]
    }
    ```
    "#;

    #[tokio::test]
    async fn prompt_becomes_a_persisted_inactive_workflow() {
        let service = service(GOOD_PLAN).await;
        let cancel = CancellationToken::new();

        let created = service
            .create_from_prompt("fulfill paid shopify orders", &cancel)
            .await
            .unwrap();

        assert_eq!(created.workflow.name, "Order fulfillment");
        assert!(!created.workflow.is_active);
        assert_eq!(created.steps.len(), 3);

        let fetched = service.get_one(&created.workflow.id).await.unwrap();
        assert_eq!(fetched.steps[1].action_key, "stripe.verify_payment");
        assert_eq!(service.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_plan_is_rejected_and_nothing_persists() {
        let reply = r#"{
            "workflowName": "Bad",
            "description": "references a made-up action",
            "steps": [
                { "stepId": "step_1", "type": "trigger", "actionKey": "shopify.order_paid",
                  "description": "", "dependsOn": [] },
                { "stepId": "step_2", "type": "action", "actionKey": "acme.unknown_action",
                  "description": "", "dependsOn": ["step_1"] }
            ]
        }"#;
        let service = service(reply).await;
        let cancel = CancellationToken::new();

        let err = service
            .create_from_prompt("do something", &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_ACTION_KEY");
        assert!(service.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn synthetic_run_produces_per_step_outcomes() {
        let service = service(GOOD_PLAN).await;
        let cancel = CancellationToken::new();
        let created = service
            .create_from_prompt("fulfill paid shopify orders", &cancel)
            .await
            .unwrap();

        let outcomes = service.run_synthetic(&created.workflow.id).await.unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].status, StepStatus::Skipped);
        assert_eq!(outcomes[1].status, StepStatus::Completed);
        assert_eq!(outcomes[2].status, StepStatus::Completed);
    }

    #[tokio::test]
    async fn lifecycle_activation_gates_deletion() {
        let service = service(GOOD_PLAN).await;
        let cancel = CancellationToken::new();
        let created = service
            .create_from_prompt("fulfill paid shopify orders", &cancel)
            .await
            .unwrap();
        let id = created.workflow.id;

        let activated = service.change_status(&id, true).await.unwrap();
        assert!(activated.is_active);

        assert_eq!(
            service.delete_one(&id).await.unwrap_err().code(),
            "WORKFLOW_ACTIVE"
        );

        service.change_status(&id, false).await.unwrap();
        service.delete_one(&id).await.unwrap();
        assert_eq!(service.get_one(&id).await.unwrap_err().code(), "NOT_FOUND");
    }
}
