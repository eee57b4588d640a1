/// SQLite persistence layer for workflows and their steps
///
/// Materializing a validated plan is atomic: the workflow row and all step
/// rows are written inside one transaction, so a partially-created workflow is
/// never observable. Deletion is gated on the workflow being inactive.

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::{ValidationCode, WorkflowError};
use crate::planner::validator::ValidatedPlan;
use crate::workflow::types::{Workflow, WorkflowStep, WorkflowSummary, WorkflowWithSteps};

/// SQLite-based workflow store
#[derive(Debug, Clone)]
pub struct WorkflowStorage {
    pool: SqlitePool,
}

impl WorkflowStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the workflow tables
    ///
    /// Safe to call multiple times (uses IF NOT EXISTS).
    pub async fn init_schema(&self) -> Result<(), WorkflowError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workflows (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workflow_steps (
                id TEXT PRIMARY KEY,
                workflow_id TEXT NOT NULL REFERENCES workflows(id),
                action_key TEXT NOT NULL,
                connector_key TEXT NOT NULL,
                step_order INTEGER NOT NULL,
                external_id TEXT NOT NULL,
                depends_on JSON NOT NULL,
                description TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_workflow_steps_workflow
            ON workflow_steps(workflow_id, step_order)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Materialize a validated plan as workflow + step rows, atomically
    ///
    /// Steps get dense 1-based step_order matching the plan's order. Workflows
    /// start inactive. Either everything is created, or nothing is.
    pub async fn create_workflow_with_steps(
        &self,
        plan: &ValidatedPlan,
    ) -> Result<WorkflowWithSteps, WorkflowError> {
        let workflow_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO workflows (id, name, description, is_active, created_at, updated_at)
            VALUES (?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&workflow_id)
        .bind(&plan.workflow_name)
        .bind(&plan.description)
        .bind(&now_str)
        .bind(&now_str)
        .execute(&mut *tx)
        .await?;

        let mut steps = Vec::with_capacity(plan.steps.len());
        for (i, step) in plan.steps.iter().enumerate() {
            let step_row = WorkflowStep {
                id: Uuid::new_v4().to_string(),
                workflow_id: workflow_id.clone(),
                action_key: step.action_key.clone(),
                connector_key: step.connector_key.clone(),
                step_order: i as i64 + 1,
                external_id: step.step_id.clone(),
                depends_on: step.depends_on.clone(),
                description: step.description.clone(),
            };

            sqlx::query(
                r#"
                INSERT INTO workflow_steps
                    (id, workflow_id, action_key, connector_key,
                     step_order, external_id, depends_on, description)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&step_row.id)
            .bind(&step_row.workflow_id)
            .bind(&step_row.action_key)
            .bind(&step_row.connector_key)
            .bind(step_row.step_order)
            .bind(&step_row.external_id)
            .bind(serde_json::to_string(&step_row.depends_on)?)
            .bind(&step_row.description)
            .execute(&mut *tx)
            .await?;

            steps.push(step_row);
        }

        tx.commit().await?;

        tracing::info!(
            workflow_id = %workflow_id,
            steps = steps.len(),
            "Persisted workflow '{}'",
            plan.workflow_name
        );

        Ok(WorkflowWithSteps {
            workflow: Workflow {
                id: workflow_id,
                name: plan.workflow_name.clone(),
                description: plan.description.clone(),
                is_active: false,
                created_at: now,
                updated_at: now,
            },
            steps,
        })
    }

    /// Fetch a workflow with its steps in step order
    pub async fn get_workflow(&self, id: &str) -> Result<Option<WorkflowWithSteps>, WorkflowError> {
        let row = sqlx::query(
            "SELECT id, name, description, is_active, created_at, updated_at FROM workflows WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let workflow = Self::workflow_from_row(&row)?;

        let step_rows = sqlx::query(
            r#"
            SELECT id, workflow_id, action_key, connector_key,
                   step_order, external_id, depends_on, description
            FROM workflow_steps
            WHERE workflow_id = ?
            ORDER BY step_order ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let mut steps = Vec::with_capacity(step_rows.len());
        for row in step_rows {
            let depends_on: String = row.get("depends_on");
            steps.push(WorkflowStep {
                id: row.get("id"),
                workflow_id: row.get("workflow_id"),
                action_key: row.get("action_key"),
                connector_key: row.get("connector_key"),
                step_order: row.get("step_order"),
                external_id: row.get("external_id"),
                depends_on: serde_json::from_str(&depends_on)?,
                description: row.get("description"),
            });
        }

        Ok(Some(WorkflowWithSteps { workflow, steps }))
    }

    /// List workflows, newest first, with step counts
    pub async fn list_workflows(&self) -> Result<Vec<WorkflowSummary>, WorkflowError> {
        let rows = sqlx::query(
            r#"
            SELECT w.id, w.name, w.description, w.is_active, w.created_at, w.updated_at,
                   (SELECT COUNT(*) FROM workflow_steps s WHERE s.workflow_id = w.id) AS step_count
            FROM workflows w
            ORDER BY w.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            summaries.push(WorkflowSummary {
                id: row.get("id"),
                name: row.get("name"),
                description: row.get("description"),
                is_active: row.get::<i64, _>("is_active") != 0,
                step_count: row.get("step_count"),
                created_at: Self::parse_timestamp(&row.get::<String, _>("created_at"))?,
                updated_at: Self::parse_timestamp(&row.get::<String, _>("updated_at"))?,
            });
        }
        Ok(summaries)
    }

    /// Flip the activation gate
    pub async fn set_active(&self, id: &str, active: bool) -> Result<Workflow, WorkflowError> {
        let result = sqlx::query("UPDATE workflows SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(active as i64)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(WorkflowError::NotFound(format!("Workflow not found: {id}")));
        }

        let row = sqlx::query(
            "SELECT id, name, description, is_active, created_at, updated_at FROM workflows WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Self::workflow_from_row(&row)
    }

    /// Delete a workflow and its steps, refusing while it is active
    ///
    /// An active workflow must be deactivated first; on refusal no step rows
    /// are touched.
    pub async fn delete_if_inactive(&self, id: &str) -> Result<(), WorkflowError> {
        let row = sqlx::query("SELECT is_active FROM workflows WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("Workflow not found: {id}")))?;

        if row.get::<i64, _>("is_active") != 0 {
            return Err(WorkflowError::validation(
                ValidationCode::WorkflowActive,
                "Cannot delete active workflow. Deactivate first.",
            ));
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM workflow_steps WHERE workflow_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM workflows WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(workflow_id = %id, "Deleted workflow");
        Ok(())
    }

    fn workflow_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Workflow, WorkflowError> {
        Ok(Workflow {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            is_active: row.get::<i64, _>("is_active") != 0,
            created_at: Self::parse_timestamp(&row.get::<String, _>("created_at"))?,
            updated_at: Self::parse_timestamp(&row.get::<String, _>("updated_at"))?,
        })
    }

    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, WorkflowError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| WorkflowError::Corrupt(format!("timestamp '{s}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed::builtin_actions;
    use crate::planner::types::{PlanResponse, PlanStep};
    use crate::planner::validator::validate_plan;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn storage() -> WorkflowStorage {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let storage = WorkflowStorage::new(pool);
        storage.init_schema().await.unwrap();
        storage
    }

    fn fulfillment_plan() -> crate::planner::validator::ValidatedPlan {
        let plan = PlanResponse {
            workflow_name: "Order fulfillment".into(),
            description: "Verify payment and fulfill".into(),
            steps: vec![
                PlanStep {
                    step_id: "step_1".into(),
                    step_type: "trigger".into(),
                    action_key: "shopify.order_paid".into(),
                    description: "order paid".into(),
                    depends_on: vec![],
                },
                PlanStep {
                    step_id: "step_2".into(),
                    step_type: "action".into(),
                    action_key: "stripe.verify_payment".into(),
                    description: "verify payment".into(),
                    depends_on: vec!["step_1".into()],
                },
                PlanStep {
                    step_id: "step_3".into(),
                    step_type: "action".into(),
                    action_key: "shopify.fulfill_order".into(),
                    description: "fulfill order".into(),
                    depends_on: vec!["step_2".into()],
                },
            ],
        };
        validate_plan(&plan, &builtin_actions()).unwrap()
    }

    #[tokio::test]
    async fn plan_persists_with_dense_step_order() {
        let storage = storage().await;
        let created = storage
            .create_workflow_with_steps(&fulfillment_plan())
            .await
            .unwrap();

        assert!(!created.workflow.is_active);
        assert_eq!(created.steps.len(), 3);
        let orders: Vec<i64> = created.steps.iter().map(|s| s.step_order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(created.steps[1].external_id, "step_2");
        assert_eq!(created.steps[1].connector_key, "stripe");

        let fetched = storage
            .get_workflow(&created.workflow.id)
            .await
            .unwrap()
            .expect("persisted workflow");
        assert_eq!(fetched.steps.len(), 3);
        assert_eq!(fetched.steps[2].depends_on, vec!["step_2"]);
    }

    #[tokio::test]
    async fn active_workflow_cannot_be_deleted() {
        let storage = storage().await;
        let created = storage
            .create_workflow_with_steps(&fulfillment_plan())
            .await
            .unwrap();
        let id = created.workflow.id.clone();

        storage.set_active(&id, true).await.unwrap();

        let err = storage.delete_if_inactive(&id).await.unwrap_err();
        assert_eq!(err.code(), "WORKFLOW_ACTIVE");

        // Steps must be untouched by the refused delete
        let fetched = storage.get_workflow(&id).await.unwrap().unwrap();
        assert_eq!(fetched.steps.len(), 3);

        storage.set_active(&id, false).await.unwrap();
        storage.delete_if_inactive(&id).await.unwrap();
        assert!(storage.get_workflow(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn listing_includes_step_counts() {
        let storage = storage().await;
        storage
            .create_workflow_with_steps(&fulfillment_plan())
            .await
            .unwrap();

        let list = storage.list_workflows().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].step_count, 3);
        assert!(!list[0].is_active);
    }

    #[tokio::test]
    async fn corrupt_timestamp_is_not_reported_as_missing() {
        let storage = storage().await;
        let created = storage
            .create_workflow_with_steps(&fulfillment_plan())
            .await
            .unwrap();
        let id = created.workflow.id.clone();

        sqlx::query("UPDATE workflows SET created_at = 'yesterday-ish' WHERE id = ?")
            .bind(&id)
            .execute(&storage.pool)
            .await
            .unwrap();

        let err = storage.get_workflow(&id).await.unwrap_err();
        assert_eq!(err.code(), "CORRUPT_DATA");

        let err = storage.list_workflows().await.unwrap_err();
        assert_eq!(err.code(), "CORRUPT_DATA");
    }

    #[tokio::test]
    async fn missing_workflow_is_not_found() {
        let storage = storage().await;
        assert!(storage.get_workflow("nope").await.unwrap().is_none());
        assert_eq!(
            storage.set_active("nope", true).await.unwrap_err().code(),
            "NOT_FOUND"
        );
        assert_eq!(
            storage.delete_if_inactive("nope").await.unwrap_err().code(),
            "NOT_FOUND"
        );
    }
}
