/// Schema-gated workflow execution engine
///
/// Steps run in topological order over their dependency graph, not raw step
/// order, and a cyclic graph is rejected before anything executes. Each
/// action step moves through pending -> validating-input -> executing ->
/// validating-output -> completed, with failed reachable from any non-terminal
/// state. Contract checks use the catalog's pre-compiled schemas; a step whose
/// input does not conform never reaches its executor.

use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::catalog::registry::CatalogRegistry;
use crate::catalog::types::ActionType;
use crate::error::{ValidationCode, WorkflowError};
use crate::planner::validator::find_cycle;
use crate::runtime::executors::ExecutorRegistry;
use crate::workflow::types::{WorkflowStep, WorkflowWithSteps};

/// What to do when an action step has no registered executor
///
/// Some catalog entries are planning-only stubs, so skipping is the default;
/// deployments that require every action to be executable can fail loudly
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingExecutorPolicy {
    #[default]
    Skip,
    Fail,
}

/// Engine tunables
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub missing_executor: MissingExecutorPolicy,
}

/// Terminal state of one step in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Skipped,
    Failed,
}

/// Error surfaced for a failed step
#[derive(Debug, Clone, Serialize)]
pub struct StepError {
    /// Stable code: INPUT_CONTRACT_VIOLATION, EXECUTOR_ERROR,
    /// OUTPUT_CONTRACT_VIOLATION, EXECUTOR_NOT_REGISTERED
    pub code: &'static str,
    pub message: String,
}

/// Per-step result of a workflow run, in execution order
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub external_id: String,
    pub action_key: String,
    pub step_order: i64,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StepError>,
    /// Why a step was skipped, when it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StepOutcome {
    fn skipped(step: &WorkflowStep, detail: &str) -> Self {
        Self {
            external_id: step.external_id.clone(),
            action_key: step.action_key.clone(),
            step_order: step.step_order,
            status: StepStatus::Skipped,
            output: None,
            error: None,
            detail: Some(detail.to_string()),
        }
    }

    fn failed(step: &WorkflowStep, code: &'static str, message: String) -> Self {
        Self {
            external_id: step.external_id.clone(),
            action_key: step.action_key.clone(),
            step_order: step.step_order,
            status: StepStatus::Failed,
            output: None,
            error: Some(StepError { code, message }),
            detail: None,
        }
    }

    fn completed(step: &WorkflowStep, output: Value) -> Self {
        Self {
            external_id: step.external_id.clone(),
            action_key: step.action_key.clone(),
            step_order: step.step_order,
            status: StepStatus::Completed,
            output: Some(output),
            error: None,
            detail: None,
        }
    }
}

/// Executes stored workflows with synthetic example inputs
pub struct ExecutionEngine {
    catalog: Arc<CatalogRegistry>,
    executors: ExecutorRegistry,
    config: EngineConfig,
}

impl ExecutionEngine {
    pub fn new(
        catalog: Arc<CatalogRegistry>,
        executors: ExecutorRegistry,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog,
            executors,
            config,
        }
    }

    /// Run every step of a workflow, returning per-step outcomes
    ///
    /// Execution is sequential; a step whose (transitive) dependency failed is
    /// skipped, other steps keep running - there is no rollback and no
    /// engine-level retry.
    pub async fn execute(
        &self,
        workflow: &WorkflowWithSteps,
    ) -> Result<Vec<StepOutcome>, WorkflowError> {
        tracing::info!(
            workflow_id = %workflow.workflow.id,
            steps = workflow.steps.len(),
            "Starting workflow execution"
        );

        let order = self.execution_order(&workflow.steps)?;

        let mut outcomes = Vec::with_capacity(order.len());
        // External ids of steps that failed or were skipped because of one
        let mut poisoned: HashSet<&str> = HashSet::new();

        for step in order {
            let blocked = step
                .depends_on
                .iter()
                .any(|dep| poisoned.contains(dep.as_str()));
            if blocked {
                tracing::warn!(step = %step.external_id, "Skipping step: upstream failure");
                poisoned.insert(step.external_id.as_str());
                outcomes.push(StepOutcome::skipped(step, "upstream dependency failed"));
                continue;
            }

            let outcome = self.execute_step(step).await?;
            if outcome.status == StepStatus::Failed {
                poisoned.insert(step.external_id.as_str());
            }
            outcomes.push(outcome);
        }

        let failed = outcomes
            .iter()
            .filter(|o| o.status == StepStatus::Failed)
            .count();
        tracing::info!(
            workflow_id = %workflow.workflow.id,
            completed = outcomes.iter().filter(|o| o.status == StepStatus::Completed).count(),
            failed,
            "Workflow execution finished"
        );

        Ok(outcomes)
    }

    /// Run one step through the contract-gated state machine
    async fn execute_step(&self, step: &WorkflowStep) -> Result<StepOutcome, WorkflowError> {
        let action = self.catalog.lookup(&step.action_key).ok_or_else(|| {
            WorkflowError::NotFound(format!("Action not found in catalog: {}", step.action_key))
        })?;

        // Trigger steps start workflows; they are recorded, not executed
        if action.entry.action_type == ActionType::Trigger {
            tracing::debug!(step = %step.external_id, "Recording trigger step");
            return Ok(StepOutcome::skipped(step, "trigger steps are not executed"));
        }

        let Some(registered) = self.executors.lookup(&step.action_key) else {
            return Ok(match self.config.missing_executor {
                MissingExecutorPolicy::Skip => {
                    tracing::debug!(step = %step.external_id, "No executor registered, skipping");
                    StepOutcome::skipped(step, "no executor registered")
                }
                MissingExecutorPolicy::Fail => StepOutcome::failed(
                    step,
                    "EXECUTOR_NOT_REGISTERED",
                    format!("no executor registered for '{}'", step.action_key),
                ),
            });
        };

        // validating-input
        tracing::debug!(step = %step.external_id, "Validating step input");
        let Some(input_contract) = &action.input_contract else {
            return Ok(StepOutcome::failed(
                step,
                "INPUT_CONTRACT_VIOLATION",
                format!("action '{}' has no input contract", step.action_key),
            ));
        };
        let input_check = input_contract.check(&registered.example_input);
        if !input_check.ok {
            return Ok(StepOutcome::failed(
                step,
                "INPUT_CONTRACT_VIOLATION",
                input_check.summary(),
            ));
        }

        // executing
        tracing::debug!(step = %step.external_id, action = %step.action_key, "Invoking executor");
        let output = match registered.executor.run(&registered.example_input).await {
            Ok(output) => output,
            Err(e) => {
                return Ok(StepOutcome::failed(step, "EXECUTOR_ERROR", e.to_string()));
            }
        };

        // validating-output
        if let Some(output_contract) = &action.output_contract {
            let output_check = output_contract.check(&output);
            if !output_check.ok {
                return Ok(StepOutcome::failed(
                    step,
                    "OUTPUT_CONTRACT_VIOLATION",
                    output_check.summary(),
                ));
            }
        }

        tracing::debug!(step = %step.external_id, "Step completed");
        Ok(StepOutcome::completed(step, output))
    }

    /// Topological execution order over the dependency graph
    ///
    /// Ties (steps whose dependencies are all satisfied) resolve by
    /// step_order, so linear plans execute exactly in stored order. Cycles and
    /// dangling references are rejected before any step runs.
    fn execution_order<'a>(
        &self,
        steps: &'a [WorkflowStep],
    ) -> Result<Vec<&'a WorkflowStep>, WorkflowError> {
        let mut graph: DiGraph<&WorkflowStep, ()> = DiGraph::new();
        let mut index_by_id: HashMap<&str, NodeIndex> = HashMap::new();

        for step in steps {
            let index = graph.add_node(step);
            index_by_id.insert(step.external_id.as_str(), index);
        }
        for step in steps {
            let to = index_by_id[step.external_id.as_str()];
            for dep in &step.depends_on {
                let from = index_by_id.get(dep.as_str()).ok_or_else(|| {
                    WorkflowError::Validation {
                        code: ValidationCode::InvalidDependency,
                        message: format!(
                            "step '{}' depends on unknown step '{dep}'",
                            step.external_id
                        ),
                        details: None,
                    }
                })?;
                graph.add_edge(*from, to, ());
            }
        }

        // Kahn's algorithm with a step_order tie-break for determinism
        let mut in_degree: HashMap<NodeIndex, usize> = graph
            .node_indices()
            .map(|i| (i, graph.neighbors_directed(i, petgraph::Incoming).count()))
            .collect();
        let mut ready: Vec<NodeIndex> = in_degree
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(&i, _)| i)
            .collect();

        let mut order = Vec::with_capacity(steps.len());
        while !ready.is_empty() {
            ready.sort_by_key(|&i| graph[i].step_order);
            let next = ready.remove(0);
            order.push(graph[next]);

            for neighbor in graph.neighbors_directed(next, petgraph::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&neighbor) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(neighbor);
                    }
                }
            }
        }

        if order.len() != steps.len() {
            let nodes: Vec<(&str, &[String])> = steps
                .iter()
                .map(|s| (s.external_id.as_str(), s.depends_on.as_slice()))
                .collect();
            let cycle = find_cycle(&nodes).unwrap_or_default();
            return Err(WorkflowError::Validation {
                code: ValidationCode::DependencyCycle,
                message: format!("workflow dependency cycle: {}", cycle.join(" -> ")),
                details: Some(serde_json::json!({ "cycle": cycle })),
            });
        }

        Ok(order)
    }
}
