/// Plan validation: where untrusted LLM output becomes trusted data
///
/// Checks run in ordered failure classes - shape, referential integrity, role
/// ordering, dependency well-formedness - short-circuiting between classes but
/// accumulating every violation within a class, so a caller sees the full set
/// of (say) invalid action keys in one pass. The output type `ValidatedPlan`
/// is the only thing the persistence layer accepts.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::json;

use crate::catalog::types::{ActionCatalogEntry, ActionType};
use crate::error::{ValidationCode, WorkflowError};
use crate::planner::types::PlanResponse;

/// A plan that has passed structural and referential checks
///
/// Only produced by [`validate_plan`]; persistence accepts nothing else, so no
/// code path can store an unvalidated plan by accident.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedPlan {
    pub workflow_name: String,
    pub description: String,
    pub steps: Vec<ValidatedStep>,
}

/// One validated step with its catalog resolution attached
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedStep {
    pub step_id: String,
    pub action_key: String,
    /// Authoritative type from the catalog, not the planner's claim
    pub action_type: ActionType,
    pub connector_key: String,
    pub description: String,
    pub depends_on: Vec<String>,
}

/// Validate an untrusted plan against the catalog
pub fn validate_plan(
    plan: &PlanResponse,
    catalog: &[ActionCatalogEntry],
) -> Result<ValidatedPlan, WorkflowError> {
    check_shape(plan)?;

    let by_key: HashMap<&str, &ActionCatalogEntry> =
        catalog.iter().map(|e| (e.key.as_str(), e)).collect();
    check_action_keys(plan, &by_key, catalog)?;
    check_structure(plan, &by_key)?;
    check_dependencies(plan)?;

    let steps = plan
        .steps
        .iter()
        .map(|step| {
            // Resolution cannot fail after check_action_keys
            let entry = by_key[step.action_key.as_str()];
            ValidatedStep {
                step_id: step.step_id.clone(),
                action_key: step.action_key.clone(),
                action_type: entry.action_type,
                connector_key: entry.connector_key.clone(),
                description: step.description.clone(),
                depends_on: step.depends_on.clone(),
            }
        })
        .collect();

    Ok(ValidatedPlan {
        workflow_name: plan.workflow_name.clone(),
        description: plan.description.clone(),
        steps,
    })
}

/// Class 1: required fields present and the step list non-empty
fn check_shape(plan: &PlanResponse) -> Result<(), WorkflowError> {
    let mut missing = Vec::new();
    if plan.workflow_name.trim().is_empty() {
        missing.push("workflowName");
    }
    if plan.description.trim().is_empty() {
        missing.push("description");
    }
    if plan.steps.is_empty() {
        missing.push("steps");
    }

    if missing.is_empty() {
        return Ok(());
    }
    Err(WorkflowError::Validation {
        code: ValidationCode::MalformedResponse,
        message: format!("plan response is missing: {}", missing.join(", ")),
        details: Some(json!({ "missing": missing })),
    })
}

/// Class 2: every action key must resolve in the catalog
fn check_action_keys(
    plan: &PlanResponse,
    by_key: &HashMap<&str, &ActionCatalogEntry>,
    catalog: &[ActionCatalogEntry],
) -> Result<(), WorkflowError> {
    let mut invalid = Vec::new();
    for step in &plan.steps {
        if !by_key.contains_key(step.action_key.as_str()) && !invalid.contains(&step.action_key) {
            invalid.push(step.action_key.clone());
        }
    }

    if invalid.is_empty() {
        return Ok(());
    }
    let valid: Vec<&str> = catalog.iter().map(|e| e.key.as_str()).collect();
    Err(WorkflowError::Validation {
        code: ValidationCode::InvalidActionKey,
        message: format!("invalid action keys: {}", invalid.join(", ")),
        details: Some(json!({ "invalidKeys": invalid, "validKeys": valid })),
    })
}

/// Class 3: first step is a trigger, step ids are unique and non-empty,
/// declared step types match the catalog
fn check_structure(
    plan: &PlanResponse,
    by_key: &HashMap<&str, &ActionCatalogEntry>,
) -> Result<(), WorkflowError> {
    let mut problems = Vec::new();

    let first = &plan.steps[0];
    if by_key[first.action_key.as_str()].action_type != ActionType::Trigger {
        problems.push(format!(
            "first step '{}' must be a trigger, got action '{}'",
            first.step_id, first.action_key
        ));
    }

    let mut seen = HashSet::new();
    for step in &plan.steps {
        if step.step_id.trim().is_empty() {
            problems.push("a step has an empty stepId".to_string());
        } else if !seen.insert(step.step_id.as_str()) {
            problems.push(format!("duplicate stepId '{}'", step.step_id));
        }

        let catalog_type = by_key[step.action_key.as_str()].action_type;
        if !step.step_type.is_empty() && ActionType::parse(&step.step_type) != Some(catalog_type) {
            problems.push(format!(
                "step '{}' declares type '{}' but '{}' is a {}",
                step.step_id,
                step.step_type,
                step.action_key,
                catalog_type.as_str()
            ));
        }
    }

    if problems.is_empty() {
        return Ok(());
    }
    Err(WorkflowError::Validation {
        code: ValidationCode::InvalidWorkflowStructure,
        message: problems.join("; "),
        details: Some(json!({ "problems": problems })),
    })
}

/// Class 4: dependencies resolve within the plan and form no cycle
fn check_dependencies(plan: &PlanResponse) -> Result<(), WorkflowError> {
    let ids: HashSet<&str> = plan.steps.iter().map(|s| s.step_id.as_str()).collect();

    let mut unknown = Vec::new();
    for step in &plan.steps {
        for dep in &step.depends_on {
            if !ids.contains(dep.as_str()) {
                unknown.push(json!({ "stepId": step.step_id, "reference": dep }));
            }
        }
    }
    if !unknown.is_empty() {
        return Err(WorkflowError::Validation {
            code: ValidationCode::InvalidDependency,
            message: format!("{} dependency reference(s) do not resolve", unknown.len()),
            details: Some(json!({ "unknownReferences": unknown })),
        });
    }

    let nodes: Vec<(&str, &[String])> = plan
        .steps
        .iter()
        .map(|s| (s.step_id.as_str(), s.depends_on.as_slice()))
        .collect();
    if let Some(cycle) = find_cycle(&nodes) {
        return Err(WorkflowError::Validation {
            code: ValidationCode::DependencyCycle,
            message: format!("dependency cycle: {}", cycle.join(" -> ")),
            details: Some(json!({ "cycle": cycle })),
        });
    }

    Ok(())
}

/// Find the first dependency cycle, as an ordered list of step ids
///
/// Depth-first traversal with a recursion-stack set; also used by the
/// execution engine to reject cyclic stored workflows before running them.
pub fn find_cycle(nodes: &[(&str, &[String])]) -> Option<Vec<String>> {
    let deps: HashMap<&str, &[String]> = nodes.iter().copied().collect();
    let mut visited = HashSet::new();
    let mut stack = Vec::new();
    let mut on_stack = HashSet::new();

    fn visit<'a>(
        id: &'a str,
        deps: &HashMap<&'a str, &'a [String]>,
        visited: &mut HashSet<&'a str>,
        stack: &mut Vec<&'a str>,
        on_stack: &mut HashSet<&'a str>,
    ) -> Option<Vec<String>> {
        if on_stack.contains(id) {
            let start = stack.iter().position(|&s| s == id).unwrap_or(0);
            let mut cycle: Vec<String> = stack[start..].iter().map(|s| s.to_string()).collect();
            cycle.push(id.to_string());
            return Some(cycle);
        }
        if !visited.insert(id) {
            return None;
        }

        stack.push(id);
        on_stack.insert(id);
        if let Some(targets) = deps.get(id) {
            for dep in targets.iter() {
                if deps.contains_key(dep.as_str()) {
                    if let Some(cycle) = visit(dep.as_str(), deps, visited, stack, on_stack) {
                        return Some(cycle);
                    }
                }
            }
        }
        stack.pop();
        on_stack.remove(id);
        None
    }

    for (id, _) in nodes {
        if let Some(cycle) = visit(id, &deps, &mut visited, &mut stack, &mut on_stack) {
            return Some(cycle);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed::builtin_actions;
    use crate::planner::types::PlanStep;

    fn step(step_id: &str, step_type: &str, action_key: &str, deps: &[&str]) -> PlanStep {
        PlanStep {
            step_id: step_id.into(),
            step_type: step_type.into(),
            action_key: action_key.into(),
            description: format!("run {action_key}"),
            depends_on: deps.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn fulfillment_plan() -> PlanResponse {
        PlanResponse {
            workflow_name: "Order fulfillment".into(),
            description: "Verify payment and fulfill the order".into(),
            steps: vec![
                step("step_1", "trigger", "shopify.order_paid", &[]),
                step("step_2", "action", "stripe.verify_payment", &["step_1"]),
                step("step_3", "action", "shopify.fulfill_order", &["step_2"]),
            ],
        }
    }

    #[test]
    fn valid_plan_passes_and_resolves_catalog_types() {
        let plan = validate_plan(&fulfillment_plan(), &builtin_actions()).unwrap();
        assert_eq!(plan.steps.len(), 3);
        assert_eq!(plan.steps[0].action_type, ActionType::Trigger);
        assert_eq!(plan.steps[1].action_type, ActionType::Action);
        assert_eq!(plan.steps[1].connector_key, "stripe");
        assert_eq!(plan.steps[2].depends_on, vec!["step_2"]);
    }

    #[test]
    fn empty_plan_is_malformed() {
        let plan = PlanResponse {
            workflow_name: String::new(),
            description: String::new(),
            steps: vec![],
        };
        let err = validate_plan(&plan, &builtin_actions()).unwrap_err();
        assert_eq!(err.code(), "MALFORMED_RESPONSE");
    }

    #[test]
    fn unknown_action_key_is_reported_with_both_key_sets() {
        let mut plan = fulfillment_plan();
        plan.steps[1].action_key = "acme.unknown_action".into();

        let err = validate_plan(&plan, &builtin_actions()).unwrap_err();
        assert_eq!(err.code(), "INVALID_ACTION_KEY");

        let WorkflowError::Validation { details, .. } = err else {
            panic!("expected validation error");
        };
        let details = details.unwrap();
        let invalid = details["invalidKeys"].as_array().unwrap();
        assert!(invalid.iter().any(|k| k == "acme.unknown_action"));
        let valid = details["validKeys"].as_array().unwrap();
        assert!(valid.iter().any(|k| k == "stripe.verify_payment"));
    }

    #[test]
    fn action_first_plan_is_structurally_invalid() {
        let plan = PlanResponse {
            workflow_name: "Broken".into(),
            description: "starts with an action".into(),
            steps: vec![
                step("step_1", "action", "stripe.verify_payment", &[]),
                step("step_2", "action", "shopify.fulfill_order", &["step_1"]),
            ],
        };
        let err = validate_plan(&plan, &builtin_actions()).unwrap_err();
        assert_eq!(err.code(), "INVALID_WORKFLOW_STRUCTURE");
    }

    #[test]
    fn duplicate_step_ids_are_structurally_invalid() {
        let mut plan = fulfillment_plan();
        plan.steps[2].step_id = "step_2".into();
        let err = validate_plan(&plan, &builtin_actions()).unwrap_err();
        assert_eq!(err.code(), "INVALID_WORKFLOW_STRUCTURE");
    }

    #[test]
    fn unresolvable_dependency_is_rejected() {
        let mut plan = fulfillment_plan();
        plan.steps[2].depends_on = vec!["step_9".into()];
        let err = validate_plan(&plan, &builtin_actions()).unwrap_err();
        assert_eq!(err.code(), "INVALID_DEPENDENCY");
    }

    #[test]
    fn dependency_cycle_is_rejected_with_the_cycle_path() {
        let mut plan = fulfillment_plan();
        plan.steps[1].depends_on = vec!["step_3".into()];
        plan.steps[2].depends_on = vec!["step_2".into()];

        let err = validate_plan(&plan, &builtin_actions()).unwrap_err();
        assert_eq!(err.code(), "DEPENDENCY_CYCLE");

        let WorkflowError::Validation { details, .. } = err else {
            panic!("expected validation error");
        };
        let cycle = details.unwrap()["cycle"].as_array().unwrap().len();
        assert!(cycle >= 2);
    }

    #[test]
    fn find_cycle_reports_members() {
        let deps_a: Vec<String> = vec!["b".into()];
        let deps_b: Vec<String> = vec!["a".into()];
        let nodes: Vec<(&str, &[String])> = vec![("a", &deps_a), ("b", &deps_b)];
        let cycle = find_cycle(&nodes).unwrap();
        assert!(cycle.contains(&"a".to_string()));
        assert!(cycle.contains(&"b".to_string()));
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let deps: Vec<String> = vec!["a".into()];
        let nodes: Vec<(&str, &[String])> = vec![("a", &deps)];
        assert!(find_cycle(&nodes).is_some());
    }

    #[test]
    fn acyclic_graph_has_no_cycle() {
        let deps_1: Vec<String> = vec![];
        let deps_2: Vec<String> = vec!["step_1".into()];
        let deps_3: Vec<String> = vec!["step_1".into(), "step_2".into()];
        let nodes: Vec<(&str, &[String])> = vec![
            ("step_1", &deps_1),
            ("step_2", &deps_2),
            ("step_3", &deps_3),
        ];
        assert!(find_cycle(&nodes).is_none());
    }
}
