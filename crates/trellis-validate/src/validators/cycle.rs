//! Cycle detection and reachability.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;
use trellis_config::{WorkflowDef, is_terminal};

use crate::finding::{Finding, FindingCode};
use crate::pipeline::{ConfigValidator, ValidatorContext};

/// Depth-first traversal from each workflow root, guards ignored.
///
/// A back edge to a node still on the traversal stack is a cycle; the
/// finding carries the ordered cycle path and the involved edges. Declared
/// steps no workflow reaches (and no guard position references) are
/// rejected: every declared step must be reachable from a root.
pub struct CycleValidator;

impl ConfigValidator for CycleValidator {
  fn name(&self) -> &str {
    "cycle-detection"
  }

  fn description(&self) -> &str {
    "Rejects workflow graphs with cycles reachable from the root; flags steps no workflow reaches"
  }

  fn priority(&self) -> i32 {
    40
  }

  fn validate(&self, cx: &ValidatorContext<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (workflow_name, workflow) in cx.workflows() {
      let mut state = HashMap::new();
      let mut path = Vec::new();
      visit(
        workflow,
        workflow_name,
        &workflow.root,
        &mut state,
        &mut path,
        &mut findings,
      );
    }

    findings.extend(unreachable_steps(cx));
    findings
  }
}

#[derive(Clone, Copy, PartialEq)]
enum VisitState {
  /// On the current traversal stack.
  Open,
  /// Fully explored.
  Closed,
}

fn visit<'a>(
  workflow: &'a WorkflowDef,
  workflow_name: &str,
  node: &'a str,
  state: &mut HashMap<&'a str, VisitState>,
  path: &mut Vec<&'a str>,
  findings: &mut Vec<Finding>,
) {
  if is_terminal(node) {
    return;
  }
  match state.get(node) {
    Some(VisitState::Open) => {
      findings.push(cycle_finding(workflow_name, node, path));
      return;
    }
    Some(VisitState::Closed) => return,
    None => {}
  }

  state.insert(node, VisitState::Open);
  path.push(node);
  for edge in workflow.edges_from(node) {
    visit(workflow, workflow_name, &edge.to, state, path, findings);
  }
  path.pop();
  state.insert(node, VisitState::Closed);
}

fn cycle_finding(workflow_name: &str, node: &str, path: &[&str]) -> Finding {
  let start = path.iter().position(|n| *n == node).unwrap_or(0);
  let mut cycle_path: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
  cycle_path.push(node.to_string());

  let involved_edges: Vec<String> = cycle_path
    .windows(2)
    .map(|pair| format!("{} → {}", pair[0], pair[1]))
    .collect();

  Finding::error(
    FindingCode::CycleDetected,
    format!(
      "Cycle detected in workflow '{}': {}",
      workflow_name,
      cycle_path.join(" → ")
    ),
  )
  .in_workflow(workflow_name)
  .at(format!("workflows.{}.edges", workflow_name))
  .detail(
    "cyclePath",
    Value::Array(cycle_path.into_iter().map(Value::String).collect()),
  )
  .detail(
    "involvedEdges",
    Value::Array(involved_edges.into_iter().map(Value::String).collect()),
  )
}

/// Steps unreachable from every workflow root are errors. Always computed
/// over the full workflow set so that single-workflow sweeps do not flag
/// steps owned by other workflows. Steps referenced from a guard position
/// are exempt; a step entry may legitimately exist only as an aliased guard
/// definition and is then never a traversal target.
fn unreachable_steps(cx: &ValidatorContext<'_>) -> Vec<Finding> {
  let mut reached: BTreeSet<&str> = BTreeSet::new();
  for workflow in cx.config.workflows.values() {
    let mut frontier = vec![workflow.root.as_str()];
    while let Some(node) = frontier.pop() {
      if is_terminal(node) || !reached.insert(node) {
        continue;
      }
      for edge in workflow.edges_from(node) {
        frontier.push(&edge.to);
      }
    }
  }

  let mut guard_aliases: BTreeSet<&str> = BTreeSet::new();
  for step in cx.config.steps.values() {
    guard_aliases.extend(step.guards.iter().map(String::as_str));
    if let Some(retry) = &step.retry {
      guard_aliases.extend(retry.guard.as_deref());
    }
  }
  for workflow in cx.config.workflows.values() {
    for edge in &workflow.edges {
      guard_aliases.extend(edge.guard_name());
    }
  }

  cx.config
    .steps
    .keys()
    .filter(|name| !reached.contains(name.as_str()) && !guard_aliases.contains(name.as_str()))
    .map(|name| {
      Finding::error(
        FindingCode::UnreachableStep,
        format!("Step '{}' is not reachable from any workflow root", name),
      )
      .at(format!("steps.{}", name))
      .detail("stepName", name.as_str())
    })
    .collect()
}
