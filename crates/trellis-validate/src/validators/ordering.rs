//! Edge ordering: the unguarded fallback edge must be unique and last.

use serde_json::Value;
use trellis_config::EdgeDef;

use crate::finding::{Finding, FindingCode};
use crate::pipeline::{ConfigValidator, ValidatorContext};

/// For each source step: at most one unguarded edge, and if present it must
/// be the last edge declared for that step. A guarded edge declared after
/// the unguarded fallback can never be evaluated.
pub struct EdgeOrderValidator;

impl ConfigValidator for EdgeOrderValidator {
  fn name(&self) -> &str {
    "edge-ordering"
  }

  fn description(&self) -> &str {
    "Checks that each step has at most one unguarded edge and that it is declared last"
  }

  fn priority(&self) -> i32 {
    30
  }

  fn validate(&self, cx: &ValidatorContext<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (workflow_name, workflow) in cx.workflows() {
      for (step, edges) in group_by_source(&workflow.edges) {
        let unguarded: Vec<usize> = edges
          .iter()
          .enumerate()
          .filter(|(_, e)| e.is_unguarded())
          .map(|(i, _)| i)
          .collect();

        if unguarded.len() > 1 {
          findings.push(
            Finding::error(
              FindingCode::UnguardedEdgesMultiple,
              format!(
                "Step '{}' declares {} unguarded edges; only one fallback is allowed",
                step,
                unguarded.len()
              ),
            )
            .in_workflow(workflow_name)
            .at(format!("workflows.{}.edges", workflow_name))
            .detail("stepName", step)
            .detail(
              "unguardedEdges",
              rendered(unguarded.iter().map(|i| edges[*i])),
            ),
          );
        }

        for index in unguarded {
          let following_guarded: Vec<&EdgeDef> = edges[index + 1..]
            .iter()
            .filter(|e| !e.is_unguarded())
            .copied()
            .collect();
          if following_guarded.is_empty() {
            continue;
          }
          findings.push(
            Finding::error(
              FindingCode::UnguardedEdgeNotLast,
              format!(
                "Unguarded edge '{}' is not the last edge of step '{}'; the guarded edges after it are unreachable",
                edges[index].render(),
                step
              ),
            )
            .in_workflow(workflow_name)
            .at(format!("workflows.{}.edges", workflow_name))
            .detail("stepName", step)
            .detail("unguardedEdge", edges[index].render())
            .detail("violatingEdges", rendered(following_guarded.into_iter())),
          );
        }
      }
    }

    findings
  }
}

/// Group edges by source step, preserving first-seen order of sources and
/// declaration order inside each group.
fn group_by_source(edges: &[EdgeDef]) -> Vec<(&str, Vec<&EdgeDef>)> {
  let mut groups: Vec<(&str, Vec<&EdgeDef>)> = Vec::new();
  for edge in edges {
    match groups.iter_mut().find(|(from, _)| *from == edge.from) {
      Some((_, group)) => group.push(edge),
      None => groups.push((edge.from.as_str(), vec![edge])),
    }
  }
  groups
}

fn rendered<'a>(edges: impl Iterator<Item = &'a EdgeDef>) -> Value {
  Value::Array(edges.map(|e| Value::String(e.render())).collect())
}
