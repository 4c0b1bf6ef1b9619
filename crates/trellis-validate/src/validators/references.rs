//! Reference validity: every name in the configuration must resolve.

use trellis_config::{FailureStrategy, is_terminal};

use crate::finding::{Finding, FindingCode};
use crate::pipeline::{ConfigValidator, ValidatorContext};

/// Resolves every step type, guard name, edge endpoint, root, and
/// alternative target against the registry, the step map, and the terminal
/// set. Runs first and fail-fast: later validators assume names resolve.
pub struct ReferenceValidator;

impl ConfigValidator for ReferenceValidator {
  fn name(&self) -> &str {
    "reference-validity"
  }

  fn description(&self) -> &str {
    "Checks that every step type, guard name, edge endpoint and root resolves"
  }

  fn priority(&self) -> i32 {
    10
  }

  fn fail_fast(&self) -> bool {
    true
  }

  fn validate(&self, cx: &ValidatorContext<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();

    // Step declarations are config-global; check them regardless of any
    // workflow filter.
    for (name, step) in &cx.config.steps {
      if !cx.registry.has_step(&step.step_type) {
        findings.push(
          Finding::error(
            FindingCode::UnknownReference,
            format!(
              "Step '{}' names unknown implementation type '{}'",
              name, step.step_type
            ),
          )
          .at(format!("steps.{}.type", name))
          .detail("reference", step.step_type.as_str())
          .detail("kind", "step type"),
        );
      }
      for guard in &step.guards {
        check_guard(cx, guard, format!("steps.{}.guards", name), &mut findings);
      }
      if let Some(guard) = step.retry.as_ref().and_then(|r| r.guard.as_deref()) {
        check_guard(cx, guard, format!("steps.{}.retry.guard", name), &mut findings);
      }
    }

    for (workflow_name, workflow) in cx.workflows() {
      if !cx.config.steps.contains_key(&workflow.root) && !is_terminal(&workflow.root) {
        findings.push(
          Finding::error(
            FindingCode::UnknownReference,
            format!(
              "Workflow '{}' has unknown root step '{}'",
              workflow_name, workflow.root
            ),
          )
          .in_workflow(workflow_name)
          .at(format!("workflows.{}.root", workflow_name))
          .detail("reference", workflow.root.as_str())
          .detail("kind", "root"),
        );
      }

      for (index, edge) in workflow.edges.iter().enumerate() {
        let location = format!("workflows.{}.edges[{}]", workflow_name, index);

        for (endpoint, value) in [("from", &edge.from), ("to", &edge.to)] {
          if !cx.config.steps.contains_key(value) && !is_terminal(value) {
            findings.push(
              Finding::error(
                FindingCode::UnknownReference,
                format!(
                  "Edge '{}' references unknown step '{}' as '{}'",
                  edge.render(),
                  value,
                  endpoint
                ),
              )
              .in_workflow(workflow_name)
              .at(format!("{}.{}", location, endpoint))
              .detail("reference", value.as_str())
              .detail("kind", "edge endpoint"),
            );
          }
        }

        if let Some(guard) = edge.guard_name() {
          check_guard(cx, guard, format!("{}.guard", location), &mut findings);
        }

        if let Some(policy) = &edge.on_failure {
          if policy.strategy == FailureStrategy::Alternative {
            match policy.alternative_target.as_deref() {
              Some(target) if cx.config.steps.contains_key(target) || is_terminal(target) => {}
              Some(target) => findings.push(
                Finding::error(
                  FindingCode::UnknownReference,
                  format!(
                    "Edge '{}' has unknown alternative target '{}'",
                    edge.render(),
                    target
                  ),
                )
                .in_workflow(workflow_name)
                .at(format!("{}.onFailure.alternativeTarget", location))
                .detail("reference", target)
                .detail("kind", "alternative target"),
              ),
              None => findings.push(
                Finding::error(
                  FindingCode::UnknownReference,
                  format!(
                    "Edge '{}' uses the ALTERNATIVE strategy without an alternative target",
                    edge.render()
                  ),
                )
                .in_workflow(workflow_name)
                .at(format!("{}.onFailure.alternativeTarget", location))
                .detail("kind", "alternative target"),
              ),
            }
          }
        }
      }
    }

    findings
  }
}

/// A guard name resolves either through a step entry acting as an aliased
/// guard definition (its `type` must then exist in the guard registry) or
/// directly in the guard registry.
fn check_guard(
  cx: &ValidatorContext<'_>,
  guard: &str,
  location: String,
  findings: &mut Vec<Finding>,
) {
  let resolves = match cx.config.steps.get(guard) {
    Some(alias) => cx.registry.has_guard(&alias.step_type),
    None => cx.registry.has_guard(guard),
  };
  if !resolves {
    findings.push(
      Finding::error(
        FindingCode::UnknownReference,
        format!("Guard '{}' has no registered implementation", guard),
      )
      .at(location)
      .detail("reference", guard)
      .detail("kind", "guard"),
    );
  }
}
