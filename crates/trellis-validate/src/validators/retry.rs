//! Retry policy sanity.

use trellis_config::{Backoff, FailureStrategy};

use crate::finding::{Finding, FindingCode};
use crate::pipeline::{ConfigValidator, ValidatorContext};

/// Step retry policies need at least one attempt, and exponential backoff
/// needs a multiplier above 1 to actually grow. Edge RETRY policies need at
/// least one re-evaluation.
pub struct RetryPolicyValidator;

impl ConfigValidator for RetryPolicyValidator {
  fn name(&self) -> &str {
    "retry-policy"
  }

  fn description(&self) -> &str {
    "Checks retry attempt counts and backoff multipliers"
  }

  fn priority(&self) -> i32 {
    20
  }

  fn validate(&self, cx: &ValidatorContext<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (name, step) in &cx.config.steps {
      let Some(retry) = &step.retry else {
        continue;
      };
      if retry.max_attempts < 1 {
        findings.push(
          Finding::error(
            FindingCode::InvalidRetryPolicy,
            format!("Step '{}' declares retry with maxAttempts < 1", name),
          )
          .at(format!("steps.{}.retry.maxAttempts", name))
          .detail("maxAttempts", retry.max_attempts),
        );
      }
      if retry.backoff == Backoff::Exponential && retry.multiplier <= 1.0 {
        findings.push(
          Finding::error(
            FindingCode::InvalidRetryPolicy,
            format!(
              "Step '{}' uses exponential backoff with multiplier {} (must be > 1)",
              name, retry.multiplier
            ),
          )
          .at(format!("steps.{}.retry.multiplier", name))
          .detail("multiplier", retry.multiplier),
        );
      }
    }

    for (workflow_name, workflow) in cx.workflows() {
      for (index, edge) in workflow.edges.iter().enumerate() {
        let Some(policy) = &edge.on_failure else {
          continue;
        };
        if policy.strategy == FailureStrategy::Retry && policy.attempts < 1 {
          findings.push(
            Finding::error(
              FindingCode::InvalidRetryPolicy,
              format!(
                "Edge '{}' uses the RETRY strategy with zero attempts",
                edge.render()
              ),
            )
            .in_workflow(workflow_name)
            .at(format!("workflows.{}.edges[{}].onFailure.attempts", workflow_name, index)),
          );
        }
      }
    }

    findings
  }
}
