//! The validator pipeline: ordered, independently addressable validators.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;
use trellis_config::{WorkflowConfig, WorkflowDef};
use trellis_registry::ComponentRegistry;

use crate::finding::Finding;
use crate::result::ValidationResult;
use crate::validators::{
  CycleValidator, EdgeOrderValidator, ReferenceValidator, RetryPolicyValidator,
};

/// What a validator gets to look at.
pub struct ValidatorContext<'a> {
  pub config: &'a WorkflowConfig,
  pub registry: &'a ComponentRegistry,
  /// When set, workflow-scoped validators restrict themselves to this
  /// workflow.
  pub workflow_filter: Option<&'a str>,
}

impl ValidatorContext<'_> {
  /// The workflows under inspection, honoring the filter.
  pub fn workflows(&self) -> impl Iterator<Item = (&String, &WorkflowDef)> {
    self
      .config
      .workflows
      .iter()
      .filter(move |(name, _)| match self.workflow_filter {
        Some(filter) => name.as_str() == filter,
        None => true,
      })
  }
}

/// One static check over a configuration.
///
/// Priority determines execution order (lower runs earlier). A validator
/// declaring `fail_fast` stops the sweep when its own error output is
/// non-empty, unless the caller requested a full sweep.
pub trait ConfigValidator: Send + Sync {
  fn name(&self) -> &str;
  fn description(&self) -> &str;
  fn priority(&self) -> i32 {
    100
  }
  fn fail_fast(&self) -> bool {
    false
  }
  fn validate(&self, cx: &ValidatorContext<'_>) -> Vec<Finding>;
}

/// Priority-ordered validator registry.
pub struct ValidatorPipeline {
  validators: Vec<Arc<dyn ConfigValidator>>,
}

impl ValidatorPipeline {
  /// An empty pipeline. Most callers want [`Self::with_defaults`].
  pub fn new() -> Self {
    Self {
      validators: Vec::new(),
    }
  }

  /// The built-in validator set: references, retry policies, edge ordering,
  /// cycle detection.
  pub fn with_defaults() -> Self {
    let mut pipeline = Self::new();
    pipeline.register(Arc::new(ReferenceValidator));
    pipeline.register(Arc::new(RetryPolicyValidator));
    pipeline.register(Arc::new(EdgeOrderValidator));
    pipeline.register(Arc::new(CycleValidator));
    pipeline
  }

  /// Add a validator, keeping the set ordered by priority. Registration
  /// order breaks ties.
  pub fn register(&mut self, validator: Arc<dyn ConfigValidator>) {
    self.validators.push(validator);
    self.validators.sort_by_key(|v| v.priority());
  }

  /// Names of the registered validators, in execution order.
  pub fn validator_names(&self) -> Vec<String> {
    self.validators.iter().map(|v| v.name().to_string()).collect()
  }

  /// Run the pipeline, honoring `fail_fast` declarations.
  pub fn run(&self, config: &WorkflowConfig, registry: &ComponentRegistry) -> ValidationResult {
    self.run_inner(config, registry, None, false)
  }

  /// Run every validator regardless of `fail_fast` declarations.
  pub fn run_full_sweep(
    &self,
    config: &WorkflowConfig,
    registry: &ComponentRegistry,
  ) -> ValidationResult {
    self.run_inner(config, registry, None, true)
  }

  /// Run the pipeline restricted to a single workflow.
  pub fn run_workflow(
    &self,
    config: &WorkflowConfig,
    registry: &ComponentRegistry,
    workflow: &str,
  ) -> ValidationResult {
    self.run_inner(config, registry, Some(workflow), false)
  }

  fn run_inner(
    &self,
    config: &WorkflowConfig,
    registry: &ComponentRegistry,
    workflow_filter: Option<&str>,
    full_sweep: bool,
  ) -> ValidationResult {
    let started = Instant::now();
    let cx = ValidatorContext {
      config,
      registry,
      workflow_filter,
    };

    let mut result = ValidationResult::default();
    result.metadata.workflows_inspected = cx.workflows().count();

    for validator in &self.validators {
      let errors_before = result.errors.len();
      let findings = validator.validate(&cx);
      debug!(
        validator = validator.name(),
        findings = findings.len(),
        "validator finished"
      );
      result.absorb(findings);
      result.metadata.validators_run.push(validator.name().to_string());

      if !full_sweep && validator.fail_fast() && result.errors.len() > errors_before {
        debug!(validator = validator.name(), "fail-fast validator stopped the sweep");
        break;
      }
    }

    result.metadata.duration_ms = started.elapsed().as_millis() as u64;
    result
  }
}

impl Default for ValidatorPipeline {
  fn default() -> Self {
    Self::with_defaults()
  }
}
