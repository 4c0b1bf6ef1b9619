//! The engine facade: validation plus execution over one shared config.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::instrument;
use trellis_component::ExecutionContext;
use trellis_config::WorkflowConfig;
use trellis_registry::ComponentRegistry;
use trellis_validate::{ValidationError, ValidationResult, ValidatorPipeline};

use crate::error::EngineError;
use crate::events::{ExecutionNotifier, NoopNotifier};
use crate::executor::WorkflowRun;
use crate::result::RunOutcome;

/// Owns a workflow configuration, a component registry, and a validator
/// pipeline; executes workflows against them.
///
/// All three are immutable after construction, so an `Engine` can be shared
/// behind an `Arc` and serve concurrent runs without locking. Each run gets
/// its own [`ExecutionContext`].
pub struct Engine {
  config: Arc<WorkflowConfig>,
  registry: Arc<ComponentRegistry>,
  pipeline: ValidatorPipeline,
}

impl Engine {
  /// Build an engine with the default validator pipeline.
  pub fn new(config: WorkflowConfig, registry: ComponentRegistry) -> Self {
    Self::with_pipeline(config, registry, ValidatorPipeline::with_defaults())
  }

  /// Build an engine with a custom validator pipeline, the extension point
  /// for project-specific validators.
  pub fn with_pipeline(
    config: WorkflowConfig,
    registry: ComponentRegistry,
    pipeline: ValidatorPipeline,
  ) -> Self {
    Self {
      config: Arc::new(config),
      registry: Arc::new(registry),
      pipeline,
    }
  }

  pub fn config(&self) -> &WorkflowConfig {
    &self.config
  }

  pub fn registry(&self) -> &ComponentRegistry {
    &self.registry
  }

  /// Run the validator pipeline over the whole configuration.
  pub fn validate(&self) -> ValidationResult {
    self.pipeline.run(&self.config, &self.registry)
  }

  /// Run every validator regardless of fail-fast declarations.
  pub fn validate_full_sweep(&self) -> ValidationResult {
    self.pipeline.run_full_sweep(&self.config, &self.registry)
  }

  /// Validate a single workflow.
  pub fn validate_workflow(&self, workflow: &str) -> ValidationResult {
    self.pipeline.run_workflow(&self.config, &self.registry, workflow)
  }

  /// Validate and convert a non-empty error set into a typed error carrying
  /// the full result.
  pub fn validate_strict(&self) -> Result<ValidationResult, ValidationError> {
    let result = self.validate();
    if result.is_valid() {
      Ok(result)
    } else {
      Err(ValidationError::new(result))
    }
  }

  /// Run a workflow to a terminal with a default cancellation token and no
  /// event observation.
  pub async fn run(
    &self,
    workflow: &str,
    ctx: ExecutionContext,
  ) -> Result<RunOutcome, EngineError> {
    self
      .run_with(workflow, ctx, CancellationToken::new(), &NoopNotifier)
      .await
  }

  /// Run a workflow with an explicit cancellation token and event notifier.
  ///
  /// Runtime faults (unresolvable components, injection failures, step
  /// failures, graph faults) fold into a failed outcome; only an unknown
  /// workflow name is an `Err`.
  #[instrument(name = "workflow_run", skip(self, ctx, cancel, notifier), fields(workflow = %workflow))]
  pub async fn run_with(
    &self,
    workflow: &str,
    ctx: ExecutionContext,
    cancel: CancellationToken,
    notifier: &dyn ExecutionNotifier,
  ) -> Result<RunOutcome, EngineError> {
    let definition = self
      .config
      .workflows
      .get(workflow)
      .ok_or_else(|| EngineError::UnknownWorkflow(workflow.to_string()))?;

    let run = WorkflowRun::new(
      &self.config,
      &self.registry,
      workflow,
      definition,
      cancel,
      notifier,
    );
    Ok(run.run(ctx).await)
  }
}
