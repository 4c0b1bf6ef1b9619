//! The graph executor: drives a single workflow run.
//!
//! One logical task walks the graph from the root. At most one step is
//! active at a time; the only engine-internal suspension points are retry
//! delays. Distinct runs over the same config are independent.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use trellis_component::{ExecutionContext, StepOutcome};
use trellis_config::{
  Category, FAILURE, FailureStrategy, SUCCESS, StepDef, WorkflowConfig, WorkflowDef,
};
use trellis_registry::ComponentRegistry;

use crate::error::StepFault;
use crate::events::{ExecutionEvent, ExecutionNotifier};
use crate::guards::GuardEvaluator;
use crate::inject::Injector;
use crate::result::{RunOutcome, RunStatus};
use crate::retry::{RetryAction, RetryController, RetryOutcome};

/// State of one workflow run.
pub(crate) struct WorkflowRun<'a> {
  config: &'a WorkflowConfig,
  registry: &'a ComponentRegistry,
  guards: GuardEvaluator<'a>,
  workflow_name: &'a str,
  workflow: &'a WorkflowDef,
  execution_id: String,
  cancel: CancellationToken,
  notifier: &'a dyn ExecutionNotifier,
}

/// Where edge selection landed for the current node.
enum Selection {
  Take { to: String },
  Fail(String),
  DeadEnd,
}

impl<'a> WorkflowRun<'a> {
  pub(crate) fn new(
    config: &'a WorkflowConfig,
    registry: &'a ComponentRegistry,
    workflow_name: &'a str,
    workflow: &'a WorkflowDef,
    cancel: CancellationToken,
    notifier: &'a dyn ExecutionNotifier,
  ) -> Self {
    Self {
      config,
      registry,
      guards: GuardEvaluator::new(config, registry),
      workflow_name,
      workflow,
      execution_id: uuid::Uuid::new_v4().to_string(),
      cancel,
      notifier,
    }
  }

  pub(crate) async fn run(self, mut ctx: ExecutionContext) -> RunOutcome {
    info!(
      execution_id = %self.execution_id,
      workflow = %self.workflow_name,
      "workflow_started"
    );
    self.notifier.notify(ExecutionEvent::WorkflowStarted {
      execution_id: self.execution_id.clone(),
      workflow: self.workflow_name.to_string(),
    });

    let outcome = self.drive(&mut ctx).await;

    match outcome {
      StepOutcome::Success { message } => {
        info!(execution_id = %self.execution_id, "workflow_completed");
        self.notifier.notify(ExecutionEvent::WorkflowCompleted {
          execution_id: self.execution_id.clone(),
        });
        RunOutcome {
          execution_id: self.execution_id,
          status: RunStatus::Success,
          message,
          context: ctx,
        }
      }
      StepOutcome::Failure { message } => {
        error!(
          execution_id = %self.execution_id,
          error = %message,
          "workflow_failed"
        );
        self.notifier.notify(ExecutionEvent::WorkflowFailed {
          execution_id: self.execution_id.clone(),
          error: message.clone(),
        });
        RunOutcome {
          execution_id: self.execution_id,
          status: RunStatus::Failure,
          message: Some(message),
          context: ctx,
        }
      }
    }
  }

  /// The main loop: terminal check, runtime cycle check, step-level guards,
  /// step execution under the retry controller, then edge selection.
  async fn drive(&self, ctx: &mut ExecutionContext) -> StepOutcome {
    let mut current = self.workflow.root.clone();
    let mut visited: Vec<String> = Vec::new();
    let mut last_message: Option<String> = None;

    loop {
      if self.cancel.is_cancelled() {
        warn!(execution_id = %self.execution_id, "workflow cancelled");
        return StepOutcome::failure("execution cancelled");
      }

      if current == SUCCESS {
        return StepOutcome::Success {
          message: last_message,
        };
      }
      if current == FAILURE {
        return StepOutcome::failure(
          last_message.unwrap_or_else(|| "workflow reached the FAILURE terminal".to_string()),
        );
      }

      if visited.iter().any(|step| *step == current) {
        return StepOutcome::failure(format!(
          "Circular dependency detected: step '{}' was already visited",
          current
        ));
      }
      visited.push(current.clone());

      let Some(step_def) = self.config.steps.get(&current) else {
        // validation rules this out; a hand-built config can still get here
        return StepOutcome::failure(format!("Step '{}' is not declared", current));
      };

      if let Some(failed_guard) = self.first_failing_guard(step_def, ctx).await {
        info!(
          execution_id = %self.execution_id,
          step = %current,
          guard = %failed_guard,
          "step skipped"
        );
        self.notifier.notify(ExecutionEvent::StepSkipped {
          execution_id: self.execution_id.clone(),
          step: current.clone(),
          guard: failed_guard,
        });
        // Skipped: no step code runs, the step counts as successful, and
        // edge selection proceeds from the same node.
      } else {
        self.notifier.notify(ExecutionEvent::StepStarted {
          execution_id: self.execution_id.clone(),
          step: current.clone(),
        });

        let RetryOutcome { outcome, attempts } = self.execute_step(&current, step_def, ctx).await;
        match outcome {
          StepOutcome::Success { message } => {
            info!(
              execution_id = %self.execution_id,
              step = %current,
              attempts,
              "step completed"
            );
            self.notifier.notify(ExecutionEvent::StepCompleted {
              execution_id: self.execution_id.clone(),
              step: current.clone(),
              message: message.clone(),
              attempts,
            });
            if message.is_some() {
              last_message = message;
            }
          }
          StepOutcome::Failure { message } => {
            error!(
              execution_id = %self.execution_id,
              step = %current,
              attempts,
              error = %message,
              "step failed"
            );
            self.notifier.notify(ExecutionEvent::StepFailed {
              execution_id: self.execution_id.clone(),
              step: current.clone(),
              error: message.clone(),
            });
            return StepOutcome::failure(format!(
              "Step '{}' failed after {} attempt(s): {}",
              current, attempts, message
            ));
          }
        }
      }

      match self.select_edge(&current, ctx).await {
        Selection::Take { to } => {
          self.notifier.notify(ExecutionEvent::EdgeTaken {
            execution_id: self.execution_id.clone(),
            from: current.clone(),
            to: to.clone(),
          });
          current = to;
        }
        Selection::Fail(message) => return StepOutcome::failure(message),
        Selection::DeadEnd => {
          return StepOutcome::failure(format!("No eligible transition from '{}'", current));
        }
      }
    }
  }

  /// Evaluate the step-level guards in order; the first failing guard name
  /// means skip.
  async fn first_failing_guard(
    &self,
    step_def: &StepDef,
    ctx: &ExecutionContext,
  ) -> Option<String> {
    for guard in &step_def.guards {
      if !self.guards.evaluate(guard, ctx).await {
        return Some(guard.clone());
      }
    }
    None
  }

  /// Run one step under its retry policy. A step without a policy runs
  /// through the controller with the single-attempt default.
  async fn execute_step(
    &self,
    name: &str,
    def: &StepDef,
    ctx: &mut ExecutionContext,
  ) -> RetryOutcome {
    let policy = def.retry.clone().unwrap_or_default();
    let controller = RetryController::new(&policy, &self.guards, &self.cancel)
      .with_notifier(self.notifier, &self.execution_id, name);
    let mut invocation = StepInvocation {
      run: self,
      name,
      def,
    };
    controller.run(&mut invocation, ctx).await
  }

  /// Resolve, inject, and invoke the step implementation once.
  async fn invoke_step(
    &self,
    name: &str,
    def: &StepDef,
    attempt: u32,
    ctx: &mut ExecutionContext,
  ) -> Result<StepOutcome, StepFault> {
    let registration = self
      .registry
      .resolve_step(&def.step_type)
      .ok_or_else(|| StepFault::Resolution(def.step_type.clone()))?;

    let effective = self
      .config
      .effective_config(Category::Step, name, def.config.as_ref());
    let fields = Injector::new(self.config).resolve_fields(
      &registration.descriptor,
      &effective,
      ctx,
    )?;
    let step = (registration.factory)(fields).map_err(|source| {
      StepFault::Injection(crate::error::InjectError::Construction {
        component: registration.descriptor.short_name.clone(),
        source,
      })
    })?;

    info!(
      execution_id = %self.execution_id,
      step = name,
      attempt,
      "step attempt"
    );
    match step.execute(ctx).await {
      Ok(outcome) => Ok(outcome),
      // a fault inside the step coerces to failure and stays retriable
      Err(fault) => Ok(StepOutcome::failure(fault.to_string())),
    }
  }

  /// Walk the node's outgoing edges in declaration order and pick the
  /// transition.
  async fn select_edge(&self, current: &str, ctx: &ExecutionContext) -> Selection {
    for edge in self.workflow.edges_from(current) {
      let Some(guard) = edge.guard_name() else {
        // unguarded fallback edge
        return Selection::Take {
          to: edge.to.clone(),
        };
      };

      if self.guards.evaluate(guard, ctx).await {
        return Selection::Take {
          to: edge.to.clone(),
        };
      }

      let strategy = edge
        .on_failure
        .as_ref()
        .map(|policy| policy.strategy)
        .unwrap_or(FailureStrategy::Stop);

      match strategy {
        FailureStrategy::Stop => {
          return Selection::Fail(format!(
            "edge guard '{}' failed on '{}' (STOP)",
            guard,
            edge.render()
          ));
        }
        FailureStrategy::Skip => continue,
        FailureStrategy::Continue => {
          info!(
            execution_id = %self.execution_id,
            edge = %edge.render(),
            guard = %guard,
            "guard failed, CONTINUE takes the edge anyway"
          );
          return Selection::Take {
            to: edge.to.clone(),
          };
        }
        FailureStrategy::Alternative => {
          let Some(target) = edge
            .on_failure
            .as_ref()
            .and_then(|policy| policy.alternative_target.clone())
          else {
            return Selection::Fail(format!(
              "edge '{}' uses ALTERNATIVE without a target",
              edge.render()
            ));
          };
          return Selection::Take { to: target };
        }
        FailureStrategy::Retry => {
          // a gated skip: exhausting the re-evaluations falls through to
          // the next edge, it does not stop the run
          let (attempts, delay_ms) = match edge.on_failure.as_ref() {
            Some(policy) => (policy.attempts, policy.delay),
            None => (1, 0),
          };
          let mut passed = false;
          for _ in 1..=attempts {
            let delay = Duration::from_millis(delay_ms);
            if !delay.is_zero() {
              tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.cancel.cancelled() => {
                  return Selection::Fail("execution cancelled".to_string());
                }
              }
            }
            if self.guards.evaluate(guard, ctx).await {
              passed = true;
              break;
            }
          }
          if passed {
            return Selection::Take {
              to: edge.to.clone(),
            };
          }
          continue;
        }
      }
    }

    Selection::DeadEnd
  }
}

/// Adapter handing one step to the retry controller.
struct StepInvocation<'a> {
  run: &'a WorkflowRun<'a>,
  name: &'a str,
  def: &'a StepDef,
}

#[async_trait]
impl RetryAction for StepInvocation<'_> {
  async fn attempt(
    &mut self,
    attempt: u32,
    ctx: &mut ExecutionContext,
  ) -> Result<StepOutcome, StepFault> {
    self.run.invoke_step(self.name, self.def, attempt, ctx).await
  }
}
