//! Guard evaluation.

use thiserror::Error;
use tracing::warn;
use trellis_component::{ComponentError, ExecutionContext};
use trellis_config::{Category, WorkflowConfig};
use trellis_registry::ComponentRegistry;

use crate::error::InjectError;
use crate::inject::Injector;

/// Everything that can go wrong while resolving and running a guard. Never
/// leaves this module as an error: evaluation is fail-closed.
#[derive(Debug, Error)]
enum GuardFault {
  #[error("no guard implementation registered for '{0}'")]
  Resolution(String),

  #[error(transparent)]
  Injection(#[from] InjectError),

  #[error("{0}")]
  Evaluation(#[from] ComponentError),
}

/// Resolves a guard name, injects a fresh instance, and evaluates it.
pub struct GuardEvaluator<'a> {
  config: &'a WorkflowConfig,
  registry: &'a ComponentRegistry,
}

impl<'a> GuardEvaluator<'a> {
  pub fn new(config: &'a WorkflowConfig, registry: &'a ComponentRegistry) -> Self {
    Self { config, registry }
  }

  /// Evaluate the guard named `name` against the context.
  ///
  /// Fail-closed: any fault (unresolvable name, injection failure, the
  /// guard itself erroring) logs and evaluates as `false`, so a broken
  /// guard blocks a transition rather than silently allowing it.
  pub async fn evaluate(&self, name: &str, ctx: &ExecutionContext) -> bool {
    match self.try_evaluate(name, ctx).await {
      Ok(verdict) => verdict,
      Err(fault) => {
        warn!(guard = name, error = %fault, "guard fault, evaluating as false");
        false
      }
    }
  }

  async fn try_evaluate(&self, name: &str, ctx: &ExecutionContext) -> Result<bool, GuardFault> {
    // A step entry with the same name acts as an aliased guard definition:
    // its type resolves in the guard registry and its config is the inline
    // layer. Otherwise the name resolves directly.
    let (lookup, inline) = match self.config.steps.get(name) {
      Some(alias) => (alias.step_type.as_str(), alias.config.as_ref()),
      None => (name, None),
    };
    let registration = self
      .registry
      .resolve_guard(lookup)
      .ok_or_else(|| GuardFault::Resolution(name.to_string()))?;

    let effective = self.config.effective_config(Category::Guard, name, inline);
    let fields =
      Injector::new(self.config).resolve_fields(&registration.descriptor, &effective, ctx)?;
    let guard = (registration.factory)(fields).map_err(|source| {
      GuardFault::Injection(InjectError::Construction {
        component: registration.descriptor.short_name.clone(),
        source,
      })
    })?;

    Ok(guard.evaluate(ctx).await?)
  }
}
