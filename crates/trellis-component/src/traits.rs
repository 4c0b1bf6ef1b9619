use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::error::ComponentError;
use crate::outcome::StepOutcome;

/// A named unit of work invoked with the shared context.
///
/// Steps may mutate the context and perform arbitrary I/O; the engine makes
/// no assumption that they are non-blocking. Returning `Err` is equivalent to
/// returning a failure outcome with the error's message.
#[async_trait]
pub trait Step: Send + Sync {
  async fn execute(&self, ctx: &mut ExecutionContext) -> Result<StepOutcome, ComponentError>;
}

/// A named predicate over the context.
///
/// Guards gate step execution and route edges. They receive the context
/// read-only; a guard that mutates shared state breaks the engine's edge
/// selection determinism guarantee. Returning `Err` evaluates as `false`.
#[async_trait]
pub trait Guard: Send + Sync {
  async fn evaluate(&self, ctx: &ExecutionContext) -> Result<bool, ComponentError>;
}
