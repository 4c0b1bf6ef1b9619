//! Retry control for step invocations.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use trellis_component::{ExecutionContext, StepOutcome};
use trellis_config::{Backoff, RetryConfig};

use crate::error::StepFault;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::guards::GuardEvaluator;

static NOOP: NoopNotifier = NoopNotifier;

/// The retriable unit the controller drives.
///
/// Returning a failure outcome is retriable; returning [`StepFault`]
/// (resolution or injection trouble) aborts the sequence immediately.
#[async_trait]
pub trait RetryAction: Send {
  async fn attempt(
    &mut self,
    attempt: u32,
    ctx: &mut ExecutionContext,
  ) -> Result<StepOutcome, StepFault>;
}

/// Outcome of a retry sequence, with the number of attempts actually made.
#[derive(Debug)]
pub struct RetryOutcome {
  pub outcome: StepOutcome,
  pub attempts: u32,
}

/// Applies a [`RetryConfig`] to an action.
///
/// Attempts are numbered from 1. The retry gate, when configured, is
/// consulted between attempts only; the first attempt is always taken
/// unconditionally. Delay sleeps race the cancellation token.
pub struct RetryController<'a> {
  policy: &'a RetryConfig,
  guards: &'a GuardEvaluator<'a>,
  cancel: &'a CancellationToken,
  notifier: &'a dyn ExecutionNotifier,
  execution_id: &'a str,
  step: &'a str,
}

impl<'a> RetryController<'a> {
  pub fn new(
    policy: &'a RetryConfig,
    guards: &'a GuardEvaluator<'a>,
    cancel: &'a CancellationToken,
  ) -> Self {
    Self {
      policy,
      guards,
      cancel,
      notifier: &NOOP,
      execution_id: "",
      step: "",
    }
  }

  /// Attach an event notifier so scheduled retries are announced.
  pub fn with_notifier(
    mut self,
    notifier: &'a dyn ExecutionNotifier,
    execution_id: &'a str,
    step: &'a str,
  ) -> Self {
    self.notifier = notifier;
    self.execution_id = execution_id;
    self.step = step;
    self
  }

  /// Delay inserted after failed attempt `attempt` (1-based), before the
  /// next one. Fixed backoff repeats the base delay; exponential backoff
  /// scales it by `multiplier^(attempt-1)`, capped at `max_delay`. The
  /// resulting sequence is monotonically non-decreasing.
  pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
    let base = self.policy.delay;
    let millis = match self.policy.backoff {
      Backoff::Fixed => base,
      Backoff::Exponential => {
        let scaled = base as f64 * self.policy.multiplier.powi(attempt.saturating_sub(1) as i32);
        let capped = match self.policy.max_delay {
          Some(cap) => scaled.min(cap as f64),
          None => scaled,
        };
        if capped.is_finite() {
          capped.min(u64::MAX as f64) as u64
        } else {
          self.policy.max_delay.unwrap_or(u64::MAX)
        }
      }
    };
    Duration::from_millis(millis)
  }

  pub async fn run(&self, action: &mut dyn RetryAction, ctx: &mut ExecutionContext) -> RetryOutcome {
    let max_attempts = self.policy.max_attempts.max(1);
    let mut last = StepOutcome::failure("no attempt was made");

    for attempt in 1..=max_attempts {
      let outcome = match action.attempt(attempt, ctx).await {
        Ok(outcome) => outcome,
        Err(fault) => {
          // not retriable: the step could not even be constructed
          return RetryOutcome {
            outcome: StepOutcome::failure(fault.to_string()),
            attempts: attempt,
          };
        }
      };

      if outcome.is_success() {
        if attempt > 1 {
          info!(attempt, "step succeeded after retry");
        }
        return RetryOutcome { outcome, attempts: attempt };
      }
      last = outcome;

      if attempt == max_attempts {
        break;
      }

      if let Some(gate) = &self.policy.guard {
        if !self.guards.evaluate(gate, ctx).await {
          info!(guard = %gate, attempt, "retry gate closed, surfacing last failure");
          return RetryOutcome { outcome: last, attempts: attempt };
        }
      }

      let delay = self.delay_after_attempt(attempt);
      self.notifier.notify(ExecutionEvent::RetryScheduled {
        execution_id: self.execution_id.to_string(),
        step: self.step.to_string(),
        attempt: attempt + 1,
        delay_ms: delay.as_millis() as u64,
      });
      debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying after delay");
      if !delay.is_zero() {
        tokio::select! {
          _ = tokio::time::sleep(delay) => {}
          _ = self.cancel.cancelled() => {
            return RetryOutcome {
              outcome: StepOutcome::failure("execution cancelled"),
              attempts: attempt,
            };
          }
        }
      }
    }

    RetryOutcome {
      outcome: last,
      attempts: max_attempts,
    }
  }
}

#[cfg(test)]
mod tests {
  use trellis_config::WorkflowConfig;
  use trellis_registry::ComponentRegistry;

  use super::*;

  fn exponential(delay: u64, multiplier: f64, max_delay: Option<u64>) -> RetryConfig {
    RetryConfig {
      max_attempts: 5,
      delay,
      backoff: Backoff::Exponential,
      multiplier,
      max_delay,
      guard: None,
    }
  }

  #[test]
  fn exponential_delays_grow_and_cap() {
    let config = WorkflowConfig::default();
    let registry = ComponentRegistry::new();
    let guards = GuardEvaluator::new(&config, &registry);
    let cancel = CancellationToken::new();
    let policy = exponential(10, 2.0, Some(35));
    let controller = RetryController::new(&policy, &guards, &cancel);

    let delays: Vec<u64> = (1..=4)
      .map(|attempt| controller.delay_after_attempt(attempt).as_millis() as u64)
      .collect();
    assert_eq!(delays, vec![10, 20, 35, 35]);
    assert!(delays.windows(2).all(|pair| pair[0] <= pair[1]));
  }

  #[test]
  fn fixed_delays_repeat_the_base() {
    let config = WorkflowConfig::default();
    let registry = ComponentRegistry::new();
    let guards = GuardEvaluator::new(&config, &registry);
    let cancel = CancellationToken::new();
    let policy = RetryConfig {
      max_attempts: 3,
      delay: 7,
      ..RetryConfig::default()
    };
    let controller = RetryController::new(&policy, &guards, &cancel);

    assert_eq!(controller.delay_after_attempt(1), Duration::from_millis(7));
    assert_eq!(controller.delay_after_attempt(3), Duration::from_millis(7));
  }
}
