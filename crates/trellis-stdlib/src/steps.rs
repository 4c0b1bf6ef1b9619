//! Builtin steps.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;
use trellis_component::{
  ComponentDescriptor, ComponentError, ExecutionContext, FieldSpec, FieldType, StepOutcome, Step,
};
use trellis_registry::StepRegistration;

pub(crate) fn registrations() -> Vec<StepRegistration> {
  vec![
    StepRegistration::new(
      ComponentDescriptor::of::<SetValues>()
        .named("set")
        .field(FieldSpec::config("values", FieldType::Raw)),
      |fields| {
        Ok(Box::new(SetValues {
          values: fields.raw("values"),
        }))
      },
    ),
    StepRegistration::new(
      ComponentDescriptor::of::<LogMessage>()
        .named("log")
        .field(FieldSpec::config("message", FieldType::String).required()),
      |fields| {
        Ok(Box::new(LogMessage {
          message: fields.string("message"),
        }))
      },
    ),
    StepRegistration::new(
      ComponentDescriptor::of::<FailStep>()
        .named("fail")
        .field(
          FieldSpec::config("message", FieldType::String).default_value("step failed by design"),
        ),
      |fields| {
        Ok(Box::new(FailStep {
          message: fields.string("message"),
        }))
      },
    ),
    StepRegistration::new(
      ComponentDescriptor::of::<SleepStep>()
        .named("sleep")
        .field(FieldSpec::config("duration_ms", FieldType::Int).default_value(0)),
      |fields| {
        Ok(Box::new(SleepStep {
          duration_ms: fields.i64("duration_ms").max(0) as u64,
        }))
      },
    ),
  ]
}

/// Writes a configured map of values into the context.
pub struct SetValues {
  values: Value,
}

#[async_trait]
impl Step for SetValues {
  async fn execute(&self, ctx: &mut ExecutionContext) -> Result<StepOutcome, ComponentError> {
    let Some(entries) = self.values.as_object() else {
      return Err(ComponentError::new("'values' must be a map"));
    };
    for (key, value) in entries {
      ctx.put(key.clone(), value.clone());
    }
    Ok(StepOutcome::success())
  }
}

/// Emits a configured message through the logging backend.
pub struct LogMessage {
  message: String,
}

#[async_trait]
impl Step for LogMessage {
  async fn execute(&self, _ctx: &mut ExecutionContext) -> Result<StepOutcome, ComponentError> {
    info!(message = %self.message, "log step");
    Ok(StepOutcome::success_with(self.message.clone()))
  }
}

/// Always fails with a configured message. Handy for exercising failure
/// routing and retry policies.
pub struct FailStep {
  message: String,
}

#[async_trait]
impl Step for FailStep {
  async fn execute(&self, _ctx: &mut ExecutionContext) -> Result<StepOutcome, ComponentError> {
    Ok(StepOutcome::failure(self.message.clone()))
  }
}

/// Sleeps for a configured duration.
pub struct SleepStep {
  duration_ms: u64,
}

#[async_trait]
impl Step for SleepStep {
  async fn execute(&self, _ctx: &mut ExecutionContext) -> Result<StepOutcome, ComponentError> {
    if self.duration_ms > 0 {
      tokio::time::sleep(Duration::from_millis(self.duration_ms)).await;
    }
    Ok(StepOutcome::success())
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[tokio::test]
  async fn set_values_writes_each_entry() {
    let step = SetValues {
      values: json!({ "a": 1, "b": "two" }),
    };
    let mut ctx = ExecutionContext::new();

    let outcome = step.execute(&mut ctx).await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(ctx.get_i64_or("a", 0), 1);
    assert_eq!(ctx.get_string_or("b", ""), "two");
  }

  #[tokio::test]
  async fn set_values_rejects_non_map_config() {
    let step = SetValues {
      values: json!([1, 2]),
    };
    let mut ctx = ExecutionContext::new();

    assert!(step.execute(&mut ctx).await.is_err());
  }

  #[tokio::test]
  async fn fail_step_reports_its_message() {
    let step = FailStep {
      message: "boom".to_string(),
    };
    let outcome = step.execute(&mut ExecutionContext::new()).await.unwrap();
    assert_eq!(outcome, StepOutcome::failure("boom"));
  }
}
