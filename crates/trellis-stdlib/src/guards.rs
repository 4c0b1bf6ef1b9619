//! Builtin guards.

use async_trait::async_trait;
use serde_json::Value;
use trellis_component::{
  ComponentDescriptor, ComponentError, ExecutionContext, FieldSpec, FieldType, Guard,
};
use trellis_registry::GuardRegistration;

pub(crate) fn registrations() -> Vec<GuardRegistration> {
  vec![
    GuardRegistration::new(ComponentDescriptor::of::<Always>().named("always"), |_| {
      Ok(Box::new(Always))
    }),
    GuardRegistration::new(ComponentDescriptor::of::<Never>().named("never"), |_| {
      Ok(Box::new(Never))
    }),
    GuardRegistration::new(
      ComponentDescriptor::of::<KeyPresent>()
        .named("key-present")
        .field(FieldSpec::config("key", FieldType::String).required()),
      |fields| {
        Ok(Box::new(KeyPresent {
          key: fields.string("key"),
        }))
      },
    ),
    GuardRegistration::new(
      ComponentDescriptor::of::<Equals>()
        .named("equals")
        .field(FieldSpec::config("key", FieldType::String).required())
        .field(FieldSpec::config("value", FieldType::Raw)),
      |fields| {
        Ok(Box::new(Equals {
          key: fields.string("key"),
          value: fields.raw("value"),
        }))
      },
    ),
    GuardRegistration::new(
      ComponentDescriptor::of::<Threshold>()
        .named("threshold")
        .field(FieldSpec::config("key", FieldType::String).required())
        .field(FieldSpec::config("min", FieldType::Float).required()),
      |fields| {
        Ok(Box::new(Threshold {
          key: fields.string("key"),
          min: fields.f64("min"),
        }))
      },
    ),
  ]
}

/// Passes unconditionally.
pub struct Always;

#[async_trait]
impl Guard for Always {
  async fn evaluate(&self, _ctx: &ExecutionContext) -> Result<bool, ComponentError> {
    Ok(true)
  }
}

/// Blocks unconditionally.
pub struct Never;

#[async_trait]
impl Guard for Never {
  async fn evaluate(&self, _ctx: &ExecutionContext) -> Result<bool, ComponentError> {
    Ok(false)
  }
}

/// Passes when the configured context key holds any value.
pub struct KeyPresent {
  key: String,
}

#[async_trait]
impl Guard for KeyPresent {
  async fn evaluate(&self, ctx: &ExecutionContext) -> Result<bool, ComponentError> {
    Ok(ctx.contains(&self.key))
  }
}

/// Passes when the context value under `key` equals the configured value.
pub struct Equals {
  key: String,
  value: Value,
}

#[async_trait]
impl Guard for Equals {
  async fn evaluate(&self, ctx: &ExecutionContext) -> Result<bool, ComponentError> {
    Ok(ctx.get(&self.key) == Some(&self.value))
  }
}

/// Passes when the numeric context value under `key` is at least `min`.
pub struct Threshold {
  key: String,
  min: f64,
}

#[async_trait]
impl Guard for Threshold {
  async fn evaluate(&self, ctx: &ExecutionContext) -> Result<bool, ComponentError> {
    Ok(ctx.get_f64_or(&self.key, f64::NEG_INFINITY) >= self.min)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[tokio::test]
  async fn equals_matches_exact_values() {
    let guard = Equals {
      key: "status".to_string(),
      value: json!("ready"),
    };
    let mut ctx = ExecutionContext::new();
    assert!(!guard.evaluate(&ctx).await.unwrap());

    ctx.put("status", "ready");
    assert!(guard.evaluate(&ctx).await.unwrap());

    ctx.put("status", "done");
    assert!(!guard.evaluate(&ctx).await.unwrap());
  }

  #[tokio::test]
  async fn threshold_compares_numerically() {
    let guard = Threshold {
      key: "score".to_string(),
      min: 0.7,
    };
    let mut ctx = ExecutionContext::new();
    assert!(!guard.evaluate(&ctx).await.unwrap());

    ctx.put("score", 0.9);
    assert!(guard.evaluate(&ctx).await.unwrap());

    ctx.put("score", 0.5);
    assert!(!guard.evaluate(&ctx).await.unwrap());
  }
}
