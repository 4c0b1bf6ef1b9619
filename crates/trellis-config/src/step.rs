use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::retry::RetryConfig;

/// Declaration of a step: the implementation to resolve and how to run it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDef {
  /// Registry lookup key for the implementation.
  #[serde(rename = "type")]
  pub step_type: String,
  /// Inline configuration, highest-precedence layer of the effective config.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub config: Option<Map<String, Value>>,
  /// Step-level gates. All must pass or the step is skipped.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub guards: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub retry: Option<RetryConfig>,
}

impl StepDef {
  pub fn new(step_type: impl Into<String>) -> Self {
    Self {
      step_type: step_type.into(),
      config: None,
      guards: Vec::new(),
      retry: None,
    }
  }
}
