use serde::Serialize;
use serde_json::{Map, Value};

/// Classification of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
  CycleDetected,
  UnguardedEdgeNotLast,
  UnguardedEdgesMultiple,
  UnknownReference,
  UnreachableStep,
  InvalidRetryPolicy,
}

impl std::fmt::Display for FindingCode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Self::CycleDetected => "CYCLE_DETECTED",
      Self::UnguardedEdgeNotLast => "UNGUARDED_EDGE_NOT_LAST",
      Self::UnguardedEdgesMultiple => "UNGUARDED_EDGES_MULTIPLE",
      Self::UnknownReference => "UNKNOWN_REFERENCE",
      Self::UnreachableStep => "UNREACHABLE_STEP",
      Self::InvalidRetryPolicy => "INVALID_RETRY_POLICY",
    };
    f.write_str(name)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
  Error,
  Warning,
}

/// One validator observation about a configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
  pub code: FindingCode,
  pub severity: Severity,
  pub message: String,
  /// Workflow the finding belongs to, when it is workflow-scoped.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub workflow: Option<String>,
  /// Dotted path into the configuration document.
  pub location: String,
  /// Structured detail map, e.g. the cycle path or the violating edge set.
  #[serde(skip_serializing_if = "Map::is_empty")]
  pub details: Map<String, Value>,
}

impl Finding {
  pub fn error(code: FindingCode, message: impl Into<String>) -> Self {
    Self::new(code, Severity::Error, message)
  }

  pub fn warning(code: FindingCode, message: impl Into<String>) -> Self {
    Self::new(code, Severity::Warning, message)
  }

  fn new(code: FindingCode, severity: Severity, message: impl Into<String>) -> Self {
    Self {
      code,
      severity,
      message: message.into(),
      workflow: None,
      location: String::new(),
      details: Map::new(),
    }
  }

  pub fn in_workflow(mut self, workflow: impl Into<String>) -> Self {
    self.workflow = Some(workflow.into());
    self
  }

  pub fn at(mut self, location: impl Into<String>) -> Self {
    self.location = location.into();
    self
  }

  pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.details.insert(key.into(), value.into());
    self
  }
}
