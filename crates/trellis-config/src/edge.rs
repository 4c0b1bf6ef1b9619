use serde::{Deserialize, Serialize};

use crate::enums::FailureStrategy;

/// A directed transition between steps, optionally gated by a guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDef {
  pub from: String,
  /// Target step name, or the terminal symbols `SUCCESS` / `FAILURE`.
  pub to: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub guard: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub on_failure: Option<EdgeFailurePolicy>,
}

impl EdgeDef {
  pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
    Self {
      from: from.into(),
      to: to.into(),
      guard: None,
      on_failure: None,
    }
  }

  pub fn guarded(mut self, guard: impl Into<String>) -> Self {
    self.guard = Some(guard.into());
    self
  }

  pub fn on_failure(mut self, policy: EdgeFailurePolicy) -> Self {
    self.on_failure = Some(policy);
    self
  }

  /// The edge's guard name. Blank or whitespace-only strings count as
  /// absent; edge-ordering validation depends on this exact rule.
  pub fn guard_name(&self) -> Option<&str> {
    self
      .guard
      .as_deref()
      .map(str::trim)
      .filter(|g| !g.is_empty())
  }

  /// An unguarded edge is the fallback for its source step.
  pub fn is_unguarded(&self) -> bool {
    self.guard_name().is_none()
  }

  /// Render as `from → to` for findings and diagnostics.
  pub fn render(&self) -> String {
    format!("{} → {}", self.from, self.to)
  }
}

/// What happens when this edge's guard evaluates to false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeFailurePolicy {
  pub strategy: FailureStrategy,
  /// Required iff `strategy` is `ALTERNATIVE`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub alternative_target: Option<String>,
  /// Guard re-evaluation count, used iff `strategy` is `RETRY`.
  #[serde(default = "default_attempts")]
  pub attempts: u32,
  /// Delay between guard re-evaluations in milliseconds, used iff `RETRY`.
  #[serde(default)]
  pub delay: u64,
}

impl EdgeFailurePolicy {
  pub fn stop() -> Self {
    Self::with_strategy(FailureStrategy::Stop)
  }

  pub fn skip() -> Self {
    Self::with_strategy(FailureStrategy::Skip)
  }

  pub fn continue_anyway() -> Self {
    Self::with_strategy(FailureStrategy::Continue)
  }

  pub fn alternative(target: impl Into<String>) -> Self {
    Self {
      alternative_target: Some(target.into()),
      ..Self::with_strategy(FailureStrategy::Alternative)
    }
  }

  pub fn retry(attempts: u32, delay: u64) -> Self {
    Self {
      attempts,
      delay,
      ..Self::with_strategy(FailureStrategy::Retry)
    }
  }

  fn with_strategy(strategy: FailureStrategy) -> Self {
    Self {
      strategy,
      alternative_target: None,
      attempts: default_attempts(),
      delay: 0,
    }
  }
}

fn default_attempts() -> u32 {
  1
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_guard_counts_as_unguarded() {
    let mut edge = EdgeDef::new("a", "b");
    assert!(edge.is_unguarded());

    edge.guard = Some("  ".to_string());
    assert!(edge.is_unguarded());
    assert_eq!(edge.guard_name(), None);

    edge.guard = Some(" ready ".to_string());
    assert_eq!(edge.guard_name(), Some("ready"));
    assert!(!edge.is_unguarded());
  }

  #[test]
  fn render_uses_arrow_notation() {
    assert_eq!(EdgeDef::new("process", "notify").render(), "process → notify");
  }
}
