use serde::{Deserialize, Serialize};

/// Delay growth policy between retry attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Backoff {
  #[default]
  Fixed,
  Exponential,
}

/// What the executor does when an edge guard evaluates to false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureStrategy {
  /// Terminate the run in failure. Default when no policy is declared.
  Stop,
  /// Move on to the next edge of the same source step.
  Skip,
  /// Jump to `alternative_target` instead of the edge's target.
  Alternative,
  /// Re-evaluate the guard up to `attempts` times, then fall through to the
  /// next edge (a gated skip, not a stop).
  Retry,
  /// Take the edge as if the guard had passed.
  Continue,
}

/// Component category, used as a defaults scope key and a registry index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  Step,
  Guard,
}

impl Category {
  /// The scope key this category occupies in `defaults`.
  pub fn key(&self) -> &'static str {
    match self {
      Self::Step => "step",
      Self::Guard => "guard",
    }
  }
}
