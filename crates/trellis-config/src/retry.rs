use serde::{Deserialize, Serialize};

use crate::enums::Backoff;

/// Retry policy for a step.
///
/// Attempts are numbered from 1 and `max_attempts` total attempts are
/// permitted. The optional `guard` is a retry gate evaluated *between*
/// attempts, never before the first: returning false abandons the retry
/// sequence and surfaces the last failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
  #[serde(default = "default_max_attempts")]
  pub max_attempts: u32,
  /// Base delay between attempts, in milliseconds.
  #[serde(default)]
  pub delay: u64,
  #[serde(default)]
  pub backoff: Backoff,
  /// Growth factor for exponential backoff. Must be > 1 when exponential.
  #[serde(default = "default_multiplier")]
  pub multiplier: f64,
  /// Upper bound on any single delay, in milliseconds.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_delay: Option<u64>,
  /// Retry-gate guard name. Absent means unconditional retry.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub guard: Option<String>,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      max_attempts: default_max_attempts(),
      delay: 0,
      backoff: Backoff::Fixed,
      multiplier: default_multiplier(),
      max_delay: None,
      guard: None,
    }
  }
}

fn default_max_attempts() -> u32 {
  1
}

fn default_multiplier() -> f64 {
  2.0
}
