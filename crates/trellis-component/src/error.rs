use thiserror::Error;

/// Error raised inside a step or guard implementation.
///
/// The engine never propagates these outward: a step returning `Err` folds
/// into a failure outcome, and a guard returning `Err` evaluates to `false`.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ComponentError {
  message: String,
}

impl ComponentError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

impl From<String> for ComponentError {
  fn from(message: String) -> Self {
    Self { message }
  }
}

impl From<&str> for ComponentError {
  fn from(message: &str) -> Self {
    Self {
      message: message.to_string(),
    }
  }
}
