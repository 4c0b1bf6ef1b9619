use thiserror::Error;

use crate::result::ValidationResult;

/// Raised by the strict validation surface when the error set is non-empty.
///
/// Carries the full result so callers can inspect every finding, not just
/// the first.
#[derive(Debug, Error)]
#[error("workflow configuration failed validation with {} error(s)", result.errors.len())]
pub struct ValidationError {
  pub result: ValidationResult,
}

impl ValidationError {
  pub fn new(result: ValidationResult) -> Self {
    Self { result }
  }
}
