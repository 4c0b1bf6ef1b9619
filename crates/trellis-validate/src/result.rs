use serde::Serialize;

use crate::finding::{Finding, Severity};

/// Aggregated output of a pipeline sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
  pub errors: Vec<Finding>,
  pub warnings: Vec<Finding>,
  pub metadata: ValidationMetadata,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationMetadata {
  /// Total wall time of the sweep.
  pub duration_ms: u64,
  /// Validators that actually ran, in execution order.
  pub validators_run: Vec<String>,
  pub workflows_inspected: usize,
}

impl ValidationResult {
  pub fn is_valid(&self) -> bool {
    self.errors.is_empty()
  }

  pub(crate) fn absorb(&mut self, findings: Vec<Finding>) {
    for finding in findings {
      match finding.severity {
        Severity::Error => self.errors.push(finding),
        Severity::Warning => self.warnings.push(finding),
      }
    }
  }
}
