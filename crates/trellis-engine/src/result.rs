use serde::Serialize;
use trellis_component::ExecutionContext;

/// Terminal status of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
  Success,
  Failure,
}

/// Result of a complete workflow run, with the final context.
#[derive(Debug, Serialize)]
pub struct RunOutcome {
  pub execution_id: String,
  pub status: RunStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  pub context: ExecutionContext,
}

impl RunOutcome {
  pub fn is_success(&self) -> bool {
    self.status == RunStatus::Success
  }
}
