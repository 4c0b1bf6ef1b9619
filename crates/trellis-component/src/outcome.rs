use serde::{Deserialize, Serialize};

/// Outcome of a single step invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
  Success {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
  },
  Failure {
    message: String,
  },
}

impl StepOutcome {
  pub fn success() -> Self {
    Self::Success { message: None }
  }

  pub fn success_with(message: impl Into<String>) -> Self {
    Self::Success {
      message: Some(message.into()),
    }
  }

  pub fn failure(message: impl Into<String>) -> Self {
    Self::Failure {
      message: message.into(),
    }
  }

  pub fn is_success(&self) -> bool {
    matches!(self, Self::Success { .. })
  }

  pub fn message(&self) -> Option<&str> {
    match self {
      Self::Success { message } => message.as_deref(),
      Self::Failure { message } => Some(message),
    }
  }
}
