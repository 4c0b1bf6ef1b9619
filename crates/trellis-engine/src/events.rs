//! Execution events and notifiers for observability.
//!
//! Events are emitted during a run so consumers can observe progress,
//! persist history, or stream to UIs. They are a read-only surface and carry
//! no control flow.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during workflow execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// A workflow run has started.
  WorkflowStarted {
    execution_id: String,
    workflow: String,
  },

  /// A step is about to execute (its guards passed).
  StepStarted {
    execution_id: String,
    step: String,
  },

  /// A step completed successfully.
  StepCompleted {
    execution_id: String,
    step: String,
    message: Option<String>,
    attempts: u32,
  },

  /// A step-level guard returned false; the step's code was bypassed.
  StepSkipped {
    execution_id: String,
    step: String,
    guard: String,
  },

  /// A step failed and no retry recovered it.
  StepFailed {
    execution_id: String,
    step: String,
    error: String,
  },

  /// A failed attempt will be retried after the given delay.
  RetryScheduled {
    execution_id: String,
    step: String,
    /// The upcoming attempt number.
    attempt: u32,
    delay_ms: u64,
  },

  /// An edge was selected and traversal moved on.
  EdgeTaken {
    execution_id: String,
    from: String,
    to: String,
  },

  /// The run reached the SUCCESS terminal.
  WorkflowCompleted { execution_id: String },

  /// The run failed: FAILURE terminal, step failure, or graph fault.
  WorkflowFailed { execution_id: String, error: String },
}

/// Trait for receiving execution events.
///
/// The engine calls `notify` for each event; implementations decide what to
/// do with them (persist, broadcast, log, ignore).
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {
    // Intentionally empty
  }
}

/// A notifier that sends events to an unbounded channel.
///
/// Unbounded so a slow consumer never blocks the engine; event volume is a
/// handful per step, so memory growth is not a practical concern.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  /// Create a notifier and the receiver draining it.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self { sender }, receiver)
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // A dropped receiver just means nobody is listening anymore.
    let _ = self.sender.send(event);
  }
}
