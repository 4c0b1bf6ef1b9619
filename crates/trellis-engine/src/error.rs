use thiserror::Error;
use trellis_component::ComponentError;

/// Errors the engine surfaces to the driver as `Err`.
///
/// Everything else (resolution and injection faults, step failures, graph
/// faults) folds into a failed [`crate::RunOutcome`]; validation is the
/// single point of configuration rejection and never raises during
/// execution.
#[derive(Debug, Error)]
pub enum EngineError {
  #[error("unknown workflow '{0}'")]
  UnknownWorkflow(String),
}

/// A field could not be populated before an invocation.
#[derive(Debug, Error)]
pub enum InjectError {
  #[error("required field '{field}' of component '{component}' has no value")]
  MissingRequired { component: String, field: String },

  #[error("cannot coerce {found} into the {expected} field '{field}' of component '{component}'")]
  Coercion {
    component: String,
    field: String,
    expected: &'static str,
    found: String,
  },

  #[error("construction of component '{component}' failed: {source}")]
  Construction {
    component: String,
    #[source]
    source: ComponentError,
  },
}

/// Non-retriable fault while preparing a step invocation.
///
/// A step returning failure is retriable; not being able to build the step
/// at all is fatal for the current run.
#[derive(Debug, Error)]
pub enum StepFault {
  #[error("no step implementation registered for '{0}'")]
  Resolution(String),

  #[error(transparent)]
  Injection(#[from] InjectError),
}
