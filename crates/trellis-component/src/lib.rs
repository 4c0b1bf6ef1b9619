//! Trellis Component
//!
//! Contracts shared by component authors and the engine: the mutable
//! [`ExecutionContext`] threaded through a workflow run, the [`Step`] and
//! [`Guard`] traits, and the descriptor types the registry and injector use
//! to populate component fields before each invocation.
//!
//! Component instances are transient. The engine constructs a fresh instance
//! per invocation from the registered factory, hands it the field values the
//! injector resolved, uses it once, and drops it.

mod context;
mod descriptor;
mod error;
mod outcome;
mod traits;

pub use context::ExecutionContext;
pub use descriptor::{
  ComponentDescriptor, FieldBinding, FieldSpec, FieldType, FieldValues, coerce_value,
};
pub use error::ComponentError;
pub use outcome::StepOutcome;
pub use traits::{Guard, Step};
