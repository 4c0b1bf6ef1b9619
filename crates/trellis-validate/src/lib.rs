//! Trellis Validate
//!
//! Static analysis of a [`trellis_config::WorkflowConfig`] before anything
//! runs. The pipeline is the single point of configuration rejection: a
//! config it accepts never produces a runtime cycle or unreachable-edge
//! fault, and the executor assumes as much.
//!
//! Validators are independently addressable, ordered by priority, and open
//! for extension: custom validators implement [`ConfigValidator`] and
//! register alongside the built-ins.

mod error;
mod finding;
mod pipeline;
mod result;
mod validators;

pub use error::ValidationError;
pub use finding::{Finding, FindingCode, Severity};
pub use pipeline::{ConfigValidator, ValidatorContext, ValidatorPipeline};
pub use result::{ValidationMetadata, ValidationResult};
pub use validators::{
  CycleValidator, EdgeOrderValidator, ReferenceValidator, RetryPolicyValidator,
};
