//! Trellis Registry
//!
//! Name-based resolution of step and guard implementations. The registry is
//! populated once at startup, shared read-only afterwards, and consulted by
//! the validator (do these names resolve?) and the executor (construct me an
//! instance for this name). A lookup miss is reported by the consumer: the
//! validator emits an `UNKNOWN_REFERENCE` finding, the executor fails the
//! current run.

mod registry;

pub use registry::{
  ComponentRegistry, GuardFactory, GuardRegistration, StepFactory, StepRegistration,
};
