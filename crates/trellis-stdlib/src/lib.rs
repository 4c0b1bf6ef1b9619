//! Trellis Stdlib
//!
//! A small set of general-purpose steps and guards, registered under the
//! `std` namespace. Useful on their own for glue workflows and as working
//! examples of the descriptor/factory registration contract.

mod guards;
mod steps;

pub use guards::{Always, Equals, KeyPresent, Never, Threshold};
pub use steps::{FailStep, LogMessage, SetValues, SleepStep};

use trellis_registry::ComponentRegistry;

/// Register every builtin under the `std` namespace.
pub fn register(registry: &mut ComponentRegistry) {
  registry.register_steps_in("std", steps::registrations());
  registry.register_guards_in("std", guards::registrations());
}
