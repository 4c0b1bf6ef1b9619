use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;
use trellis_component::{ComponentDescriptor, ComponentError, FieldValues, Guard, Step};

/// Constructs a fresh step instance from injector-resolved field values.
pub type StepFactory =
  Arc<dyn Fn(FieldValues) -> Result<Box<dyn Step>, ComponentError> + Send + Sync>;

/// Constructs a fresh guard instance from injector-resolved field values.
pub type GuardFactory =
  Arc<dyn Fn(FieldValues) -> Result<Box<dyn Guard>, ComponentError> + Send + Sync>;

/// A step implementation offered to the registry: its descriptor plus the
/// factory closure that builds instances.
#[derive(Clone)]
pub struct StepRegistration {
  pub descriptor: ComponentDescriptor,
  pub factory: StepFactory,
}

impl StepRegistration {
  pub fn new<F>(descriptor: ComponentDescriptor, factory: F) -> Self
  where
    F: Fn(FieldValues) -> Result<Box<dyn Step>, ComponentError> + Send + Sync + 'static,
  {
    Self {
      descriptor,
      factory: Arc::new(factory),
    }
  }
}

/// A guard implementation offered to the registry.
#[derive(Clone)]
pub struct GuardRegistration {
  pub descriptor: ComponentDescriptor,
  pub factory: GuardFactory,
}

impl GuardRegistration {
  pub fn new<F>(descriptor: ComponentDescriptor, factory: F) -> Self
  where
    F: Fn(FieldValues) -> Result<Box<dyn Guard>, ComponentError> + Send + Sync + 'static,
  {
    Self {
      descriptor,
      factory: Arc::new(factory),
    }
  }
}

/// Registry of step and guard implementations.
///
/// Populated at startup through explicit registration, either one component
/// at a time or as a named namespace batch (the discovery-scan analog).
/// Immutable and shareable once the engine is constructed.
///
/// Lookup order for a name: declared-name match, then short type name
/// (case-sensitive, then case-insensitive), then fully-qualified type path.
pub struct ComponentRegistry {
  steps: Index<StepRegistration>,
  guards: Index<GuardRegistration>,
}

impl ComponentRegistry {
  pub fn new() -> Self {
    Self {
      steps: Index::new("step"),
      guards: Index::new("guard"),
    }
  }

  pub fn register_step(&mut self, registration: StepRegistration) {
    self.steps.insert(None, registration);
  }

  pub fn register_guard(&mut self, registration: GuardRegistration) {
    self.guards.insert(None, registration);
  }

  /// Register a batch of steps under a namespace prefix.
  pub fn register_steps_in(&mut self, namespace: &str, registrations: Vec<StepRegistration>) {
    for registration in registrations {
      self.steps.insert(Some(namespace), registration);
    }
  }

  /// Register a batch of guards under a namespace prefix.
  pub fn register_guards_in(&mut self, namespace: &str, registrations: Vec<GuardRegistration>) {
    for registration in registrations {
      self.guards.insert(Some(namespace), registration);
    }
  }

  pub fn resolve_step(&self, name: &str) -> Option<&StepRegistration> {
    self.steps.resolve(name)
  }

  pub fn resolve_guard(&self, name: &str) -> Option<&GuardRegistration> {
    self.guards.resolve(name)
  }

  pub fn has_step(&self, name: &str) -> bool {
    self.steps.resolve(name).is_some()
  }

  pub fn has_guard(&self, name: &str) -> bool {
    self.guards.resolve(name).is_some()
  }

  /// Descriptors of all steps registered under `namespace`, in registration
  /// order.
  pub fn steps_in_namespace(&self, namespace: &str) -> Vec<&ComponentDescriptor> {
    self.steps.in_namespace(namespace)
  }

  /// Descriptors of all guards registered under `namespace`, in registration
  /// order.
  pub fn guards_in_namespace(&self, namespace: &str) -> Vec<&ComponentDescriptor> {
    self.guards.in_namespace(namespace)
  }
}

impl Default for ComponentRegistry {
  fn default() -> Self {
    Self::new()
  }
}

trait HasDescriptor {
  fn descriptor(&self) -> &ComponentDescriptor;
}

impl HasDescriptor for StepRegistration {
  fn descriptor(&self) -> &ComponentDescriptor {
    &self.descriptor
  }
}

impl HasDescriptor for GuardRegistration {
  fn descriptor(&self) -> &ComponentDescriptor {
    &self.descriptor
  }
}

/// One lookup index: registrations in registration order plus the name maps
/// the resolution order walks through.
struct Index<R> {
  kind: &'static str,
  items: Vec<(Option<String>, R)>,
  declared: HashMap<String, usize>,
  short: HashMap<String, usize>,
  by_path: HashMap<String, usize>,
}

impl<R: HasDescriptor> Index<R> {
  fn new(kind: &'static str) -> Self {
    Self {
      kind,
      items: Vec::new(),
      declared: HashMap::new(),
      short: HashMap::new(),
      by_path: HashMap::new(),
    }
  }

  fn insert(&mut self, namespace: Option<&str>, registration: R) {
    let position = self.items.len();
    let descriptor = registration.descriptor();

    if let Some(name) = &descriptor.declared_name {
      if self.declared.insert(name.clone(), position).is_some() {
        warn!(kind = self.kind, name = %name, "registration shadows an earlier declared name");
      }
    } else {
      // Unnamed implementations answer to the short type name and its
      // lowercase-first variant.
      self.short.insert(descriptor.short_name.clone(), position);
      self.short.insert(descriptor.lower_short_name(), position);
    }
    self
      .by_path
      .insert(descriptor.type_path.clone(), position);

    self
      .items
      .push((namespace.map(str::to_string), registration));
  }

  fn resolve(&self, name: &str) -> Option<&R> {
    let position = self
      .declared
      .get(name)
      .or_else(|| self.short.get(name))
      .copied()
      .or_else(|| {
        self
          .short
          .iter()
          .find(|(short, _)| short.eq_ignore_ascii_case(name))
          .map(|(_, position)| *position)
      })
      .or_else(|| self.by_path.get(name).copied())?;
    self.items.get(position).map(|(_, registration)| registration)
  }

  fn in_namespace(&self, namespace: &str) -> Vec<&ComponentDescriptor> {
    self
      .items
      .iter()
      .filter(|(ns, _)| ns.as_deref() == Some(namespace))
      .map(|(_, registration)| registration.descriptor())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use async_trait::async_trait;
  use trellis_component::{ExecutionContext, StepOutcome};

  use super::*;

  struct NoopStep;

  #[async_trait]
  impl Step for NoopStep {
    async fn execute(&self, _ctx: &mut ExecutionContext) -> Result<StepOutcome, ComponentError> {
      Ok(StepOutcome::success())
    }
  }

  struct AlwaysTrue;

  #[async_trait]
  impl Guard for AlwaysTrue {
    async fn evaluate(&self, _ctx: &ExecutionContext) -> Result<bool, ComponentError> {
      Ok(true)
    }
  }

  fn noop_registration(descriptor: ComponentDescriptor) -> StepRegistration {
    StepRegistration::new(descriptor, |_| Ok(Box::new(NoopStep)))
  }

  #[test]
  fn declared_name_wins_over_short_name() {
    let mut registry = ComponentRegistry::new();
    registry.register_step(noop_registration(
      ComponentDescriptor::of::<NoopStep>().named("archive"),
    ));
    registry.register_step(noop_registration(ComponentDescriptor::of::<NoopStep>()));

    assert!(registry.resolve_step("archive").is_some());
    assert!(registry.resolve_step("NoopStep").is_some());
    assert!(registry.resolve_step("noopStep").is_some());
    assert!(registry.resolve_step("missing").is_none());
  }

  #[test]
  fn short_name_lookup_falls_back_to_case_insensitive() {
    let mut registry = ComponentRegistry::new();
    registry.register_step(noop_registration(ComponentDescriptor::of::<NoopStep>()));

    assert!(registry.resolve_step("NOOPSTEP").is_some());
  }

  #[test]
  fn fully_qualified_path_resolves_last() {
    let mut registry = ComponentRegistry::new();
    let descriptor = ComponentDescriptor::of::<NoopStep>().named("archive");
    let path = descriptor.type_path.clone();
    registry.register_step(noop_registration(descriptor));

    assert!(registry.resolve_step(&path).is_some());
  }

  #[test]
  fn namespaces_enumerate_in_registration_order() {
    let mut registry = ComponentRegistry::new();
    registry.register_guards_in(
      "std",
      vec![
        GuardRegistration::new(ComponentDescriptor::of::<AlwaysTrue>().named("always"), |_| {
          Ok(Box::new(AlwaysTrue))
        }),
      ],
    );

    let names: Vec<_> = registry
      .guards_in_namespace("std")
      .iter()
      .map(|d| d.declared_name.clone())
      .collect();
    assert_eq!(names, vec![Some("always".to_string())]);
    assert!(registry.guards_in_namespace("other").is_empty());
    assert!(registry.resolve_guard("always").is_some());
  }

  #[test]
  fn step_and_guard_indexes_are_distinct() {
    let mut registry = ComponentRegistry::new();
    registry.register_step(noop_registration(
      ComponentDescriptor::of::<NoopStep>().named("shared-name"),
    ));

    assert!(registry.resolve_step("shared-name").is_some());
    assert!(registry.resolve_guard("shared-name").is_none());
  }
}
