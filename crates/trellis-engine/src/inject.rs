//! Dependency injection into short-lived component instances.
//!
//! Rather than a container, this is a field-walker: given a component's
//! descriptor, the merged effective config, the execution context and the
//! global settings tree, it resolves each declared field to a typed value.
//! Factories receive the result and construct the instance, so this is the
//! only place the engine consults component field metadata.

use serde_json::Value;
use trellis_component::{
  ComponentDescriptor, ExecutionContext, FieldBinding, FieldSpec, FieldType, FieldValues,
  coerce_value,
};
use trellis_config::WorkflowConfig;

use crate::error::InjectError;

pub struct Injector<'a> {
  config: &'a WorkflowConfig,
}

impl<'a> Injector<'a> {
  pub fn new(config: &'a WorkflowConfig) -> Self {
    Self { config }
  }

  /// Resolve the injectable fields of a component.
  ///
  /// Precedence per field: explicit context binding, explicit config binding
  /// (effective config key, then settings dotted path, then declared default
  /// literal), name-match fallback (context key before config key). A field
  /// that resolves to nothing is left unset so the factory's zero value
  /// stands, unless it is marked required.
  pub fn resolve_fields(
    &self,
    descriptor: &ComponentDescriptor,
    effective: &serde_json::Map<String, Value>,
    ctx: &ExecutionContext,
  ) -> Result<FieldValues, InjectError> {
    let mut fields = FieldValues::new();

    for spec in &descriptor.fields {
      let raw = match &spec.binding {
        FieldBinding::Context { key } => present(ctx.get(key)),
        FieldBinding::Config {
          key,
          settings_path,
          default,
          required,
        } => {
          let found = present(effective.get(key))
            .or_else(|| {
              settings_path
                .as_deref()
                .and_then(|path| present(self.config.settings_path(path)))
            })
            .or_else(|| default.clone());
          if found.is_none() && *required {
            return Err(InjectError::MissingRequired {
              component: descriptor.short_name.clone(),
              field: spec.name.clone(),
            });
          }
          found
        }
        FieldBinding::Auto => {
          present(ctx.get(&spec.name)).or_else(|| present(effective.get(&spec.name)))
        }
      };

      if let Some(raw) = raw {
        let coerced = coerce_value(&raw, spec.ty).ok_or_else(|| coercion_error(descriptor, spec, &raw))?;
        fields.insert(&spec.name, coerced);
      }
    }

    Ok(fields)
  }
}

/// Explicit nulls count as absent so defaults still apply.
fn present(value: Option<&Value>) -> Option<Value> {
  value.filter(|v| !v.is_null()).cloned()
}

fn coercion_error(descriptor: &ComponentDescriptor, spec: &FieldSpec, raw: &Value) -> InjectError {
  let expected = match spec.ty {
    FieldType::String => "string",
    FieldType::Int => "integer",
    FieldType::Float => "float",
    FieldType::Bool => "boolean",
    FieldType::Raw => "raw",
  };
  InjectError::Coercion {
    component: descriptor.short_name.clone(),
    field: spec.name.clone(),
    expected,
    found: raw.to_string(),
  }
}
