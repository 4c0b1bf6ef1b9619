//! Component descriptors: the registration-time substitute for reflection.
//!
//! A descriptor names a component and lists the fields the injector may
//! populate before an invocation. Factories receive the resolved
//! [`FieldValues`] and construct the instance from them, so the descriptor is
//! the single place the engine consults metadata about component fields.

use std::collections::HashMap;

use serde_json::Value;

/// Semantic type of an injectable field.
///
/// Values are coerced to this type before they reach the factory; see
/// [`coerce_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
  String,
  Int,
  Float,
  Bool,
  /// No coercion; the raw JSON value is passed through.
  Raw,
}

/// How a field receives its value.
#[derive(Debug, Clone)]
pub enum FieldBinding {
  /// Explicit context binding: the field takes `ctx[key]`.
  Context { key: String },
  /// Explicit config binding: effective config first, then an optional
  /// dotted settings path, then an optional default literal.
  Config {
    key: String,
    settings_path: Option<String>,
    default: Option<Value>,
    required: bool,
  },
  /// Unmarked field: matched by field name, context key before config key.
  Auto,
}

/// One injectable field of a component.
#[derive(Debug, Clone)]
pub struct FieldSpec {
  pub name: String,
  pub ty: FieldType,
  pub binding: FieldBinding,
}

impl FieldSpec {
  /// Field bound to a context key.
  pub fn context(name: impl Into<String>, key: impl Into<String>, ty: FieldType) -> Self {
    Self {
      name: name.into(),
      ty,
      binding: FieldBinding::Context { key: key.into() },
    }
  }

  /// Field bound to the effective config under its own name.
  pub fn config(name: impl Into<String>, ty: FieldType) -> Self {
    let name = name.into();
    Self {
      binding: FieldBinding::Config {
        key: name.clone(),
        settings_path: None,
        default: None,
        required: false,
      },
      name,
      ty,
    }
  }

  /// Unmarked field resolved by name match (context first, then config).
  pub fn auto(name: impl Into<String>, ty: FieldType) -> Self {
    Self {
      name: name.into(),
      ty,
      binding: FieldBinding::Auto,
    }
  }

  /// Add a dotted settings path consulted when the config key is absent.
  pub fn settings_path(mut self, path: impl Into<String>) -> Self {
    if let FieldBinding::Config { settings_path, .. } = &mut self.binding {
      *settings_path = Some(path.into());
    }
    self
  }

  /// Add a default literal used when neither config nor settings supply a value.
  pub fn default_value(mut self, value: impl Into<Value>) -> Self {
    if let FieldBinding::Config { default, .. } = &mut self.binding {
      *default = Some(value.into());
    }
    self
  }

  /// Mark the field required: resolution failure becomes an injection error
  /// instead of leaving the field at its zero value.
  pub fn required(mut self) -> Self {
    if let FieldBinding::Config { required, .. } = &mut self.binding {
      *required = true;
    }
    self
  }
}

/// Identity and injectable surface of a registered component.
#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
  /// Fully-qualified type path, e.g. `trellis_stdlib::steps::SetValues`.
  pub type_path: String,
  /// Short type name, e.g. `SetValues`.
  pub short_name: String,
  /// Name declared at registration, if any.
  pub declared_name: Option<String>,
  pub fields: Vec<FieldSpec>,
}

impl ComponentDescriptor {
  /// Describe the implementation type `T`, deriving the type path and short
  /// name from the Rust type name.
  pub fn of<T>() -> Self {
    let type_path = std::any::type_name::<T>().to_string();
    let short_name = type_path
      .rsplit("::")
      .next()
      .unwrap_or(type_path.as_str())
      .to_string();
    Self {
      type_path,
      short_name,
      declared_name: None,
      fields: Vec::new(),
    }
  }

  /// Declare the lookup name for this component.
  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.declared_name = Some(name.into());
    self
  }

  pub fn field(mut self, spec: FieldSpec) -> Self {
    self.fields.push(spec);
    self
  }

  /// Lowercase-first-character variant of the short name, e.g. `setValues`.
  /// Components without a declared name register under both spellings.
  pub fn lower_short_name(&self) -> String {
    let mut chars = self.short_name.chars();
    match chars.next() {
      Some(first) => first.to_lowercase().chain(chars).collect(),
      None => String::new(),
    }
  }
}

/// Field values resolved by the injector, keyed by field name.
///
/// All values have already been coerced to the declared [`FieldType`]; the
/// typed getters here are conveniences for factories and fall back to the
/// zero value when the injector left a non-required field unset.
#[derive(Debug, Clone, Default)]
pub struct FieldValues {
  values: HashMap<String, Value>,
}

impl FieldValues {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, name: impl Into<String>, value: Value) {
    self.values.insert(name.into(), value);
  }

  pub fn get(&self, name: &str) -> Option<&Value> {
    self.values.get(name)
  }

  pub fn string(&self, name: &str) -> String {
    match self.values.get(name) {
      Some(Value::String(s)) => s.clone(),
      Some(other) => other.to_string(),
      None => String::new(),
    }
  }

  pub fn i64(&self, name: &str) -> i64 {
    self
      .values
      .get(name)
      .and_then(Value::as_i64)
      .unwrap_or_default()
  }

  pub fn f64(&self, name: &str) -> f64 {
    self
      .values
      .get(name)
      .and_then(Value::as_f64)
      .unwrap_or_default()
  }

  pub fn bool(&self, name: &str) -> bool {
    self
      .values
      .get(name)
      .and_then(Value::as_bool)
      .unwrap_or_default()
  }

  pub fn raw(&self, name: &str) -> Value {
    self.values.get(name).cloned().unwrap_or(Value::Null)
  }
}

/// Coerce a raw value to a field's semantic type.
///
/// Supported conversions: string ↔ numeric parse, numeric widening
/// (integer → float, and float → integer when the value is integral),
/// boolean from "true"/"false" strings. Returns `None` when the value cannot
/// represent the target type.
pub fn coerce_value(value: &Value, ty: FieldType) -> Option<Value> {
  match ty {
    FieldType::Raw => Some(value.clone()),
    FieldType::String => match value {
      Value::String(s) => Some(Value::String(s.clone())),
      Value::Number(n) => Some(Value::String(n.to_string())),
      Value::Bool(b) => Some(Value::String(b.to_string())),
      _ => None,
    },
    FieldType::Int => match value {
      Value::Number(n) => n
        .as_i64()
        .or_else(|| {
          // float → integer only when integral
          n.as_f64()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
        })
        .map(Value::from),
      Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
      _ => None,
    },
    FieldType::Float => match value {
      Value::Number(n) => n.as_f64().map(Value::from),
      Value::String(s) => s.trim().parse::<f64>().ok().map(Value::from),
      _ => None,
    },
    FieldType::Bool => match value {
      Value::Bool(b) => Some(Value::Bool(*b)),
      Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ => None,
      },
      _ => None,
    },
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  struct SampleStep;

  #[test]
  fn descriptor_derives_names_from_type() {
    let descriptor = ComponentDescriptor::of::<SampleStep>();
    assert!(descriptor.type_path.ends_with("SampleStep"));
    assert_eq!(descriptor.short_name, "SampleStep");
    assert_eq!(descriptor.lower_short_name(), "sampleStep");
    assert!(descriptor.declared_name.is_none());
  }

  #[test]
  fn coercion_parses_strings_and_widens_numbers() {
    assert_eq!(
      coerce_value(&json!("12"), FieldType::Int),
      Some(json!(12i64))
    );
    assert_eq!(coerce_value(&json!(3), FieldType::Float), Some(json!(3.0)));
    assert_eq!(
      coerce_value(&json!(4.0), FieldType::Int),
      Some(json!(4i64))
    );
    assert_eq!(
      coerce_value(&json!(7), FieldType::String),
      Some(json!("7"))
    );
    assert_eq!(
      coerce_value(&json!("True"), FieldType::Bool),
      Some(json!(true))
    );
  }

  #[test]
  fn coercion_rejects_lossy_conversions() {
    assert_eq!(coerce_value(&json!(4.5), FieldType::Int), None);
    assert_eq!(coerce_value(&json!("abc"), FieldType::Int), None);
    assert_eq!(coerce_value(&json!("yes"), FieldType::Bool), None);
    assert_eq!(coerce_value(&json!({ "k": 1 }), FieldType::String), None);
  }
}
