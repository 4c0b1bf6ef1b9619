//! Mutable keyed state shared across a single workflow run.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keyed state threaded through one workflow run.
///
/// Steps write values, guards read them. Values are untyped JSON so that
/// independently authored components can communicate through key-name
/// conventions; the typed accessors coerce on read and fall back to the
/// supplied default when the key is missing or the value has the wrong shape.
///
/// A context is owned by exactly one run and discarded when it completes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext {
  values: HashMap<String, Value>,
}

impl ExecutionContext {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build a context from a JSON object, e.g. a parsed `--input` payload.
  pub fn from_object(object: serde_json::Map<String, Value>) -> Self {
    Self {
      values: object.into_iter().collect(),
    }
  }

  pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) {
    self.values.insert(key.into(), value.into());
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.values.get(key)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.values.contains_key(key)
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.values.keys().map(|k| k.as_str())
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// String accessor. Non-string scalars render through their JSON form.
  pub fn get_string_or(&self, key: &str, default: &str) -> String {
    match self.values.get(key) {
      Some(Value::String(s)) => s.clone(),
      Some(Value::Number(n)) => n.to_string(),
      Some(Value::Bool(b)) => b.to_string(),
      _ => default.to_string(),
    }
  }

  /// Integer accessor. Accepts JSON numbers and parseable strings.
  pub fn get_i64_or(&self, key: &str, default: i64) -> i64 {
    match self.values.get(key) {
      Some(Value::Number(n)) => n.as_i64().unwrap_or(default),
      Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
      _ => default,
    }
  }

  /// Float accessor. Accepts JSON numbers and parseable strings.
  pub fn get_f64_or(&self, key: &str, default: f64) -> f64 {
    match self.values.get(key) {
      Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
      Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
      _ => default,
    }
  }

  /// Boolean accessor. Accepts JSON booleans and "true"/"false" strings.
  pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
    match self.values.get(key) {
      Some(Value::Bool(b)) => *b,
      Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
        "true" => true,
        "false" => false,
        _ => default,
      },
      _ => default,
    }
  }

  /// Consume the context and return the underlying map.
  pub fn into_values(self) -> HashMap<String, Value> {
    self.values
  }
}
