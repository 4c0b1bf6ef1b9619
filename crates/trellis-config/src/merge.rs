//! Deep merge for configuration trees.

use serde_json::{Map, Value};

/// Merge `overlay` into `base` and return the result; inputs stay untouched.
///
/// Maps merge key-wise recursively. Scalars and lists replace wholesale: a
/// list in a higher-precedence layer is taken as the author's full intent,
/// not appended to.
pub fn deep_merge(base: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
  let mut merged = base.clone();
  for (key, overlay_value) in overlay {
    match (merged.get_mut(key), overlay_value) {
      (Some(Value::Object(base_child)), Value::Object(overlay_child)) => {
        let combined = deep_merge(base_child, overlay_child);
        merged.insert(key.clone(), Value::Object(combined));
      }
      _ => {
        merged.insert(key.clone(), overlay_value.clone());
      }
    }
  }
  merged
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn obj(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
  }

  #[test]
  fn maps_merge_recursively() {
    let base = obj(json!({ "http": { "timeout": 100, "retries": 1 }, "name": "a" }));
    let overlay = obj(json!({ "http": { "timeout": 250 } }));

    let merged = deep_merge(&base, &overlay);
    assert_eq!(
      Value::Object(merged),
      json!({ "http": { "timeout": 250, "retries": 1 }, "name": "a" })
    );
  }

  #[test]
  fn scalars_and_lists_replace_wholesale() {
    let base = obj(json!({ "tags": ["a", "b"], "limit": 5 }));
    let overlay = obj(json!({ "tags": ["c"], "limit": { "max": 9 } }));

    let merged = deep_merge(&base, &overlay);
    assert_eq!(merged.get("tags"), Some(&json!(["c"])));
    assert_eq!(merged.get("limit"), Some(&json!({ "max": 9 })));
  }

  #[test]
  fn merge_does_not_mutate_inputs() {
    let base = obj(json!({ "a": { "b": 1 } }));
    let overlay = obj(json!({ "a": { "c": 2 } }));
    let before = base.clone();

    let _ = deep_merge(&base, &overlay);
    assert_eq!(base, before);
  }
}
