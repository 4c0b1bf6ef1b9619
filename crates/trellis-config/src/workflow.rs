use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::edge::EdgeDef;
use crate::enums::Category;
use crate::error::ConfigError;
use crate::merge::deep_merge;
use crate::step::StepDef;

/// Reserved terminal marking successful workflow completion.
pub const SUCCESS: &str = "SUCCESS";

/// Reserved terminal marking failed workflow completion.
pub const FAILURE: &str = "FAILURE";

/// Terminal symbols are reserved step names and are never declared under
/// `steps`.
pub fn is_terminal(name: &str) -> bool {
  name == SUCCESS || name == FAILURE
}

/// A named workflow: a root step and an ordered edge list.
///
/// Edge order is significant: the executor evaluates a step's outgoing
/// edges in declaration order, and the unguarded fallback edge must be last.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub root: String,
  #[serde(default)]
  pub edges: Vec<EdgeDef>,
}

impl WorkflowDef {
  pub fn new(root: impl Into<String>, edges: Vec<EdgeDef>) -> Self {
    Self {
      root: root.into(),
      edges,
    }
  }

  /// Outgoing edges of `step`, in declaration order.
  pub fn edges_from<'a>(&'a self, step: &'a str) -> impl Iterator<Item = &'a EdgeDef> {
    self.edges.iter().filter(move |e| e.from == step)
  }
}

/// The complete workflow configuration consumed by validator and executor.
///
/// Step and workflow maps are ordered so that validation output and iteration
/// are deterministic for a given input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
  /// Global settings tree, addressable by dotted path.
  #[serde(default)]
  pub settings: Map<String, Value>,
  /// Per-scope configuration defaults: the category literals `step` and
  /// `guard`, or a component logical name.
  #[serde(default)]
  pub defaults: Map<String, Value>,
  #[serde(default)]
  pub steps: BTreeMap<String, StepDef>,
  #[serde(default)]
  pub workflows: BTreeMap<String, WorkflowDef>,
}

impl WorkflowConfig {
  pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
    Ok(serde_yaml::from_str(content)?)
  }

  pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(content)?)
  }

  /// Load a configuration document, choosing the parser by file extension
  /// (`.json` is JSON, anything else is YAML).
  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.display().to_string(),
      source,
    })?;
    match path.extension().and_then(|e| e.to_str()) {
      Some("json") => Self::from_json_str(&content),
      _ => Self::from_yaml_str(&content),
    }
  }

  /// Resolve a dotted path (`"a.b.c"`) into the settings tree.
  pub fn settings_path(&self, path: &str) -> Option<&Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = self.settings.get(first)?;
    for segment in segments {
      current = current.as_object()?.get(segment)?;
    }
    Some(current)
  }

  /// Effective configuration for component `name` of `category`.
  ///
  /// Layers in precedence order, lowest first, deep-merged key-wise:
  /// `defaults[category]`, `defaults[name]`, then the inline config. The
  /// global settings tree is not merged in; it stays addressable on demand
  /// via [`Self::settings_path`]. Non-object defaults entries are ignored.
  pub fn effective_config(
    &self,
    category: Category,
    name: &str,
    inline: Option<&Map<String, Value>>,
  ) -> Map<String, Value> {
    let mut effective = Map::new();
    for scope in [category.key(), name] {
      if let Some(Value::Object(layer)) = self.defaults.get(scope) {
        effective = deep_merge(&effective, layer);
      }
    }
    if let Some(inline) = inline {
      effective = deep_merge(&effective, inline);
    }
    effective
  }
}
