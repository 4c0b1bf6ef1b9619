use thiserror::Error;

/// Errors raised while loading a configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file '{path}': {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse YAML config: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("failed to parse JSON config: {0}")]
  Json(#[from] serde_json::Error),
}
