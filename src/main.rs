use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use trellis_component::ExecutionContext;
use trellis_config::WorkflowConfig;
use trellis_engine::{Engine, NoopNotifier};
use trellis_registry::ComponentRegistry;
use trellis_validate::{Finding, ValidationResult};

/// Trellis - a declarative workflow engine
#[derive(Parser)]
#[command(name = "trellis")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Statically validate a workflow configuration
  Validate {
    /// Path to the config file (YAML or JSON)
    config_file: PathBuf,

    /// Run every validator even past fail-fast failures
    #[arg(long)]
    full_sweep: bool,
  },

  /// Run a workflow from a configuration
  Run {
    /// Path to the config file (YAML or JSON)
    config_file: PathBuf,

    /// The workflow to execute
    #[arg(long)]
    workflow: String,

    /// Initial context as a JSON object
    #[arg(long)]
    input: Option<String>,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let cli = Cli::parse();

  match cli.command {
    Commands::Validate {
      config_file,
      full_sweep,
    } => validate(config_file, full_sweep),
    Commands::Run {
      config_file,
      workflow,
      input,
    } => run(config_file, workflow, input),
  }
}

fn build_engine(config_file: &PathBuf) -> Result<Engine> {
  let config = WorkflowConfig::from_path(config_file)
    .with_context(|| format!("failed to load config: {}", config_file.display()))?;

  let mut registry = ComponentRegistry::new();
  trellis_stdlib::register(&mut registry);

  Ok(Engine::new(config, registry))
}

fn validate(config_file: PathBuf, full_sweep: bool) -> Result<()> {
  let engine = build_engine(&config_file)?;
  let result = if full_sweep {
    engine.validate_full_sweep()
  } else {
    engine.validate()
  };

  print_findings(&result);
  eprintln!(
    "Ran {} validator(s) over {} workflow(s) in {}ms",
    result.metadata.validators_run.len(),
    result.metadata.workflows_inspected,
    result.metadata.duration_ms
  );

  if !result.is_valid() {
    bail!("configuration is invalid ({} error(s))", result.errors.len());
  }
  eprintln!("Configuration is valid");
  Ok(())
}

fn run(config_file: PathBuf, workflow: String, input: Option<String>) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_async(config_file, workflow, input).await })
}

async fn run_async(config_file: PathBuf, workflow: String, input: Option<String>) -> Result<()> {
  let engine = build_engine(&config_file)?;

  // Reject broken configurations before anything executes
  engine
    .validate_strict()
    .map_err(|e| {
      print_findings(&e.result);
      anyhow::anyhow!(e.to_string())
    })?;

  let ctx = parse_input(input)?;

  let outcome = engine
    .run_with(&workflow, ctx, CancellationToken::new(), &NoopNotifier)
    .await
    .context("workflow execution failed to start")?;

  println!("{}", serde_json::to_string_pretty(&outcome)?);

  if !outcome.is_success() {
    std::process::exit(1);
  }
  Ok(())
}

fn parse_input(input: Option<String>) -> Result<ExecutionContext> {
  let Some(input) = input else {
    return Ok(ExecutionContext::new());
  };
  let value: serde_json::Value =
    serde_json::from_str(&input).context("--input is not valid JSON")?;
  match value {
    serde_json::Value::Object(object) => Ok(ExecutionContext::from_object(object)),
    _ => bail!("--input must be a JSON object"),
  }
}

fn print_findings(result: &ValidationResult) {
  for finding in &result.errors {
    print_finding("error", finding);
  }
  for finding in &result.warnings {
    print_finding("warning", finding);
  }
}

fn print_finding(severity: &str, finding: &Finding) {
  let workflow = finding
    .workflow
    .as_deref()
    .map(|w| format!(" (workflow '{w}')"))
    .unwrap_or_default();
  eprintln!(
    "{severity}[{}] {}{workflow}: {}",
    finding.code, finding.location, finding.message
  );
}
