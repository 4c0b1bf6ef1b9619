//! Pipeline behavior over representative configurations.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use trellis_component::{
  ComponentDescriptor, ComponentError, ExecutionContext, Guard, Step, StepOutcome,
};
use trellis_config::{
  Backoff, EdgeDef, EdgeFailurePolicy, RetryConfig, SUCCESS, StepDef, WorkflowConfig, WorkflowDef,
};
use trellis_registry::{ComponentRegistry, GuardRegistration, StepRegistration};
use trellis_validate::{
  ConfigValidator, Finding, FindingCode, ValidatorContext, ValidatorPipeline,
};

struct NoopStep;

#[async_trait]
impl Step for NoopStep {
  async fn execute(&self, _ctx: &mut ExecutionContext) -> Result<StepOutcome, ComponentError> {
    Ok(StepOutcome::success())
  }
}

struct StaticGuard(bool);

#[async_trait]
impl Guard for StaticGuard {
  async fn evaluate(&self, _ctx: &ExecutionContext) -> Result<bool, ComponentError> {
    Ok(self.0)
  }
}

fn test_registry() -> ComponentRegistry {
  let mut registry = ComponentRegistry::new();
  registry.register_step(StepRegistration::new(
    ComponentDescriptor::of::<NoopStep>().named("plain"),
    |_| Ok(Box::new(NoopStep)),
  ));
  for name in ["always", "auditRequired"] {
    registry.register_guard(GuardRegistration::new(
      ComponentDescriptor::of::<StaticGuard>().named(name),
      |_| Ok(Box::new(StaticGuard(true))),
    ));
  }
  registry
}

fn plain_steps(names: &[&str]) -> BTreeMap<String, StepDef> {
  names
    .iter()
    .map(|name| (name.to_string(), StepDef::new("plain")))
    .collect()
}

fn single_workflow(name: &str, root: &str, edges: Vec<EdgeDef>) -> BTreeMap<String, WorkflowDef> {
  let mut workflows = BTreeMap::new();
  workflows.insert(name.to_string(), WorkflowDef::new(root, edges));
  workflows
}

#[test]
fn a_clean_config_validates_with_full_metadata() {
  let config = WorkflowConfig {
    steps: plain_steps(&["A", "B"]),
    workflows: single_workflow(
      "main",
      "A",
      vec![EdgeDef::new("A", "B"), EdgeDef::new("B", SUCCESS)],
    ),
    ..WorkflowConfig::default()
  };
  let registry = test_registry();

  let result = ValidatorPipeline::with_defaults().run(&config, &registry);
  assert!(result.is_valid());
  assert!(result.warnings.is_empty());
  assert_eq!(result.metadata.workflows_inspected, 1);
  assert_eq!(
    result.metadata.validators_run,
    vec!["reference-validity", "retry-policy", "edge-ordering", "cycle-detection"]
  );
}

#[test]
fn a_cycle_is_rejected_with_its_path_and_edges() {
  let config = WorkflowConfig {
    steps: plain_steps(&["A", "B", "C"]),
    workflows: single_workflow(
      "order",
      "A",
      vec![
        EdgeDef::new("A", "B"),
        EdgeDef::new("B", "C"),
        EdgeDef::new("C", "A"),
      ],
    ),
    ..WorkflowConfig::default()
  };
  let registry = test_registry();

  let result = ValidatorPipeline::with_defaults().run(&config, &registry);
  assert!(!result.is_valid());
  assert_eq!(result.errors.len(), 1);

  let finding = &result.errors[0];
  assert_eq!(finding.code, FindingCode::CycleDetected);
  assert_eq!(finding.workflow.as_deref(), Some("order"));
  assert_eq!(finding.location, "workflows.order.edges");
  assert_eq!(
    finding.details.get("cyclePath"),
    Some(&json!(["A", "B", "C", "A"]))
  );
  assert_eq!(
    finding.details.get("involvedEdges"),
    Some(&json!(["A → B", "B → C", "C → A"]))
  );
}

#[test]
fn an_unguarded_edge_that_is_not_last_is_rejected() {
  let config = WorkflowConfig {
    steps: plain_steps(&["process", "notify", "audit"]),
    workflows: single_workflow(
      "main",
      "process",
      vec![
        EdgeDef::new("process", "notify"),
        EdgeDef::new("process", "audit").guarded("auditRequired"),
        EdgeDef::new("notify", SUCCESS),
        EdgeDef::new("audit", SUCCESS),
      ],
    ),
    ..WorkflowConfig::default()
  };
  let registry = test_registry();

  let result = ValidatorPipeline::with_defaults().run(&config, &registry);
  assert!(!result.is_valid());
  assert_eq!(result.errors.len(), 1);

  let finding = &result.errors[0];
  assert_eq!(finding.code, FindingCode::UnguardedEdgeNotLast);
  assert_eq!(finding.details.get("stepName"), Some(&json!("process")));
  assert_eq!(
    finding.details.get("unguardedEdge"),
    Some(&json!("process → notify"))
  );
  assert_eq!(
    finding.details.get("violatingEdges"),
    Some(&json!(["process → audit"]))
  );
}

#[test]
fn a_blank_guard_string_counts_as_unguarded() {
  let mut misordered = EdgeDef::new("A", "B");
  misordered.guard = Some("   ".to_string());
  let config = WorkflowConfig {
    steps: plain_steps(&["A", "B", "C"]),
    workflows: single_workflow(
      "main",
      "A",
      vec![
        misordered,
        EdgeDef::new("A", "C").guarded("always"),
        EdgeDef::new("B", SUCCESS),
        EdgeDef::new("C", SUCCESS),
      ],
    ),
    ..WorkflowConfig::default()
  };
  let registry = test_registry();

  let result = ValidatorPipeline::with_defaults().run(&config, &registry);
  assert!(!result.is_valid());
  assert_eq!(result.errors[0].code, FindingCode::UnguardedEdgeNotLast);
  assert_eq!(
    result.errors[0].details.get("unguardedEdge"),
    Some(&json!("A → B"))
  );
}

#[test]
fn multiple_unguarded_edges_are_rejected() {
  let config = WorkflowConfig {
    steps: plain_steps(&["A", "B", "C"]),
    workflows: single_workflow(
      "main",
      "A",
      vec![
        EdgeDef::new("A", "B"),
        EdgeDef::new("A", "C"),
        EdgeDef::new("B", SUCCESS),
        EdgeDef::new("C", SUCCESS),
      ],
    ),
    ..WorkflowConfig::default()
  };
  let registry = test_registry();

  let result = ValidatorPipeline::with_defaults().run(&config, &registry);
  assert!(!result.is_valid());
  assert_eq!(result.errors.len(), 1);
  assert_eq!(result.errors[0].code, FindingCode::UnguardedEdgesMultiple);
  assert_eq!(
    result.errors[0].details.get("unguardedEdges"),
    Some(&json!(["A → B", "A → C"]))
  );
}

#[test]
fn unknown_references_fail_fast() {
  let mut steps = plain_steps(&["A"]);
  steps.insert(
    "X".to_string(),
    StepDef {
      guards: vec!["ghostGuard".to_string()],
      ..StepDef::new("ghost")
    },
  );
  let config = WorkflowConfig {
    steps,
    workflows: single_workflow(
      "main",
      "A",
      vec![
        EdgeDef::new("A", "nowhere").guarded("ghostEdgeGuard"),
        EdgeDef::new("A", "X")
          .guarded("always")
          .on_failure(EdgeFailurePolicy::alternative("void")),
        EdgeDef::new("X", SUCCESS),
      ],
    ),
    ..WorkflowConfig::default()
  };
  let registry = test_registry();

  let result = ValidatorPipeline::with_defaults().run(&config, &registry);
  assert!(!result.is_valid());
  assert!(result.errors.len() >= 4);
  assert!(
    result
      .errors
      .iter()
      .all(|f| f.code == FindingCode::UnknownReference)
  );
  // the reference validator is fail-fast, so the sweep stopped there
  assert_eq!(result.metadata.validators_run, vec!["reference-validity"]);

  let full = ValidatorPipeline::with_defaults().run_full_sweep(&config, &registry);
  assert_eq!(full.metadata.validators_run.len(), 4);
}

#[test]
fn unreachable_steps_are_rejected_unless_they_are_guard_aliases() {
  let mut steps = plain_steps(&["A", "orphan"]);
  steps.insert("gateDef".to_string(), StepDef::new("always"));
  if let Some(def) = steps.get_mut("A") {
    def.guards = vec!["gateDef".to_string()];
  }
  let config = WorkflowConfig {
    steps,
    workflows: single_workflow("main", "A", vec![EdgeDef::new("A", SUCCESS)]),
    ..WorkflowConfig::default()
  };
  let registry = test_registry();

  let result = ValidatorPipeline::with_defaults().run(&config, &registry);
  assert!(!result.is_valid());

  // the true orphan is an error; the guard-alias entry is left alone
  let flagged: Vec<_> = result
    .errors
    .iter()
    .filter(|f| f.code == FindingCode::UnreachableStep)
    .filter_map(|f| f.details.get("stepName").and_then(|v| v.as_str()))
    .collect();
  assert_eq!(flagged, vec!["orphan"]);
}

#[test]
fn retry_policies_are_checked() {
  let mut steps = plain_steps(&["A"]);
  steps.insert(
    "B".to_string(),
    StepDef {
      retry: Some(RetryConfig {
        max_attempts: 0,
        ..RetryConfig::default()
      }),
      ..StepDef::new("plain")
    },
  );
  steps.insert(
    "C".to_string(),
    StepDef {
      retry: Some(RetryConfig {
        max_attempts: 3,
        backoff: Backoff::Exponential,
        multiplier: 1.0,
        ..RetryConfig::default()
      }),
      ..StepDef::new("plain")
    },
  );
  let config = WorkflowConfig {
    steps,
    workflows: single_workflow(
      "main",
      "A",
      vec![
        EdgeDef::new("A", "B"),
        EdgeDef::new("B", "C"),
        EdgeDef::new("C", SUCCESS),
      ],
    ),
    ..WorkflowConfig::default()
  };
  let registry = test_registry();

  let result = ValidatorPipeline::with_defaults().run(&config, &registry);
  assert!(!result.is_valid());
  let codes: Vec<_> = result.errors.iter().map(|f| f.code).collect();
  assert_eq!(
    codes,
    vec![FindingCode::InvalidRetryPolicy, FindingCode::InvalidRetryPolicy]
  );
}

#[test]
fn validation_is_deterministic_modulo_timing() {
  let config = WorkflowConfig {
    steps: plain_steps(&["A", "B", "C"]),
    workflows: single_workflow(
      "order",
      "A",
      vec![
        EdgeDef::new("A", "B"),
        EdgeDef::new("B", "C"),
        EdgeDef::new("C", "A"),
      ],
    ),
    ..WorkflowConfig::default()
  };
  let registry = test_registry();
  let pipeline = ValidatorPipeline::with_defaults();

  let first = pipeline.run(&config, &registry);
  let second = pipeline.run(&config, &registry);
  assert_eq!(
    serde_json::to_value(&first.errors).unwrap(),
    serde_json::to_value(&second.errors).unwrap()
  );
}

#[test]
fn a_single_workflow_sweep_ignores_the_others() {
  let mut workflows = single_workflow(
    "good",
    "A",
    vec![EdgeDef::new("A", "B"), EdgeDef::new("B", SUCCESS)],
  );
  workflows.insert(
    "cyclic".to_string(),
    WorkflowDef::new("A", vec![EdgeDef::new("A", "B"), EdgeDef::new("B", "A")]),
  );
  let config = WorkflowConfig {
    steps: plain_steps(&["A", "B"]),
    workflows,
    ..WorkflowConfig::default()
  };
  let registry = test_registry();
  let pipeline = ValidatorPipeline::with_defaults();

  let scoped = pipeline.run_workflow(&config, &registry, "good");
  assert!(scoped.is_valid());
  assert_eq!(scoped.metadata.workflows_inspected, 1);

  let all = pipeline.run(&config, &registry);
  assert!(!all.is_valid());
}

struct StubValidator {
  name: &'static str,
  priority: i32,
  fail_fast: bool,
  emits_error: bool,
}

impl ConfigValidator for StubValidator {
  fn name(&self) -> &str {
    self.name
  }

  fn description(&self) -> &str {
    "test stub"
  }

  fn priority(&self) -> i32 {
    self.priority
  }

  fn fail_fast(&self) -> bool {
    self.fail_fast
  }

  fn validate(&self, _cx: &ValidatorContext<'_>) -> Vec<Finding> {
    if self.emits_error {
      vec![Finding::error(FindingCode::UnknownReference, "stub error").at("stub")]
    } else {
      Vec::new()
    }
  }
}

#[test]
fn custom_validators_run_in_priority_order_and_can_fail_fast() {
  let mut pipeline = ValidatorPipeline::new();
  pipeline.register(Arc::new(StubValidator {
    name: "late",
    priority: 50,
    fail_fast: false,
    emits_error: false,
  }));
  pipeline.register(Arc::new(StubValidator {
    name: "early",
    priority: 5,
    fail_fast: true,
    emits_error: true,
  }));
  assert_eq!(pipeline.validator_names(), vec!["early", "late"]);

  let config = WorkflowConfig::default();
  let registry = ComponentRegistry::new();

  let result = pipeline.run(&config, &registry);
  assert!(!result.is_valid());
  assert_eq!(result.metadata.validators_run, vec!["early"]);

  let full = pipeline.run_full_sweep(&config, &registry);
  assert_eq!(full.metadata.validators_run, vec!["early", "late"]);
}
