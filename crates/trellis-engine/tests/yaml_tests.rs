//! End-to-end: a YAML document through validation and execution with the
//! builtin component set.

use trellis_component::ExecutionContext;
use trellis_config::WorkflowConfig;
use trellis_engine::Engine;
use trellis_registry::ComponentRegistry;

fn engine_for(yaml: &str) -> Engine {
  let config = WorkflowConfig::from_yaml_str(yaml).expect("config parses");
  let mut registry = ComponentRegistry::new();
  trellis_stdlib::register(&mut registry);
  Engine::new(config, registry)
}

const ROUTING: &str = r#"
settings:
  notifications:
    channel: "ops"
defaults:
  step:
    timeout_ms: 5000
steps:
  classify:
    type: set
    config:
      values:
        tier: "gold"
        score: 0.9
  premium:
    type: log
    config:
      message: "routing premium order"
  standard:
    type: log
    config:
      message: "routing standard order"
  isPremium:
    type: equals
    config:
      key: tier
      value: "gold"
workflows:
  routing:
    root: classify
    edges:
      - from: classify
        to: premium
        guard: isPremium
        onFailure:
          strategy: SKIP
      - from: classify
        to: standard
      - from: premium
        to: SUCCESS
      - from: standard
        to: SUCCESS
"#;

#[tokio::test]
async fn a_yaml_workflow_validates_and_routes_on_its_guards() {
  let engine = engine_for(ROUTING);

  let validation = engine.validate();
  assert!(
    validation.is_valid(),
    "unexpected findings: {:?}",
    validation.errors
  );

  let outcome = engine.run("routing", ExecutionContext::new()).await.unwrap();
  assert!(outcome.is_success());
  // the aliased guard read the tier written by `classify`
  assert_eq!(outcome.message.as_deref(), Some("routing premium order"));
}

#[tokio::test]
async fn the_fallback_edge_routes_when_the_guard_fails() {
  let yaml = ROUTING.replace("tier: \"gold\"", "tier: \"basic\"");
  let engine = engine_for(&yaml);

  let outcome = engine.run("routing", ExecutionContext::new()).await.unwrap();
  assert!(outcome.is_success());
  assert_eq!(outcome.message.as_deref(), Some("routing standard order"));
}

#[tokio::test]
async fn strict_validation_surfaces_the_full_result() {
  let broken = ROUTING.replace("type: set", "type: does-not-exist");
  let engine = engine_for(&broken);

  let err = engine.validate_strict().expect_err("must fail");
  assert!(!err.result.errors.is_empty());
  assert!(err.to_string().contains("failed validation"));
}
