//! End-to-end tests for the declaration pipeline.
//!
//! These tests run the same steps as the CLI entry routine:
//! 1. Resolve the configuration from an explicit selector
//! 2. Compose the stack and apply global tags
//! 3. Check graph shape (one of each resource, dependency order)
//! 4. Render and write the manifests

#![allow(clippy::expect_used, clippy::unwrap_used)]

use fargate_stack_common::error::StackError;
use fargate_stack_common::types::{EnvironmentName, RemovalPolicy};
use fargate_stack_compose::declaration::{ResourceKind, ResourceSpec};
use fargate_stack_compose::synth::{OutputFormat, render_stack, write_assembly};
use fargate_stack_compose::{App, build_app};
use fargate_stack_config::resolve;

fn pipeline(selector: Option<&str>) -> Result<App, StackError> {
    let resolved = resolve(selector)?;
    build_app("DemoTodo", &resolved)
}

// ── Resolution ───────────────────────────────────────────────────────

#[test]
fn pipeline_defaults_to_dev() {
    let resolved = resolve(None).expect("resolve");
    assert_eq!(resolved.name, EnvironmentName::Dev);
    assert_eq!(resolved.config.removal_policy, RemovalPolicy::Destroy);

    let app = pipeline(None).expect("pipeline");
    let stack = app.stack("DemoTodo").expect("stack");
    assert_eq!(stack.environment().account, "000000000000");
}

#[test]
fn pipeline_prod_selector() {
    let app = pipeline(Some("prod")).expect("pipeline");
    let stack = app.stack("DemoTodo").expect("stack");
    assert_eq!(stack.environment().account, "111111111111");

    let db = stack
        .graph()
        .of_kind(ResourceKind::DatabaseInstance)
        .next()
        .expect("database");
    let ResourceSpec::DatabaseInstance(spec) = &db.spec else {
        panic!("expected database instance");
    };
    assert!(spec.multi_az);
    assert_eq!(spec.removal_policy, RemovalPolicy::Retain);
}

#[test]
fn pipeline_unknown_selector_declares_nothing() {
    for selector in ["qa", "staging"] {
        let err = pipeline(Some(selector)).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, StackError::InvalidEnvironment { .. }), "{msg}");
        assert!(msg.contains(selector), "got: {msg}");
        assert!(msg.contains("dev") && msg.contains("prod"), "got: {msg}");
    }
}

// ── Graph shape ──────────────────────────────────────────────────────

#[test]
fn pipeline_declares_exactly_one_of_each() {
    for name in EnvironmentName::ALL {
        let app = pipeline(Some(name.as_str())).expect("pipeline");
        let graph = app.stack("DemoTodo").expect("stack").graph();
        for kind in [
            ResourceKind::Vpc,
            ResourceKind::HostedZoneLookup,
            ResourceKind::DatabaseSecret,
            ResourceKind::DatabaseInstance,
            ResourceKind::SqlProvider,
            ResourceKind::SqlDatabase,
            ResourceKind::SqlRole,
            ResourceKind::SqlSchema,
            ResourceKind::Secret,
            ResourceKind::ContainerImageAsset,
            ResourceKind::LoadBalancedFargateService,
            ResourceKind::SecurityGroupIngress,
            ResourceKind::ScalableTaskCount,
        ] {
            assert_eq!(graph.count(kind), 1, "{name}: {kind}");
        }
        assert_eq!(graph.count(ResourceKind::TargetTrackingScalingPolicy), 2);
        assert_eq!(graph.len(), 15);
    }
}

#[test]
fn pipeline_orders_dependencies_first() {
    let app = pipeline(None).expect("pipeline");
    let stack = app.stack("DemoTodo").expect("stack");
    let order: Vec<&str> = stack
        .graph()
        .resolve_order()
        .expect("order")
        .into_iter()
        .map(|d| d.id.name())
        .collect();
    let pos = |name: &str| order.iter().position(|n| *n == name).expect(name);

    assert!(pos("Vpc") < pos("DatabaseInstance"));
    assert!(pos("DatabaseAdminCredentials") < pos("DatabaseInstance"));
    assert!(pos("DatabaseInstance") < pos("DatabaseProvider"));
    assert!(pos("DatabaseProvider") < pos("ApplicationDatabase"));
    assert!(pos("ApplicationDatabase") < pos("DatabaseApplicationCredentials"));
    assert!(pos("DatabaseApplicationCredentials") < pos("DatabaseSchema"));
    assert!(pos("DatabaseApplicationCredentials") < pos("App"));
    assert!(pos("ApplicationSecrets") < pos("App"));
    assert!(pos("App") < pos("DatabaseIngressFromApp"));
    assert!(pos("App") < pos("AppTaskCount"));
    assert!(pos("AppTaskCount") < pos("CpuScaling"));
    assert!(pos("AppTaskCount") < pos("MemoryScaling"));
}

#[test]
fn pipeline_tags_every_resource() {
    let resolved = resolve(Some("prod")).expect("resolve");
    let app = build_app("DemoTodo", &resolved).expect("build");
    let graph = app.stack("DemoTodo").expect("stack").graph();
    let tagged = graph
        .declarations()
        .filter(|d| d.kind().is_taggable())
        .inspect(|d| assert_eq!(d.tags, resolved.config.tags, "{}", d.id))
        .count();
    assert_eq!(tagged, graph.len() - 1);
}

// ── Synthesis ────────────────────────────────────────────────────────

#[test]
fn pipeline_manifest_is_deterministic() {
    let first = pipeline(None).expect("pipeline");
    let second = pipeline(None).expect("pipeline");
    let a = render_stack(first.stack("DemoTodo").expect("stack")).expect("render");
    let b = render_stack(second.stack("DemoTodo").expect("stack")).expect("render");
    assert_eq!(
        serde_json::to_string(&a).expect("json"),
        serde_json::to_string(&b).expect("json")
    );
}

#[test]
fn pipeline_manifest_contains_no_secret_values() {
    let app = pipeline(Some("prod")).expect("pipeline");
    let template = render_stack(app.stack("DemoTodo").expect("stack")).expect("render");
    let json = serde_json::to_string(&template).expect("json");
    assert!(!json.contains("\"Password\""));
    assert!(json.contains("DATABASE_PASSWORD"));
}

#[test]
fn pipeline_writes_yaml_assembly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = pipeline(None).expect("pipeline");
    let written = write_assembly(&app, dir.path(), OutputFormat::Yaml).expect("write");
    assert!(written.iter().any(|p| p.ends_with("DemoTodo.template.yaml")));
    let yaml = std::fs::read_to_string(dir.path().join("DemoTodo.template.yaml")).expect("read");
    assert!(yaml.contains("Network::Vpc"));
    assert!(yaml.contains("demo-todo-dev.example.com"));
}
