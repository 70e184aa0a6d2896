// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::context::EmptyServiceRegistry;
use crate::registry::StepRegistry;
use parking_lot::Mutex;
use pw_core::PipelineError;
use std::sync::Arc;

struct EchoItemStep {
    name: String,
}

#[async_trait]
impl Step for EchoItemStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<StepResult, EngineError> {
        let item = ctx
            .current
            .get("item")
            .cloned()
            .ok_or_else(|| EngineError::Pipeline(PipelineError::UnresolvedPath("item".into())))?;
        let mut output = IndexMap::new();
        output.insert("echoed".to_string(), item);
        Ok(StepResult::ok(output))
    }
}

struct FailingStep {
    name: String,
}

#[async_trait]
impl Step for FailingStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &mut PipelineContext) -> Result<StepResult, EngineError> {
        Err(EngineError::Cancelled("boom".to_string()))
    }
}

fn app() -> AppContext {
    AppContext::new(Arc::new(EmptyServiceRegistry))
}

fn registry_with_echo() -> Arc<Mutex<StepRegistry>> {
    let mut registry = StepRegistry::new();
    registry.register(
        "test.echo",
        Arc::new(|config: &StepConfig, _app: &AppContext, _accessor: &RegistryAccessor| {
            Ok(Arc::new(EchoItemStep {
                name: config.name.clone(),
            }) as Arc<dyn Step>)
        }),
    );
    registry.register(
        "test.fail",
        Arc::new(|config: &StepConfig, _app: &AppContext, _accessor: &RegistryAccessor| {
            Ok(Arc::new(FailingStep {
                name: config.name.clone(),
            }) as Arc<dyn Step>)
        }),
    );
    Arc::new(Mutex::new(registry))
}

fn accessor_for(shared: Arc<Mutex<StepRegistry>>) -> RegistryAccessor {
    Arc::new(move || Arc::new(shared.lock().clone()))
}

fn foreach_config(sub_type: &str) -> StepConfig {
    let mut sub = IndexMap::new();
    sub.insert("type".to_string(), Value::String(sub_type.to_string()));
    StepConfig::new("step.foreach", "loop")
        .with_param("collection", Value::String("items".to_string()))
        .with_param("steps", Value::List(vec![Value::Map(sub)]))
}

#[test]
fn missing_collection_key_is_rejected_at_factory_time() {
    let shared = registry_with_echo();
    let accessor = accessor_for(shared);
    let app = app();
    let config = StepConfig::new("step.foreach", "loop").with_param(
        "steps",
        Value::List(vec![Value::Map({
            let mut m = IndexMap::new();
            m.insert("type".to_string(), Value::String("test.echo".to_string()));
            m
        })]),
    );
    let factory = foreach_factory();
    let result = factory(&config, &app, &accessor);
    assert!(matches!(
        result,
        Err(EngineError::MissingConfigKey { key, .. }) if key == "collection"
    ));
}

#[test]
fn missing_steps_key_is_rejected_at_factory_time() {
    let shared = registry_with_echo();
    let accessor = accessor_for(shared);
    let app = app();
    let config = StepConfig::new("step.foreach", "loop")
        .with_param("collection", Value::String("items".to_string()));
    let factory = foreach_factory();
    let result = factory(&config, &app, &accessor);
    assert!(matches!(
        result,
        Err(EngineError::MissingConfigKey { key, .. }) if key == "steps"
    ));
}

#[tokio::test]
async fn iterates_list_and_accumulates_results() {
    let shared = registry_with_echo();
    let accessor = accessor_for(shared);
    let app = app();
    let factory = foreach_factory();
    let config = foreach_config("test.echo");
    let step = factory(&config, &app, &accessor).unwrap();

    let mut ctx = PipelineContext::default();
    ctx.current.insert(
        "items".to_string(),
        Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
    );

    let result = step.execute(&mut ctx).await.unwrap();
    let output = result.output.unwrap();
    assert_eq!(output.get("count"), Some(&Value::Int(3)));
    assert!(matches!(output.get("results"), Some(Value::List(items)) if items.len() == 3));
}

#[tokio::test]
async fn empty_collection_produces_zero_iterations() {
    let shared = registry_with_echo();
    let accessor = accessor_for(shared);
    let app = app();
    let factory = foreach_factory();
    let config = foreach_config("test.echo");
    let step = factory(&config, &app, &accessor).unwrap();

    let mut ctx = PipelineContext::default();
    ctx.current
        .insert("items".to_string(), Value::List(Vec::new()));

    let result = step.execute(&mut ctx).await.unwrap();
    let output = result.output.unwrap();
    assert_eq!(output.get("count"), Some(&Value::Int(0)));
}

#[tokio::test]
async fn null_collection_is_treated_as_empty() {
    let shared = registry_with_echo();
    let accessor = accessor_for(shared);
    let app = app();
    let factory = foreach_factory();
    let config = foreach_config("test.echo");
    let step = factory(&config, &app, &accessor).unwrap();

    let mut ctx = PipelineContext::default();
    ctx.current.insert("items".to_string(), Value::Null);

    let result = step.execute(&mut ctx).await.unwrap();
    let output = result.output.unwrap();
    assert_eq!(output.get("count"), Some(&Value::Int(0)));
}

#[tokio::test]
async fn sub_step_failure_includes_iteration_and_name_context() {
    let shared = registry_with_echo();
    let accessor = accessor_for(shared);
    let app = app();
    let factory = foreach_factory();
    let config = foreach_config("test.fail");
    let step = factory(&config, &app, &accessor).unwrap();

    let mut ctx = PipelineContext::default();
    ctx.current
        .insert("items".to_string(), Value::List(vec![Value::Int(1)]));

    let result = step.execute(&mut ctx).await;
    assert!(matches!(
        result,
        Err(EngineError::StepFailed { step, .. }) if step.contains("loop[0]")
    ));
}

#[tokio::test]
async fn iteration_current_does_not_leak_between_items() {
    let shared = registry_with_echo();
    let accessor = accessor_for(shared);
    let app = app();
    let factory = foreach_factory();
    let config = foreach_config("test.echo");
    let step = factory(&config, &app, &accessor).unwrap();

    let mut ctx = PipelineContext::default();
    ctx.current
        .insert("items".to_string(), Value::List(vec![Value::Int(1), Value::Int(2)]));

    step.execute(&mut ctx).await.unwrap();
    // Parent's own `current` is untouched by iteration-scoped inserts.
    assert!(!ctx.current.contains_key("item"));
}
