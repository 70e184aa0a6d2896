// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pw_engine::EmptyServiceRegistry;
use std::sync::Arc;

fn app() -> AppContext {
    AppContext::new(Arc::new(EmptyServiceRegistry))
}

fn accessor() -> RegistryAccessor {
    let registry = Arc::new(pw_engine::StepRegistry::new());
    Arc::new(move || registry.clone())
}

#[test]
fn missing_message_is_rejected_at_factory_time() {
    let config = StepConfig::new("step.log", "l1");
    let result = log_factory()(&config, &app(), &accessor());
    assert!(matches!(
        result,
        Err(EngineError::MissingConfigKey { key, .. }) if key == "message"
    ));
}

#[tokio::test]
async fn renders_template_and_reports_it_in_output() {
    let config = StepConfig::new("step.log", "l1")
        .with_param("message", Value::String("hello {{name}}".to_string()));
    let step = log_factory()(&config, &app(), &accessor()).unwrap();

    let mut ctx = PipelineContext::default();
    ctx.current
        .insert("name".to_string(), Value::String("world".to_string()));

    let result = step.execute(&mut ctx).await.unwrap();
    let output = result.output.unwrap();
    assert_eq!(
        output.get("logged"),
        Some(&Value::String("hello world".to_string()))
    );
}

#[tokio::test]
async fn unresolved_template_is_an_error() {
    let config = StepConfig::new("step.log", "l1")
        .with_param("message", Value::String("{{missing}}".to_string()));
    let step = log_factory()(&config, &app(), &accessor()).unwrap();

    let mut ctx = PipelineContext::default();
    let result = step.execute(&mut ctx).await;
    assert!(result.is_err());
}
