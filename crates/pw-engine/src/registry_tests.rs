// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::context::EmptyServiceRegistry;
use async_trait::async_trait;

struct NoopStep {
    name: String,
}

#[async_trait]
impl Step for NoopStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &mut PipelineContext) -> Result<StepResult, EngineError> {
        Ok(StepResult::empty())
    }
}

fn noop_factory() -> StepFactory {
    Arc::new(|config, _app, _accessor| {
        Ok(Arc::new(NoopStep {
            name: config.name.clone(),
        }) as Arc<dyn Step>)
    })
}

fn app() -> AppContext {
    AppContext::new(Arc::new(EmptyServiceRegistry))
}

#[test]
fn create_unknown_type_errors() {
    let registry = Arc::new(StepRegistry::new());
    let accessor: RegistryAccessor = {
        let registry = registry.clone();
        Arc::new(move || registry.clone())
    };
    let config = StepConfig::new("step.ghost", "s1");
    let result = registry.create("step.ghost", &config, &app(), &accessor);
    assert!(matches!(result, Err(EngineError::UnknownStepType(t)) if t == "step.ghost"));
}

#[test]
fn register_then_create_builds_step() {
    let mut registry = StepRegistry::new();
    registry.register("step.noop", noop_factory());
    let registry = Arc::new(registry);
    let accessor: RegistryAccessor = {
        let registry = registry.clone();
        Arc::new(move || registry.clone())
    };
    let config = StepConfig::new("step.noop", "first");
    let step = registry
        .create("step.noop", &config, &app(), &accessor)
        .unwrap();
    assert_eq!(step.name(), "first");
}

#[test]
fn duplicate_registration_is_last_writer_wins() {
    let mut registry = StepRegistry::new();
    registry.register("step.noop", noop_factory());
    assert!(registry.is_registered("step.noop"));
    // Re-registering under the same type string must not error.
    registry.register("step.noop", noop_factory());
    assert!(registry.is_registered("step.noop"));
}

#[test]
fn accessor_sees_types_registered_after_composite_factory_runs() {
    // Build the registry behind an Arc so a composite factory can
    // capture the accessor before every primitive is registered, then
    // resolve sub-steps lazily when it is actually invoked.
    let registry = Arc::new(parking_lot::Mutex::new(StepRegistry::new()));
    let registry_for_accessor = registry.clone();
    let accessor: Arc<dyn Fn() -> Arc<StepRegistry> + Send + Sync> =
        Arc::new(move || Arc::new(registry_for_accessor.lock().clone()));

    registry.lock().register("step.noop", noop_factory());
    // A type registered after the accessor closure was built is still
    // visible the next time the accessor is invoked.
    registry.lock().register("step.late", noop_factory());

    let snapshot = accessor();
    assert!(snapshot.is_registered("step.late"));
}
