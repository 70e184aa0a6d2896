// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step registry and factory protocol.
//!
//! A step is an open set: the engine ships a handful of composite
//! step types (foreach, retry, circuit breaker, conditional,
//! state-machine transition) and application code registers its own
//! primitives (database queries, cache writes, broker publishes) under
//! the same protocol. `StepRegistry` maps a type string to a factory
//! closure; composite factories take a `RegistryAccessor` instead of a
//! direct registry reference so they can build sub-steps of any type
//! — including types registered after the composite factory itself —
//! at the parent step's construction time.

use crate::context::ServiceRegistry;
use crate::error::EngineError;
use async_trait::async_trait;
use pw_core::{PipelineContext, StepConfig, StepResult, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A unit of work within a pipeline.
#[async_trait]
pub trait Step: Send + Sync {
    /// Identity within a pipeline; used for output bucketing, jump
    /// targets, and `step.*` event payloads.
    fn name(&self) -> &str;

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<StepResult, EngineError>;
}

/// Application object passed to every factory, giving step
/// implementations access to the service registry at construction
/// time. Factories typically just stash a clone of the `Arc` for use
/// at execute time, since service resolution failures are execute-time
/// errors, not factory-time errors (spec.md §4.6).
#[derive(Clone)]
pub struct AppContext {
    pub services: Arc<dyn ServiceRegistry>,
}

impl AppContext {
    pub fn new(services: Arc<dyn ServiceRegistry>) -> Self {
        Self { services }
    }
}

/// Accessor closure a composite factory uses to obtain the full
/// registry (including types registered after the composite factory
/// itself) at the moment it builds its own sub-steps.
pub type RegistryAccessor = Arc<dyn Fn() -> Arc<StepRegistry> + Send + Sync>;

/// A pure function of `(name, config, app, registry accessor) ->
/// Step`. Plain primitive factories ignore the accessor; composite
/// factories use it to resolve and build their children.
pub type StepFactory = Arc<
    dyn Fn(&StepConfig, &AppContext, &RegistryAccessor) -> Result<Arc<dyn Step>, EngineError>
        + Send
        + Sync,
>;

/// Maps step *type* strings (`step.cache_set`, `step.foreach`, ...) to
/// the factory that builds them. Built at startup; read-only and
/// lock-free during execution (spec.md §5).
#[derive(Default, Clone)]
pub struct StepRegistry {
    factories: HashMap<String, StepFactory>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `step_type`. Last writer wins —
    /// duplicate registration is not an error, since composite
    /// factories are constructed after primitives and may legitimately
    /// shadow a default.
    pub fn register(&mut self, step_type: impl Into<String>, factory: StepFactory) {
        self.factories.insert(step_type.into(), factory);
    }

    pub fn create(
        &self,
        step_type: &str,
        config: &StepConfig,
        app: &AppContext,
        accessor: &RegistryAccessor,
    ) -> Result<Arc<dyn Step>, EngineError> {
        let factory = self
            .factories
            .get(step_type)
            .ok_or_else(|| EngineError::UnknownStepType(step_type.to_string()))?;
        factory(config, app, accessor)
    }

    pub fn is_registered(&self, step_type: &str) -> bool {
        self.factories.contains_key(step_type)
    }
}

/// Build a `StepConfig` from one entry of a composite step's inline
/// `steps` list. Each entry is a map with a required `type`, an
/// optional `name` (defaulting to `"{parent_name}-sub-{index}"`), and
/// all remaining keys carried through as `params`.
pub fn step_config_from_value(
    parent_name: &str,
    index: usize,
    value: &Value,
) -> Result<StepConfig, EngineError> {
    let map = value.as_map().ok_or_else(|| EngineError::InvalidConfigValue {
        step: parent_name.to_string(),
        key: format!("steps[{index}]"),
        reason: "expected a map".to_string(),
    })?;

    let step_type = map
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| EngineError::MissingConfigKey {
            step: parent_name.to_string(),
            key: format!("steps[{index}].type"),
        })?
        .to_string();

    let name = map
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{parent_name}-sub-{index}"));

    let mut config = StepConfig::new(step_type, name);
    for (key, v) in map {
        if key == "type" || key == "name" {
            continue;
        }
        config.params.insert(key.clone(), v.clone());
    }
    Ok(config)
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
